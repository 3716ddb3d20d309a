use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk, SocketData};

/// AT+QIRD, read buffered socket data. The reply is a `+QIRD: <len>`
/// header followed by `<len>` raw bytes, which the reader task consumes
/// before the final `OK`. A zero length means the buffer drained.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadSocket {
    pub id: u8,
    pub len: usize,
}

impl AtRequest for ReadSocket {
    type Response = (SocketData, GenericOk);
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+QIRD={},{}\r", self.id, self.len).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(ReadSocket { id: 0, len: 1500 }.encode(), "AT+QIRD=0,1500\r");
    }
}
