use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk, SocketData};

/// AT+SQNSRECV, read buffered data. The reply is a
/// `+SQNSRECV: <id>,<len>` header followed by `<len>` raw bytes, consumed
/// by the reader task before the final `OK`.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveData {
    pub id: u8,
    pub max: usize,
}

impl AtRequest for ReceiveData {
    type Response = (SocketData, GenericOk);
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+SQNSRECV={},{}\r", self.id, self.max).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(ReceiveData { id: 1, max: 1500 }.encode(), "AT+SQNSRECV=1,1500\r");
    }
}
