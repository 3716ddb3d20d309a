use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, Prompt};

/// AT+SQNSSENDEXT: announce a binary send of `len` bytes, wait for the
/// data prompt, then stream the payload.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SendDataExt {
    pub id: u8,
    pub len: usize,
}

impl AtRequest for SendDataExt {
    type Response = Prompt;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+SQNSSENDEXT={},{}\r", self.id, self.len).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(SendDataExt { id: 1, len: 18 }.encode(), "AT+SQNSSENDEXT=1,18\r");
    }
}
