use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+SQNSH, close a socket. "Operation not allowed" is a benign race
/// with a close ring and is tolerated by the caller.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CloseSocket {
    pub id: u8,
}

impl AtRequest for CloseSocket {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+SQNSH={}\r", self.id).ok();
        buf
    }
}
