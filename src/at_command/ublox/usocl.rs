use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+USOCL. An "operation not allowed" error is a benign race with a
/// `+UUSOCL` URC and is tolerated by the caller.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CloseSocket {
    pub id: u8,
}

impl AtRequest for CloseSocket {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+USOCL={}\r", self.id).ok();
        buf
    }
}
