use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+UDCONF=1, hex payload mode for the socket commands. Keeps binary
/// data out of the line framing.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetHexMode(pub bool);

impl AtRequest for SetHexMode {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+UDCONF=1,{}\r", self.0 as u8).ok();
        buf
    }
}
