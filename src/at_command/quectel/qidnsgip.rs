use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+QIDNSGIP. Answers `OK` immediately; the addresses arrive later as
/// `+QIURC: "dnsgip"` events.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResolveHost {
    pub context: u8,
    pub host: String<128>,
}

impl AtRequest for ResolveHost {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+QIDNSGIP={},\"{}\"\r", self.context, self.host).ok();
        buf
    }
}
