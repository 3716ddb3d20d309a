use core::fmt::Write;
use heapless::String;

use super::{AtRequest, GenericOk};

/// AT+CGREG, GSM data registration reporting. Only enabled when the host
/// configured a GSM fallback RAT.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigureGsmReports(pub u8);

impl AtRequest for ConfigureGsmReports {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+CGREG={}\r", self.0).ok();
        buf
    }
}
