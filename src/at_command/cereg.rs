use core::fmt::Write;
use heapless::String;

use super::{AtRequest, GenericOk};

/// AT+CEREG, LTE registration reporting. Mode 2 adds location info to the
/// URC; the driver only needs the status so mode 1 is used.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigureLteReports(pub u8);

impl AtRequest for ConfigureLteReports {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+CEREG={}\r", self.0).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(ConfigureLteReports(1).encode(), "AT+CEREG=1\r");
    }
}
