use core::fmt::Write;
use heapless::{String, Vec};

use crate::at_command::{AtRequest, GenericOk};

/// AT+SQNBANDSEL, band selection for one access technology
/// (0 = LTE-M, 1 = NB-IoT). Bands ride as a quoted comma list.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelectBands {
    pub act: u8,
    pub bands: Vec<u8, 32>,
}

impl AtRequest for SelectBands {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+SQNBANDSEL={},\"standard\",\"", self.act).ok();
        for (i, band) in self.bands.iter().enumerate() {
            if i > 0 {
                buf.push(',').ok();
            }
            write!(buf, "{band}").ok();
        }
        buf.push_str("\"\r").ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        let cmd = SelectBands {
            act: 0,
            bands: Vec::from_slice(&[3, 8, 20]).unwrap(),
        };
        assert_eq!(cmd.encode(), "AT+SQNBANDSEL=0,\"standard\",\"3,8,20\"\r");
    }
}
