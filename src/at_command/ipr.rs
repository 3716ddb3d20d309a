use core::fmt::Write;
use heapless::String;

use super::{AtRequest, GenericOk};

/// AT+IPR, fixed UART rate. Issued when baud discovery lands on a
/// non-preferred rate; persistence is chip-specific (see the vendor
/// `set_baud` hooks).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetBaudRate(pub u32);

impl AtRequest for SetBaudRate {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+IPR={}\r", self.0).ok();
        buf
    }
}

/// AT&W, persist the active profile (for the chips that store `+IPR`
/// there).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoreProfile;

impl AtRequest for StoreProfile {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        String::try_from("AT&W\r").unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(SetBaudRate(921_600).encode(), "AT+IPR=921600\r");
        assert_eq!(StoreProfile.encode(), "AT&W\r");
    }
}
