use core::fmt::Write;
use heapless::String;

use super::{AtRequest, GenericOk};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CmeErrorMode {
    Disabled = 0,
    Numeric = 1,
    Verbose = 2,
}

/// AT+CMEE, error report format. The driver runs with verbose reports so
/// `+CME ERROR` lines carry text the abort protocol can match on.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigureCmeErrors(pub CmeErrorMode);

impl AtRequest for ConfigureCmeErrors {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+CMEE={}\r", self.0 as u8).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(
            ConfigureCmeErrors(CmeErrorMode::Verbose).encode(),
            "AT+CMEE=2\r"
        );
    }
}
