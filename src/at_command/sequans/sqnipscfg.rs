use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+SQNIPSCFG, UART power saving. Enabled with a 100 ms guard window
/// when PSM is in play.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetUartPowerSaving(pub bool);

impl AtRequest for SetUartPowerSaving {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        match self.0 {
            true => write!(buf, "AT+SQNIPSCFG=1,100\r").ok(),
            false => write!(buf, "AT+SQNIPSCFG=0\r").ok(),
        };
        buf
    }
}

/// AT+SQNIBRCFG, persist the baud rate the chip boots with.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetInitialBaudRate(pub u32);

impl AtRequest for SetInitialBaudRate {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+SQNIBRCFG=0,{}\r", self.0).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(SetUartPowerSaving(true).encode(), "AT+SQNIPSCFG=1,100\r");
        assert_eq!(SetUartPowerSaving(false).encode(), "AT+SQNIPSCFG=0\r");
        assert_eq!(SetInitialBaudRate(921_600).encode(), "AT+SQNIBRCFG=0,921600\r");
    }
}
