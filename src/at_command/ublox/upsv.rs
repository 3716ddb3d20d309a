use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+UPSV, UART power saving. Mode 4 lets the chip doze between
/// characters; 0 keeps the UART always on.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetUartPowerSaving(pub u8);

impl AtRequest for SetUartPowerSaving {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+UPSV={}\r", self.0).ok();
        buf
    }
}
