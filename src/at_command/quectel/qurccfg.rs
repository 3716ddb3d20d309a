use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+QURCCFG="urcport", steer URCs to the UART the driver listens on.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RouteUrcsToUart;

impl AtRequest for RouteUrcsToUart {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+QURCCFG=\"urcport\",\"uart1\"\r").ok();
        buf
    }
}
