use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+CPWROFF, graceful shutdown. The final `OK` can take tens of seconds
/// while the chip detaches.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerOff;

impl AtRequest for PowerOff {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        String::try_from("AT+CPWROFF\r").unwrap()
    }
}
