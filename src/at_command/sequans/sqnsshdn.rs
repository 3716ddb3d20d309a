use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+SQNSSHDN, graceful detach and shutdown.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Shutdown;

impl AtRequest for Shutdown {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        String::try_from("AT+SQNSSHDN\r").unwrap()
    }
}

/// AT^RESET, software reboot.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reset;

impl AtRequest for Reset {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        String::try_from("AT^RESET\r").unwrap()
    }
}
