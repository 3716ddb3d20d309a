use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+QPOWD, graceful power-down. `OK` comes first; the modem prints
/// `POWERED DOWN` when it is safe to cut supply.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerDown;

impl AtRequest for PowerDown {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        String::try_from("AT+QPOWD=1\r").unwrap()
    }
}
