use heapless::String;

use super::{AtRequest, GenericOk};

/// The empty `AT` ping; answers `OK` whenever the modem is alive at the
/// current baud rate.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct At;

impl AtRequest for At {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        String::try_from("AT\r").unwrap()
    }
}
