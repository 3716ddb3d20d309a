use heapless::String;

use super::{AtRequest, GenericOk};

/// AT&F, reset the active profile to factory defaults.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FactoryDefaults;

impl AtRequest for FactoryDefaults {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        String::try_from("AT&F\r").unwrap()
    }
}
