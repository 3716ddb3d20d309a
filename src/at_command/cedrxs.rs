use core::fmt::Write;
use heapless::String;

use super::{AtRequest, GenericOk};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessTechnology {
    CatM = 4,
    NbIot = 5,
}

/// AT+CEDRXS, eDRX request. The driver keeps eDRX off; PSM is the power
/// story of this family.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigureEdrx {
    Disabled,
    Enabled {
        act: AccessTechnology,
        /// Requested cycle length, 4-bit string.
        cycle: &'static str,
    },
}

impl AtRequest for ConfigureEdrx {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        match self {
            ConfigureEdrx::Disabled => buf.push_str("AT+CEDRXS=0\r").ok(),
            ConfigureEdrx::Enabled { act, cycle } => {
                write!(buf, "AT+CEDRXS=1,{},\"{cycle}\"\r", *act as u8).ok()
            }
        };
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(ConfigureEdrx::Disabled.encode(), "AT+CEDRXS=0\r");
        assert_eq!(
            ConfigureEdrx::Enabled {
                act: AccessTechnology::CatM,
                cycle: "0101"
            }
            .encode(),
            "AT+CEDRXS=1,4,\"0101\"\r"
        );
    }
}
