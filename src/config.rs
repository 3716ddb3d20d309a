use heapless::{String, Vec};

/// Radio access technology, in the order the host wants them tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rat {
    LteM = 1,
    NbIot = 2,
    Gsm = 3,
}

/// Session-machine configuration.
///
/// UART pin mapping, pin polarity and interrupt priority parameterize the
/// host's [BuildIo](crate::BuildIo)/[ModemPower](crate::ModemPower)
/// implementations and are not repeated here.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemConfig {
    /// Access point name. Empty means "let the network decide" on chips that
    /// allow it.
    pub apn: String<63>,

    /// 1-based LTE band numbers to scan, in preference order. Empty leaves
    /// the chip's band mask untouched.
    pub bands: Vec<u8, 32>,

    /// Radio access technologies in preference order.
    pub rats: Vec<Rat, 3>,

    /// Baud rates to probe, preferred first.
    pub baud_rates: Vec<u32, 4>,

    /// Numeric operator to register with; None selects automatic `+COPS=0`.
    pub operator: Option<String<16>>,

    /// Ask the chip to enter Power-Saving Mode when the session closes.
    /// Cleared at attach time if the modem fell back to GSM.
    pub use_psm: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        let mut baud_rates = Vec::new();
        baud_rates.extend_from_slice(&[921_600, 115_200]).ok();
        ModemConfig {
            apn: String::new(),
            bands: Vec::new(),
            rats: Vec::from_slice(&[Rat::LteM]).unwrap_or_default(),
            baud_rates,
            operator: None,
            use_psm: false,
        }
    }
}

impl ModemConfig {
    /// The rate the driver tries first and switches the modem to.
    pub fn preferred_baud(&self) -> u32 {
        self.baud_rates.first().copied().unwrap_or(115_200)
    }

    pub fn wants_gsm(&self) -> bool {
        self.rats.contains(&Rat::Gsm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ModemConfig::default();
        assert_eq!(config.preferred_baud(), 921_600);
        assert!(!config.wants_gsm());
        assert!(config.apn.is_empty());
    }
}
