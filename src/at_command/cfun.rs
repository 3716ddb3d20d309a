use core::fmt::Write;
use heapless::String;

use super::{AtRequest, GenericOk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Functionality {
    /// Radio and SIM off.
    Minimum = 0,
    /// Full functionality.
    Full = 1,
    /// Airplane mode: radio off, SIM reachable.
    Airplane = 4,
}

/// AT+CFUN, radio functionality. The session machine configures the chip
/// offline and raises `Full` right before registration.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetFunctionality(pub Functionality);

impl AtRequest for SetFunctionality {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+CFUN={}\r", self.0 as u8).ok();
        buf
    }
}

/// AT+CFUN=1,1 (and vendor variants), reboot the module.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reboot {
    /// The `<fun>,<rst>` form differs per chip; this is the raw argument
    /// string after `AT+CFUN=`.
    pub args: &'static str,
}

impl AtRequest for Reboot {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+CFUN={}\r", self.args).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(SetFunctionality(Functionality::Full).encode(), "AT+CFUN=1\r");
        assert_eq!(
            SetFunctionality(Functionality::Airplane).encode(),
            "AT+CFUN=4\r"
        );
        assert_eq!(Reboot { args: "1,1" }.encode(), "AT+CFUN=1,1\r");
        assert_eq!(Reboot { args: "15" }.encode(), "AT+CFUN=15\r");
    }
}
