use core::fmt::Write;
use heapless::String;

use super::{AtRequest, GenericOk};

/// AT+COPS, operator selection. Registration can take minutes; the session
/// machine issues this as an abortable long command.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectOperator {
    Automatic,
    /// Manual selection by numeric operator code (format 2).
    Manual(String<16>),
}

impl AtRequest for SelectOperator {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        match self {
            SelectOperator::Automatic => buf.push_str("AT+COPS=0\r").ok(),
            SelectOperator::Manual(operator) => {
                write!(buf, "AT+COPS=1,2,\"{operator}\"\r").ok()
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
        assert_eq!(SelectOperator::Automatic.encode(), "AT+COPS=0\r");
        assert_eq!(
            SelectOperator::Manual(String::try_from("24001").unwrap()).encode(),
            "AT+COPS=1,2,\"24001\"\r"
        );
    }
}
