use core::fmt::Write;
use heapless::String;

use super::{AtRequest, GenericOk};

/// ATE0 / ATE1, command echo.
///
/// Echo is disabled as the first thing after baud discovery; until then the
/// reader skips echoed lines.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetEcho(pub bool);

impl AtRequest for SetEcho {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "ATE{}\r", self.0 as u8).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        assert_eq!(SetEcho(false).encode(), "ATE0\r");
        assert_eq!(SetEcho(true).encode(), "ATE1\r");
    }
}
