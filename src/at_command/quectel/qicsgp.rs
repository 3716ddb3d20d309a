use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+QICSGP, bind the APN to a context. Changing the APN requires a
/// reboot before it takes effect (undocumented, but required in practice).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetContextApn {
    pub context: u8,
    pub apn: String<63>,
}

impl AtRequest for SetContextApn {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(
            buf,
            "AT+QICSGP={},1,\"{}\",\"\",\"\",1\r",
            self.context, self.apn
        )
        .ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        let cmd = SetContextApn {
            context: 1,
            apn: String::try_from("soracom.io").unwrap(),
        };
        assert_eq!(cmd.encode(), "AT+QICSGP=1,1,\"soracom.io\",\"\",\"\",1\r");
    }
}
