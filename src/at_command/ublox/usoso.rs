use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+USOSO, set a socket option. The driver enables SO_KEEPALIVE
/// (level 65535, option 8) on fresh TCP sockets.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetSocketOption {
    pub id: u8,
    pub level: u16,
    pub option: u16,
    pub value: u32,
}

impl SetSocketOption {
    pub fn keepalive(id: u8) -> Self {
        SetSocketOption {
            id,
            level: 65535,
            option: 8,
            value: 1,
        }
    }
}

impl AtRequest for SetSocketOption {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(
            buf,
            "AT+USOSO={},{},{},{}\r",
            self.id, self.level, self.option, self.value
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
        assert_eq!(
            SetSocketOption::keepalive(0).encode(),
            "AT+USOSO=0,65535,8,1\r"
        );
    }
}
