use core::fmt::Write;
use core::net::IpAddr;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+USOCO, connect a TCP socket. Synchronous: the final `OK` arrives once
/// the connection is up (or an error once it is not). The chip allows only
/// one connecting socket at a time, which the facade serializes.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectSocket {
    pub id: u8,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    pub ip: IpAddr,
    pub port: u16,
}

impl AtRequest for ConnectSocket {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+USOCO={},\"{}\",{}\r", self.id, self.ip, self.port).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode() {
        let cmd = ConnectSocket {
            id: 0,
            ip: "93.184.216.34".parse().unwrap(),
            port: 80,
        };
        assert_eq!(cmd.encode(), "AT+USOCO=0,\"93.184.216.34\",80\r");
    }
}
