use core::fmt::Write;
use core::net::IpAddr;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transport {
    Tcp = 0,
    Udp = 1,
}

/// AT+SQNSD, dial a socket in command mode. Synchronous: `OK` means the
/// connection is up.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dial {
    pub id: u8,
    pub transport: Transport,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    pub ip: IpAddr,
    pub port: u16,
}

impl AtRequest for Dial {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(
            buf,
            "AT+SQNSD={},{},{},\"{}\",0,0,1\r",
            self.id, self.transport as u8, self.port, self.ip
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
        let cmd = Dial {
            id: 1,
            transport: Transport::Tcp,
            ip: "93.184.216.34".parse().unwrap(),
            port: 80,
        };
        assert_eq!(cmd.encode(), "AT+SQNSD=1,0,80,\"93.184.216.34\",0,0,1\r");
    }
}
