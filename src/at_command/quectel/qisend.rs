use core::fmt::Write;
use core::net::IpAddr;
use heapless::String;

use crate::at_command::{AtRequest, Prompt};

/// AT+QISEND for a connected (TCP) socket. The modem answers with the data
/// prompt; the payload follows as raw bytes and the transfer finishes with
/// `SEND OK`.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SendData {
    pub id: u8,
    pub len: usize,
}

impl AtRequest for SendData {
    type Response = Prompt;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+QISEND={},{}\r", self.id, self.len).ok();
        buf
    }
}

/// AT+QISEND with an inline destination, for "UDP SERVICE" sockets.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SendDataTo {
    pub id: u8,
    pub len: usize,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    pub ip: IpAddr,
    pub port: u16,
}

impl AtRequest for SendDataTo {
    type Response = Prompt;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(
            buf,
            "AT+QISEND={},{},\"{}\",{}\r",
            self.id, self.len, self.ip, self.port
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
        assert_eq!(SendData { id: 0, len: 18 }.encode(), "AT+QISEND=0,18\r");
        assert_eq!(
            SendDataTo {
                id: 2,
                len: 5,
                ip: "10.0.0.1".parse().unwrap(),
                port: 5683
            }
            .encode(),
            "AT+QISEND=2,5,\"10.0.0.1\",5683\r"
        );
    }
}
