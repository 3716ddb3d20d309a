use core::fmt::Write;
use core::net::IpAddr;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketService {
    Tcp,
    /// "UDP SERVICE" mode: the socket is unbound and `AT+QISEND` carries the
    /// destination inline.
    Udp,
}

/// AT+QIOPEN. Returns `OK` immediately; the actual result arrives as the
/// `+QIOPEN: <id>,<err>` URC.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpenSocket {
    pub context: u8,
    pub id: u8,
    pub service: SocketService,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    pub peer: Option<(IpAddr, u16)>,
}

impl AtRequest for OpenSocket {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        match (self.service, self.peer) {
            (SocketService::Tcp, Some((ip, port))) => {
                write!(
                    buf,
                    "AT+QIOPEN={},{},\"TCP\",\"{ip}\",{port},0,0\r",
                    self.context, self.id
                )
                .ok();
            }
            _ => {
                // UDP service sockets are unbound; the remote rides on the
                // send command.
                write!(
                    buf,
                    "AT+QIOPEN={},{},\"UDP SERVICE\",\"127.0.0.1\",0,0,0\r",
                    self.context, self.id
                )
                .ok();
            }
        }
        buf
    }
}

/// AT+QIACT, bring up the PDP context. Takes up to 150 s and is issued as
/// an abortable long command.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActivateContext(pub u8);

impl AtRequest for ActivateContext {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+QIACT={}\r", self.0).ok();
        buf
    }
}

/// AT+QIDEACT, tear the PDP context down.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeactivateContext(pub u8);

impl AtRequest for DeactivateContext {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+QIDEACT={}\r", self.0).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode_tcp_open() {
        let cmd = OpenSocket {
            context: 1,
            id: 0,
            service: SocketService::Tcp,
            peer: Some(("93.184.216.34".parse().unwrap(), 80)),
        };
        assert_eq!(cmd.encode(), "AT+QIOPEN=1,0,\"TCP\",\"93.184.216.34\",80,0,0\r");
    }

    #[test]
    fn encode_udp_open() {
        let cmd = OpenSocket {
            context: 1,
            id: 2,
            service: SocketService::Udp,
            peer: None,
        };
        assert_eq!(
            cmd.encode(),
            "AT+QIOPEN=1,2,\"UDP SERVICE\",\"127.0.0.1\",0,0,0\r"
        );
    }

    #[test]
    fn encode_context() {
        assert_eq!(ActivateContext(1).encode(), "AT+QIACT=1\r");
        assert_eq!(DeactivateContext(1).encode(), "AT+QIDEACT=1\r");
    }
}
