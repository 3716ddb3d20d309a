use core::fmt::Write;
use heapless::String;

use crate::at_command::{AtRequest, GenericOk};

/// AT+SQNSCFG, per-connection transport tuning (packet size, timeouts).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigureSocket {
    pub id: u8,
    pub cid: u8,
    /// Preferred packet size in bytes.
    pub packet_size: u16,
    /// Exchange timeout in seconds; 0 disables.
    pub exchange_timeout: u16,
    /// Connect timeout in 100 ms steps.
    pub connect_timeout: u16,
    /// Tx flush timeout in 100 ms steps.
    pub tx_timeout: u16,
}

impl ConfigureSocket {
    pub fn defaults(id: u8, cid: u8) -> Self {
        ConfigureSocket {
            id,
            cid,
            packet_size: 300,
            exchange_timeout: 90,
            connect_timeout: 600,
            tx_timeout: 50,
        }
    }
}

impl AtRequest for ConfigureSocket {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(
            buf,
            "AT+SQNSCFG={},{},{},{},{},{}\r",
            self.id,
            self.cid,
            self.packet_size,
            self.exchange_timeout,
            self.connect_timeout,
            self.tx_timeout
        )
        .ok();
        buf
    }
}

/// AT+SQNSCFGEXT. `sr_mode` 1 makes `+SQNSRING` carry the pending byte
/// count.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigureSocketExt {
    pub id: u8,
    pub sr_mode: u8,
    pub recv_data_mode: u8,
    pub keepalive: u16,
}

impl ConfigureSocketExt {
    pub fn defaults(id: u8) -> Self {
        ConfigureSocketExt {
            id,
            sr_mode: 1,
            recv_data_mode: 0,
            keepalive: 0,
        }
    }
}

impl AtRequest for ConfigureSocketExt {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(
            buf,
            "AT+SQNSCFGEXT={},{},{},{}\r",
            self.id, self.sr_mode, self.recv_data_mode, self.keepalive
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
            ConfigureSocket::defaults(1, 1).encode(),
            "AT+SQNSCFG=1,1,300,90,600,50\r"
        );
        assert_eq!(
            ConfigureSocketExt::defaults(1).encode(),
            "AT+SQNSCFGEXT=1,1,0,0\r"
        );
    }
}
