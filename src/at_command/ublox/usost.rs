use core::fmt::Write;
use core::net::IpAddr;
use heapless::String;

use super::usowr::Written;

/// AT+USOST in hex mode, one datagram with the destination inline.
///
/// Streamed in parts like [WriteSocket](super::usowr::WriteSocket); the
/// confirmation line shares the [Written] shape.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SendTo {
    pub id: u8,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    pub ip: IpAddr,
    pub port: u16,
    pub len: usize,
}

impl SendTo {
    pub fn header(&self) -> String<96> {
        let mut buf = String::new();
        write!(
            buf,
            "AT+USOST={},\"{}\",{},{},\"",
            self.id, self.ip, self.port, self.len
        )
        .ok();
        buf
    }
}

pub type Sent = Written;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header() {
        let cmd = SendTo {
            id: 2,
            ip: "10.0.0.1".parse().unwrap(),
            port: 5683,
            len: 5,
        };
        assert_eq!(cmd.header(), "AT+USOST=2,\"10.0.0.1\",5683,5,\"");
    }
}
