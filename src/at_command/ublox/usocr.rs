use core::fmt::Write;
use heapless::String;

use crate::at_command::{payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    Tcp = 6,
    Udp = 17,
}

/// AT+USOCR, create a socket. The modem picks the id and reports it back.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CreateSocket(pub Protocol);

impl AtRequest for CreateSocket {
    type Response = (SocketId, GenericOk);
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+USOCR={}\r", self.0 as u8).ok();
        buf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketId(pub u8);

impl AtParseLine for SocketId {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        Ok(SocketId(payload(line, "+USOCR")?.trim().parse()?))
    }
}

impl AtResponse for SocketId {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                SocketId::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode_and_parse() {
        assert_eq!(CreateSocket(Protocol::Tcp).encode(), "AT+USOCR=6\r");
        assert_eq!(CreateSocket(Protocol::Udp).encode(), "AT+USOCR=17\r");
        assert_eq!(SocketId::from_line("+USOCR: 3").unwrap(), SocketId(3));
    }
}
