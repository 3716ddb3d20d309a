use core::fmt::Write;
use heapless::String;

use crate::at_command::{payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+SQNSI, socket counters. Consulted when a send runs long, to tell
/// a slow network from a wedged chip.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetSocketInfo {
    pub id: u8,
}

impl AtRequest for GetSocketInfo {
    type Response = (SocketInfo, GenericOk);
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+SQNSI={}\r", self.id).ok();
        buf
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketInfo {
    pub id: u8,
    pub sent: u32,
    pub received: u32,
    pub buffered_in: u32,
    pub ack_waiting: u32,
}

impl AtParseLine for SocketInfo {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+SQNSI")?;
        let mut fields = rest.split(',').map(str::trim);
        Ok(SocketInfo {
            id: fields.next().ok_or("Missing id")?.parse()?,
            sent: fields.next().ok_or("Missing sent")?.parse()?,
            received: fields.next().ok_or("Missing received")?.parse()?,
            buffered_in: fields.next().ok_or("Missing buffered")?.parse()?,
            ack_waiting: fields.next().ok_or("Missing ack")?.parse()?,
        })
    }
}

impl AtResponse for SocketInfo {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                SocketInfo::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let info = SocketInfo::from_line("+SQNSI: 1,123,456,0,18").unwrap();
        assert_eq!(info.ack_waiting, 18);
    }
}
