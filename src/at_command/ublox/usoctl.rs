use core::fmt::Write;
use heapless::String;

use crate::at_command::{payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+USOCTL=<id>,11: bytes sent but not yet acknowledged by the peer.
/// The write path polls this to keep the chip's outbound queue bounded.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetOutboundPending {
    pub id: u8,
}

impl AtRequest for GetOutboundPending {
    type Response = (OutboundPending, GenericOk);
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+USOCTL={},11\r", self.id).ok();
        buf
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutboundPending {
    pub id: u8,
    pub bytes: usize,
}

impl AtParseLine for OutboundPending {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+USOCTL")?;
        let mut fields = rest.split(',');
        let id = fields.next().ok_or("Missing id")?.trim().parse()?;
        let param: u8 = fields.next().ok_or("Missing param")?.trim().parse()?;
        if param != 11 {
            return Err("Not the outbound counter".into());
        }
        Ok(OutboundPending {
            id,
            bytes: fields.next().ok_or("Missing value")?.trim().parse()?,
        })
    }
}

impl AtResponse for OutboundPending {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                OutboundPending::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
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
        let p = OutboundPending::from_line("+USOCTL: 0,11,10000").unwrap();
        assert_eq!(p.bytes, 10_000);
    }
}
