use core::fmt::Write;
use heapless::String;

use crate::at_command::{payload, AtParseErr, AtParseLine, AtResponse, ResponseCode};

/// AT+USOWR in hex mode: the payload rides inline, no prompt involved.
///
/// The hex body can be twice the vendor MTU, far beyond a command buffer,
/// so the write is streamed in parts: this header, the hex payload, then
/// `"\r`. The `+USOWR: <id>,<len>` reply confirms how much the chip
/// accepted.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WriteSocket {
    pub id: u8,
    pub len: usize,
}

impl WriteSocket {
    pub fn header(&self) -> String<64> {
        let mut buf = String::new();
        write!(buf, "AT+USOWR={},{},\"", self.id, self.len).ok();
        buf
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Written {
    pub id: u8,
    pub len: usize,
}

impl AtParseLine for Written {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+USOWR").or_else(|_| payload(line, "+USOST"))?;
        let (id, len) = rest.split_once(',').ok_or("Missing ','")?;
        Ok(Written {
            id: id.trim().parse()?,
            len: len.trim().parse()?,
        })
    }
}

impl AtResponse for Written {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                Written::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header() {
        assert_eq!(WriteSocket { id: 0, len: 2 }.header(), "AT+USOWR=0,2,\"");
    }

    #[test]
    fn parse_confirmation() {
        let w = Written::from_line("+USOWR: 0,2").unwrap();
        assert_eq!((w.id, w.len), (0, 2));
        let w = Written::from_line("+USOST: 3,16").unwrap();
        assert_eq!((w.id, w.len), (3, 16));
    }
}
