use core::fmt::Write;
use heapless::{String, Vec};

use crate::at_command::{
    payload, unquote, AtParseErr, AtRequest, AtResponse, GenericOk, ResponseCode,
    SocketData, DATA_CHUNK,
};

use super::hex::decode_hex;

/// AT+USORD, read buffered TCP data (hex mode). The payload comes back
/// inline as `+USORD: <id>,<len>,"<hex>"`; a zero length means the buffer
/// drained.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadSocket {
    pub id: u8,
    pub len: usize,
}

impl AtRequest for ReadSocket {
    type Response = (SocketData, GenericOk);
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+USORD={},{}\r", self.id, self.len).ok();
        buf
    }
}

pub(crate) fn parse_read_line(line: &str) -> Result<SocketData, AtParseErr> {
    let rest = payload(line, "+USORD")?;
    let mut fields = rest.splitn(3, ',');
    let _id: u8 = fields.next().ok_or("Missing id")?.trim().parse()?;
    let len: usize = fields.next().ok_or("Missing length")?.trim().parse()?;

    let bytes: Vec<u8, DATA_CHUNK> = match fields.next() {
        Some(hex) => decode_hex(unquote(hex)).map_err(|_| AtParseErr::from("Bad hex payload"))?,
        None if len == 0 => Vec::new(),
        None => return Err("Missing payload".into()),
    };
    if bytes.len() != len {
        return Err("Length/payload mismatch".into());
    }

    Ok(SocketData { addr: None, bytes })
}

impl AtResponse for SocketData {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Data(data) => Ok(data),
            ResponseCode::Line(line) => parse_read_line(&line.0)
                .or_else(|_| super::usorf::parse_receive_line(&line.0))
                .map_err(|_| ResponseCode::Line(line)),
            _ => Err(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_payload() {
        let data = parse_read_line("+USORD: 0,4,\"48545450\"").unwrap();
        assert_eq!(data.bytes.as_slice(), b"HTTP");
        assert!(data.addr.is_none());
    }

    #[test]
    fn parse_drained() {
        let data = parse_read_line("+USORD: 0,0").unwrap();
        assert!(data.bytes.is_empty());
    }
}
