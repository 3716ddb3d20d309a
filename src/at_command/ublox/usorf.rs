use core::fmt::Write;
use heapless::{String, Vec};

use crate::at_command::{
    parse_ip, payload, unquote, AtParseErr, AtRequest, GenericOk, SocketData, DATA_CHUNK,
};

use super::hex::decode_hex;

/// AT+USORF, read one (chunk of a) datagram with its source address, hex
/// mode: `+USORF: <id>,"<ip>",<port>,<len>,"<hex>"`. Large datagrams come
/// out in chunks that the UDP socket reassembles by offset.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveFrom {
    pub id: u8,
    pub len: usize,
}

impl AtRequest for ReceiveFrom {
    type Response = (SocketData, GenericOk);
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+USORF={},{}\r", self.id, self.len).ok();
        buf
    }
}

pub(crate) fn parse_receive_line(line: &str) -> Result<SocketData, AtParseErr> {
    let rest = payload(line, "+USORF")?;
    let mut fields = rest.splitn(5, ',');
    let _id: u8 = fields.next().ok_or("Missing id")?.trim().parse()?;

    // A drained reply is just `<id>,0`.
    let second = fields.next().ok_or("Missing field")?;
    let Some(third) = fields.next() else {
        let len: usize = second.trim().parse()?;
        if len != 0 {
            return Err("Missing payload".into());
        }
        return Ok(SocketData {
            addr: None,
            bytes: Vec::new(),
        });
    };

    let ip = parse_ip(second)?;
    let port: u16 = third.trim().parse()?;
    let len: usize = fields.next().ok_or("Missing length")?.trim().parse()?;
    let bytes: Vec<u8, DATA_CHUNK> = decode_hex(unquote(fields.next().ok_or("Missing payload")?))
        .map_err(|_| AtParseErr::from("Bad hex payload"))?;
    if bytes.len() != len {
        return Err("Length/payload mismatch".into());
    }

    Ok(SocketData {
        addr: Some((ip, port)),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_datagram() {
        let data = parse_receive_line("+USORF: 2,\"10.0.0.1\",5683,2,\"4869\"").unwrap();
        assert_eq!(data.bytes.as_slice(), b"Hi");
        let (ip, port) = data.addr.unwrap();
        assert_eq!(ip, "10.0.0.1".parse::<core::net::IpAddr>().unwrap());
        assert_eq!(port, 5683);
    }

    #[test]
    fn parse_drained() {
        let data = parse_receive_line("+USORF: 2,0").unwrap();
        assert!(data.bytes.is_empty());
        assert!(data.addr.is_none());
    }
}
