use core::fmt::Write;
use core::net::IpAddr;
use heapless::String;

use crate::at_command::{parse_ip, payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+SQNDNSLKUP, synchronous DNS lookup.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResolveHost {
    pub host: String<128>,
}

impl AtRequest for ResolveHost {
    type Response = (ResolvedAddress, GenericOk);
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+SQNDNSLKUP=\"{}\",0\r", self.host).ok();
        buf
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResolvedAddress(
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))] pub IpAddr,
);

impl AtParseLine for ResolvedAddress {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        // +SQNDNSLKUP: <host>,<ip>
        let rest = payload(line, "+SQNDNSLKUP")?;
        let ip = rest.rsplit(',').next().ok_or("Missing address")?;
        Ok(ResolvedAddress(parse_ip(ip)?))
    }
}

impl AtResponse for ResolvedAddress {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                ResolvedAddress::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
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
        let a = ResolvedAddress::from_line("+SQNDNSLKUP: \"example.com\",93.184.216.34").unwrap();
        assert_eq!(a.0, "93.184.216.34".parse::<IpAddr>().unwrap());
    }
}
