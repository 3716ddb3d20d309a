use core::fmt::Write;
use heapless::String;

use super::{payload, unquote, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+CGDCONT, PDP context definition.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetPdpContext {
    pub cid: u8,
    pub apn: String<63>,
}

impl AtRequest for SetPdpContext {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+CGDCONT={},\"IP\",\"{}\"\r", self.cid, self.apn).ok();
        buf
    }
}

/// AT+CGDCONT?, read back the defined contexts. Only the line for the cid
/// the caller asked about is parsed; the configuration pass compares its
/// APN to decide whether anything changed.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetPdpContext {
    pub cid: u8,
}

impl AtRequest for GetPdpContext {
    type Response = (PdpContext, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+CGDCONT?\r").unwrap()
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PdpContext {
    pub cid: u8,
    pub apn: String<63>,
}

impl AtParseLine for PdpContext {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+CGDCONT")?;
        let mut fields = rest.split(',');
        let cid = fields.next().ok_or("Missing cid")?.trim().parse()?;
        let _pdp_type = fields.next().ok_or("Missing type")?;
        let apn = unquote(fields.next().unwrap_or(""));
        Ok(PdpContext {
            cid,
            apn: String::try_from(apn).map_err(|_| AtParseErr::from("APN too long"))?,
        })
    }
}

impl AtResponse for PdpContext {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                PdpContext::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
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
    fn encode() {
        let cmd = SetPdpContext {
            cid: 1,
            apn: String::try_from("soracom.io").unwrap(),
        };
        assert_eq!(cmd.encode(), "AT+CGDCONT=1,\"IP\",\"soracom.io\"\r");
    }

    #[test]
    fn parse_read() {
        let ctx = PdpContext::from_line("+CGDCONT: 1,\"IP\",\"soracom.io\",\"0.0.0.0\",0,0").unwrap();
        assert_eq!(ctx.cid, 1);
        assert_eq!(ctx.apn, "soracom.io");
    }
}
