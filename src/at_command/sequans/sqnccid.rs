use heapless::String;

use crate::at_command::{payload, unquote, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+SQNCCID, SIM ICCID.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetIccid;

impl AtRequest for GetIccid {
    type Response = (Iccid, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+SQNCCID?\r").unwrap()
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Iccid(pub String<22>);

impl AtParseLine for Iccid {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+SQNCCID")?;
        let first = rest.split(',').next().unwrap_or(rest);
        Ok(Iccid(
            String::try_from(unquote(first)).map_err(|_| AtParseErr::from("ICCID too long"))?,
        ))
    }
}

impl AtResponse for Iccid {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                Iccid::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}
