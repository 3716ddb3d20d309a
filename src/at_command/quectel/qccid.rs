use heapless::String;

use crate::at_command::{payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+QCCID, SIM ICCID.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetIccid;

impl AtRequest for GetIccid {
    type Response = (Iccid, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+QCCID\r").unwrap()
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Iccid(pub String<22>);

impl AtParseLine for Iccid {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+QCCID")?;
        Ok(Iccid(
            String::try_from(rest.trim()).map_err(|_| AtParseErr::from("ICCID too long"))?,
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
