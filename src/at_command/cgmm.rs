use heapless::String;

use super::{AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+CGMM, model identification. The reply is a bare text line.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetModel;

impl AtRequest for GetModel {
    type Response = (Model, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+CGMM\r").unwrap()
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Model(pub String<32>);

impl AtParseLine for Model {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        if line.contains(':') {
            return Err("Not a bare identification line".into());
        }
        Ok(Model(
            String::try_from(line).map_err(|_| AtParseErr::from("Model too long"))?,
        ))
    }
}

impl AtResponse for Model {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                Model::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}
