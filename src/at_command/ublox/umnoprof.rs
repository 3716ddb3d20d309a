use core::fmt::Write;
use heapless::String;

use crate::at_command::{payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+UMNOPROF, mobile network operator profile. Changing it requires a
/// reboot before it takes effect.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetMnoProfile(pub u8);

impl AtRequest for SetMnoProfile {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+UMNOPROF={}\r", self.0).ok();
        buf
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetMnoProfile;

impl AtRequest for GetMnoProfile {
    type Response = (MnoProfile, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+UMNOPROF?\r").unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MnoProfile(pub u8);

impl AtParseLine for MnoProfile {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+UMNOPROF")?;
        Ok(MnoProfile(
            rest.split(',').next().unwrap_or(rest).trim().parse()?,
        ))
    }
}

impl AtResponse for MnoProfile {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                MnoProfile::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}
