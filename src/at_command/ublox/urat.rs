use core::fmt::Write;
use heapless::String;

use crate::at_command::{payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// RAT codes as `+URAT` carries them: 7 = LTE-M, 8 = NB-IoT, 9 = GPRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RatSelection {
    pub primary: u8,
    pub secondary: Option<u8>,
}

/// AT+URAT. Changing the selection requires a reboot before it takes
/// effect.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetRatSelection(pub RatSelection);

impl AtRequest for SetRatSelection {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        match self.0.secondary {
            Some(secondary) => {
                write!(buf, "AT+URAT={},{}\r", self.0.primary, secondary).ok();
            }
            None => {
                write!(buf, "AT+URAT={}\r", self.0.primary).ok();
            }
        }
        buf
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetRatSelection;

impl AtRequest for GetRatSelection {
    type Response = (RatSelection, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+URAT?\r").unwrap()
    }
}

impl AtParseLine for RatSelection {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+URAT")?;
        let mut fields = rest.split(',');
        Ok(RatSelection {
            primary: fields.next().ok_or("Missing RAT")?.trim().parse()?,
            secondary: fields.next().and_then(|f| f.trim().parse().ok()),
        })
    }
}

impl AtResponse for RatSelection {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                RatSelection::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
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
    fn encode_and_parse() {
        assert_eq!(
            SetRatSelection(RatSelection {
                primary: 7,
                secondary: Some(9)
            })
            .encode(),
            "AT+URAT=7,9\r"
        );
        let r = RatSelection::from_line("+URAT: 7,9").unwrap();
        assert_eq!((r.primary, r.secondary), (7, Some(9)));
    }
}
