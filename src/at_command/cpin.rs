use heapless::String;

use super::{payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+CPIN?, SIM readiness query. Polled after power-up until the SIM
/// answers READY.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetPinStatus;

impl AtRequest for GetPinStatus {
    type Response = (PinStatus, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+CPIN?\r").unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinStatus {
    Ready,
    /// The SIM wants a PIN/PUK the driver does not supply.
    Locked,
    NotInserted,
}

impl AtParseLine for PinStatus {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let status = match payload(line, "+CPIN")? {
            "READY" => PinStatus::Ready,
            "NOT INSERTED" => PinStatus::NotInserted,
            _ => PinStatus::Locked,
        };
        Ok(status)
    }
}

impl AtResponse for PinStatus {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                PinStatus::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
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
        assert_eq!(
            PinStatus::from_line("+CPIN: READY").unwrap(),
            PinStatus::Ready
        );
        assert_eq!(
            PinStatus::from_line("+CPIN: SIM PIN").unwrap(),
            PinStatus::Locked
        );
        assert_eq!(
            PinStatus::from_line("+CPIN: NOT INSERTED").unwrap(),
            PinStatus::NotInserted
        );
    }
}
