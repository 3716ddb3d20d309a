use heapless::String;

use super::{AtParseErr, AtParseLine, AtResponse, ResponseCode};
use crate::error::AtError;
use crate::read::DATA_PROMPT;

/// A final success line. The vendors add their own spellings on top of the
/// plain `OK`: `SEND OK` after a payload, `CONNECT` on stream entry,
/// `SHUT OK` after teardown.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GenericOk;

impl AtParseLine for GenericOk {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        matches!(line, "OK" | "SEND OK" | "CONNECT" | "SHUT OK")
            .then(|| GenericOk)
            .ok_or_else(|| "Not a final OK line".into())
    }
}

impl AtResponse for GenericOk {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Ok(ok) => Ok(ok),
            _ => Err(code),
        }
    }
}

impl AtParseLine for AtError {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        if let Some(detail) = line.strip_prefix("+CME ERROR:") {
            Ok(AtError::Cme(
                String::try_from(detail.trim()).map_err(|_| AtParseErr::from("Detail too long"))?,
            ))
        } else if let Some(detail) = line.strip_prefix("+CMS ERROR:") {
            Ok(AtError::Cms(
                String::try_from(detail.trim()).map_err(|_| AtParseErr::from("Detail too long"))?,
            ))
        } else if line == "ERROR" {
            Ok(AtError::Generic)
        } else if line == "SEND FAIL" {
            Ok(AtError::SendFail)
        } else if line == "NO CARRIER" {
            Ok(AtError::NoCarrier)
        } else {
            Err("Not a final error line".into())
        }
    }
}

/// The `> ` marker requesting a binary payload.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Prompt;

impl AtParseLine for Prompt {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        (line == DATA_PROMPT || line == ">")
            .then(|| Prompt)
            .ok_or_else(|| "Not the data prompt".into())
    }
}

impl AtResponse for Prompt {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Prompt(prompt) => Ok(prompt),
            _ => Err(code),
        }
    }
}

/// A raw information line, to be parsed by the command that is waiting
/// for it.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InfoLine(pub String<{ crate::read::MAX_LINE }>);

impl AtParseLine for InfoLine {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        Ok(InfoLine(
            String::try_from(line).map_err(|_| AtParseErr::from("Line too long"))?,
        ))
    }
}

impl AtResponse for InfoLine {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => Ok(line),
            _ => Err(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_ok_spellings() {
        for line in ["OK", "SEND OK", "CONNECT", "SHUT OK"] {
            assert!(GenericOk::from_line(line).is_ok());
        }
        assert!(GenericOk::from_line("+CSQ: 1,2").is_err());
    }

    #[test]
    fn final_error_spellings() {
        assert!(matches!(AtError::from_line("ERROR"), Ok(AtError::Generic)));
        assert!(matches!(
            AtError::from_line("SEND FAIL"),
            Ok(AtError::SendFail)
        ));
        assert!(matches!(
            AtError::from_line("NO CARRIER"),
            Ok(AtError::NoCarrier)
        ));

        let Ok(AtError::Cme(detail)) = AtError::from_line("+CME ERROR: Command aborted") else {
            panic!("expected CME error");
        };
        assert_eq!(detail, "Command aborted");
    }
}
