use heapless::String;

use crate::at_command::{
    payload, unquote, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode,
};

/// AT+QIGETERROR, detail of the last socket-level failure.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetLastError;

impl AtRequest for GetLastError {
    type Response = (SocketError, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+QIGETERROR\r").unwrap()
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketError {
    pub code: u16,
    pub detail: String<64>,
}

impl SocketError {
    /// Codes the caller may retry: buffer full, operation busy.
    pub fn is_transient(&self) -> bool {
        matches!(self.code, 551 | 553 | 563)
    }
}

impl AtParseLine for SocketError {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+QIGETERROR")?;
        let (code, detail) = rest.split_once(',').unwrap_or((rest, ""));
        Ok(SocketError {
            code: code.trim().parse()?,
            detail: String::try_from(unquote(detail))
                .map_err(|_| AtParseErr::from("Detail too long"))?,
        })
    }
}

impl AtResponse for SocketError {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                SocketError::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
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
        let err = SocketError::from_line("+QIGETERROR: 553,\"Operation busy\"").unwrap();
        assert_eq!(err.code, 553);
        assert!(err.is_transient());
    }
}
