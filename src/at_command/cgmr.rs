use heapless::String;

use super::{AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+CGMR, firmware revision.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetFirmwareVersion;

impl AtRequest for GetFirmwareVersion {
    type Response = (FirmwareVersion, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+CGMR\r").unwrap()
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareVersion(pub String<64>);

impl AtParseLine for FirmwareVersion {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        // Some chips prefix the reply with `+CGMR: ` or `Revision: `.
        let line = line
            .strip_prefix("+CGMR:")
            .or_else(|| line.strip_prefix("Revision:"))
            .unwrap_or(line)
            .trim();
        Ok(FirmwareVersion(
            String::try_from(line).map_err(|_| AtParseErr::from("Version too long"))?,
        ))
    }
}

impl AtResponse for FirmwareVersion {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                FirmwareVersion::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
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
            FirmwareVersion::from_line("Revision: BG96MAR02A07M1G").unwrap().0,
            "BG96MAR02A07M1G"
        );
        assert_eq!(FirmwareVersion::from_line("02.06").unwrap().0, "02.06");
    }
}
