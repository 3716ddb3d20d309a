use heapless::String;

use super::{payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// AT+CSQ, signal quality.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetSignalQuality;

impl AtRequest for GetSignalQuality {
    type Response = (SignalQuality, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+CSQ\r").unwrap()
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalQuality {
    /// RSSI in dBm, None when the modem reports "not known" (99).
    pub rssi_dbm: Option<i16>,
    pub ber: Option<u8>,
}

impl AtParseLine for SignalQuality {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+CSQ")?;
        let (rssi, ber) = rest.split_once(',').ok_or("Missing ','")?;
        let rssi: u8 = rssi.trim().parse()?;
        let ber: u8 = ber.trim().parse()?;

        Ok(SignalQuality {
            // 0 => -113 dBm, 31 => -51 dBm, 2 dBm per step
            rssi_dbm: (rssi != 99).then(|| -113 + 2 * rssi as i16),
            ber: (ber != 99).then(|| ber),
        })
    }
}

impl AtResponse for SignalQuality {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                SignalQuality::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
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
        let q = SignalQuality::from_line("+CSQ: 17,99").unwrap();
        assert_eq!(q.rssi_dbm, Some(-79));
        assert_eq!(q.ber, None);

        let q = SignalQuality::from_line("+CSQ: 99,99").unwrap();
        assert_eq!(q.rssi_dbm, None);
    }
}
