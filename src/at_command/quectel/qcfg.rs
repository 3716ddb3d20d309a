use core::fmt::Write;
use heapless::String;

use crate::at_command::{
    payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode,
};

/// Band masks as the BG96 carries them: one GSM mask and one 64-bit mask
/// each for LTE-M and NB-IoT (bit n-1 enables band n).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BandMask {
    pub gsm: u32,
    pub cat_m1: u64,
    pub nb_iot: u64,
}

/// AT+QCFG="band",... (hex masks).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetBandMask(pub BandMask);

impl AtRequest for SetBandMask {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(
            buf,
            "AT+QCFG=\"band\",{:x},{:x},{:x},1\r",
            self.0.gsm, self.0.cat_m1, self.0.nb_iot
        )
        .ok();
        buf
    }
}

/// AT+QCFG="band" (read form).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetBandMask;

impl AtRequest for GetBandMask {
    type Response = (BandMask, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+QCFG=\"band\"\r").unwrap()
    }
}

fn hex_field(field: &str) -> Result<u64, AtParseErr> {
    let field = field.trim();
    let field = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(field, 16).map_err(|_| "Invalid hex mask".into())
}

impl AtParseLine for BandMask {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+QCFG")?;
        let rest = rest
            .strip_prefix("\"band\",")
            .ok_or("Not the band setting")?;
        let mut fields = rest.split(',');
        Ok(BandMask {
            gsm: hex_field(fields.next().ok_or("Missing GSM mask")?)? as u32,
            cat_m1: hex_field(fields.next().ok_or("Missing Cat-M1 mask")?)?,
            nb_iot: hex_field(fields.next().ok_or("Missing NB-IoT mask")?)?,
        })
    }
}

impl AtResponse for BandMask {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                BandMask::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}

/// AT+QCFG="iotopmode": 0 = LTE-M, 1 = NB-IoT, 2 = both.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetIotOpMode(pub u8);

impl AtRequest for SetIotOpMode {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+QCFG=\"iotopmode\",{},1\r", self.0).ok();
        buf
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetIotOpMode;

impl AtRequest for GetIotOpMode {
    type Response = (IotOpMode, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+QCFG=\"iotopmode\"\r").unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IotOpMode(pub u8);

impl AtParseLine for IotOpMode {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+QCFG")?;
        let rest = rest
            .strip_prefix("\"iotopmode\",")
            .ok_or("Not the iotopmode setting")?;
        Ok(IotOpMode(
            rest.split(',').next().unwrap_or(rest).trim().parse()?,
        ))
    }
}

impl AtResponse for IotOpMode {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                IotOpMode::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}

/// AT+QCFG="nwscanmode": 0 = automatic, 1 = GSM only, 3 = LTE only.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetScanMode(pub u8);

impl AtRequest for SetScanMode {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+QCFG=\"nwscanmode\",{},1\r", self.0).ok();
        buf
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetScanMode;

impl AtRequest for GetScanMode {
    type Response = (ScanMode, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+QCFG=\"nwscanmode\"\r").unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanMode(pub u8);

impl AtParseLine for ScanMode {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+QCFG")?;
        let rest = rest
            .strip_prefix("\"nwscanmode\",")
            .ok_or("Not the nwscanmode setting")?;
        Ok(ScanMode(
            rest.split(',').next().unwrap_or(rest).trim().parse()?,
        ))
    }
}

impl AtResponse for ScanMode {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                ScanMode::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}

/// AT+QCFG="psm/urc", enable the `+QPSMTIMER` report.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetPsmUrc(pub bool);

impl AtRequest for SetPsmUrc {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        write!(buf, "AT+QCFG=\"psm/urc\",{}\r", self.0 as u8).ok();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    #[test]
    fn encode_band_mask() {
        let mask = BandMask {
            gsm: 0xf,
            cat_m1: 0x80084,
            nb_iot: 0x80084,
        };
        assert_eq!(
            SetBandMask(mask).encode(),
            "AT+QCFG=\"band\",f,80084,80084,1\r"
        );
    }

    #[test]
    fn parse_band_mask() {
        let mask = BandMask::from_line("+QCFG: \"band\",0xf,0x80084,0x80084").unwrap();
        assert_eq!(mask.gsm, 0xf);
        assert_eq!(mask.cat_m1, 0x80084);
    }

    #[test]
    fn parse_modes() {
        assert_eq!(IotOpMode::from_line("+QCFG: \"iotopmode\",2").unwrap().0, 2);
        assert_eq!(ScanMode::from_line("+QCFG: \"nwscanmode\",0").unwrap().0, 0);
    }
}
