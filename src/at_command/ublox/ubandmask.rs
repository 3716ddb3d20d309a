use core::fmt::Write;
use heapless::String;

use crate::at_command::{payload, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// One RAT's band mask, split into the two 64-bit words the chip reports
/// (bands 1..=64 in `lo`, 65..=128 in `hi`). RAT 0 is LTE-M, 1 is NB-IoT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RatBandMask {
    pub rat: u8,
    pub lo: u64,
    pub hi: u64,
}

/// AT+UBANDMASK (decimal masks).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetBandMask(pub RatBandMask);

impl AtRequest for SetBandMask {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        if self.0.hi != 0 {
            write!(buf, "AT+UBANDMASK={},{},{}\r", self.0.rat, self.0.lo, self.0.hi).ok();
        } else {
            write!(buf, "AT+UBANDMASK={},{}\r", self.0.rat, self.0.lo).ok();
        }
        buf
    }
}

/// AT+UBANDMASK?. The reply interleaves `<rat>,<lo>[,<hi>]` groups; the
/// two mask words belong to one RAT (they are not separate entries).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetBandMask;

impl AtRequest for GetBandMask {
    type Response = (BandMasks, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+UBANDMASK?\r").unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BandMasks {
    pub lte_m: Option<RatBandMask>,
    pub nb_iot: Option<RatBandMask>,
}

impl BandMasks {
    pub fn for_rat(&self, rat: u8) -> Option<RatBandMask> {
        match rat {
            0 => self.lte_m,
            1 => self.nb_iot,
            _ => None,
        }
    }
}

impl AtParseLine for BandMasks {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+UBANDMASK")?;
        let mut out = BandMasks::default();
        let mut fields = rest.split(',').map(str::trim).peekable();

        while let Some(rat_field) = fields.next() {
            let rat: u8 = rat_field.parse()?;
            let lo: u64 = fields.next().ok_or("Missing mask")?.parse()?;
            // A second word only appears for chips with bands above 64; it is
            // part of the same RAT, distinguishable because a RAT id is 0/1.
            let hi = match fields.peek() {
                Some(next) if next.parse::<u64>().map_or(false, |v| v > 1) => {
                    fields.next().and_then(|f| f.parse().ok()).unwrap_or(0)
                }
                _ => 0,
            };
            let mask = RatBandMask { rat, lo, hi };
            match rat {
                0 => out.lte_m = Some(mask),
                1 => out.nb_iot = Some(mask),
                _ => {}
            }
        }

        Ok(out)
    }
}

impl AtResponse for BandMasks {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                BandMasks::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
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
    fn encode() {
        assert_eq!(
            SetBandMask(RatBandMask {
                rat: 0,
                lo: 185473183,
                hi: 0
            })
            .encode(),
            "AT+UBANDMASK=0,185473183\r"
        );
    }

    #[test]
    fn parse_two_rats() {
        let masks = BandMasks::from_line("+UBANDMASK: 0,185473183,1,185473183").unwrap();
        assert_eq!(masks.lte_m.unwrap().lo, 185473183);
        assert_eq!(masks.nb_iot.unwrap().lo, 185473183);
    }

    #[test]
    fn parse_split_mask_words() {
        let masks = BandMasks::from_line("+UBANDMASK: 0,526494,2,1,526494,2").unwrap();
        let m = masks.lte_m.unwrap();
        assert_eq!((m.lo, m.hi), (526494, 2));
        let n = masks.nb_iot.unwrap();
        assert_eq!((n.lo, n.hi), (526494, 2));
    }
}
