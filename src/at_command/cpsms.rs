use core::fmt::Write;
use heapless::String;

use super::{payload, unquote, AtParseErr, AtParseLine, AtRequest, AtResponse, GenericOk, ResponseCode};

/// Requested PSM timers, as the 8-bit strings of 3GPP TS 27.007.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PsmTimers {
    /// Requested periodic TAU (T3412).
    pub tau: &'static str,
    /// Requested active time (T3324).
    pub active: &'static str,
}

/// AT+CPSMS, Power-Saving Mode request.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetPowerSavingMode {
    Disabled,
    Enabled(PsmTimers),
}

impl AtRequest for SetPowerSavingMode {
    type Response = GenericOk;
    fn encode(&self) -> String<256> {
        let mut buf = String::new();
        match self {
            SetPowerSavingMode::Disabled => buf.push_str("AT+CPSMS=0\r").ok(),
            SetPowerSavingMode::Enabled(timers) => {
                write!(buf, "AT+CPSMS=1,,,\"{}\",\"{}\"\r", timers.tau, timers.active).ok()
            }
        };
        buf
    }
}

/// AT+CPSMS?, read back the PSM request for the idempotent configuration
/// pass.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetPowerSavingMode;

impl AtRequest for GetPowerSavingMode {
    type Response = (PsmState, GenericOk);
    fn encode(&self) -> String<256> {
        String::try_from("AT+CPSMS?\r").unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PsmState {
    pub enabled: bool,
    pub tau: Option<[u8; 8]>,
    pub active: Option<[u8; 8]>,
}

impl PsmState {
    pub fn matches(&self, want: Option<PsmTimers>) -> bool {
        match want {
            None => !self.enabled,
            Some(timers) => {
                self.enabled
                    && self.tau.as_ref().map(|t| &t[..]) == Some(timers.tau.as_bytes())
                    && self.active.as_ref().map(|t| &t[..]) == Some(timers.active.as_bytes())
            }
        }
    }
}

fn bits(field: &str) -> Option<[u8; 8]> {
    let field = unquote(field);
    let bytes = field.as_bytes();
    (bytes.len() == 8).then(|| {
        let mut out = [0u8; 8];
        out.copy_from_slice(bytes);
        out
    })
}

impl AtParseLine for PsmState {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let rest = payload(line, "+CPSMS")?;
        let mut fields = rest.split(',');
        let enabled = fields.next().ok_or("Missing mode")?.trim() == "1";
        let _rau = fields.next();
        let _gprs_ready = fields.next();
        let tau = fields.next().and_then(bits);
        let active = fields.next().and_then(bits);
        Ok(PsmState {
            enabled,
            tau,
            active,
        })
    }
}

impl AtResponse for PsmState {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode> {
        match code {
            ResponseCode::Line(line) => {
                PsmState::from_line(&line.0).map_err(|_| ResponseCode::Line(line))
            }
            _ => Err(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::AtRequest;

    const TIMERS: PsmTimers = PsmTimers {
        tau: "10100101",
        active: "00100010",
    };

    #[test]
    fn encode() {
        assert_eq!(SetPowerSavingMode::Disabled.encode(), "AT+CPSMS=0\r");
        assert_eq!(
            SetPowerSavingMode::Enabled(TIMERS).encode(),
            "AT+CPSMS=1,,,\"10100101\",\"00100010\"\r"
        );
    }

    #[test]
    fn read_back_comparison() {
        let state =
            PsmState::from_line("+CPSMS: 1,,,\"10100101\",\"00100010\"").unwrap();
        assert!(state.matches(Some(TIMERS)));
        assert!(!state.matches(None));

        let disabled = PsmState::from_line("+CPSMS: 0").unwrap();
        assert!(disabled.matches(None));
    }
}
