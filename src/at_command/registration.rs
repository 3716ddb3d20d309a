use super::{AtParseErr, AtParseLine};

/// Network registration state, fed by the `+CEREG`/`+CGREG` URCs.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Registration {
    pub status: RegistrationStatus,

    /// Whether the report came from the LTE (`+CEREG`) path. A GSM attach
    /// (`+CGREG` first) disables PSM for the session.
    pub lte: bool,
}

impl Registration {
    pub const NONE: Registration = Registration {
        status: RegistrationStatus::Unknown,
        lte: true,
    };

    pub fn attached(&self) -> bool {
        matches!(
            self.status,
            RegistrationStatus::RegisteredHome | RegistrationStatus::RegisteredRoaming
        )
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationStatus {
    NotRegistered,
    RegisteredHome,
    Searching,
    Denied,
    Unknown,
    RegisteredRoaming,
    /// Status 80: the connection to the network was lost.
    Lost,
}

impl AtParseLine for Registration {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        let (verb, rest) = line.split_once(':').ok_or("Missing ':'")?;
        let lte = match verb {
            "+CEREG" => true,
            "+CGREG" => false,
            _ => return Err("Not a registration report".into()),
        };

        // The URC form is `<stat>[,<tac>,<ci>,...]`, the read form
        // `<n>,<stat>[,...]`; trailing fields are quoted strings. Take the
        // last bare integer of the first two fields as <stat>.
        let mut fields = rest.trim().split(',');
        let first = fields.next().ok_or("Empty report")?.trim();
        let status: i32 = match fields.next().map(str::trim) {
            Some(second) if !second.is_empty() && second.chars().all(|c| c.is_ascii_digit()) => {
                second.parse()?
            }
            _ => first.parse()?,
        };

        let status = match status {
            1 => RegistrationStatus::RegisteredHome,
            2 => RegistrationStatus::Searching,
            3 => RegistrationStatus::Denied,
            4 => RegistrationStatus::Unknown,
            5 => RegistrationStatus::RegisteredRoaming,
            80 => RegistrationStatus::Lost,
            _ => RegistrationStatus::NotRegistered,
        };

        Ok(Registration { status, lte })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urc_form() {
        let r = Registration::from_line("+CEREG: 5").unwrap();
        assert_eq!(r.status, RegistrationStatus::RegisteredRoaming);
        assert!(r.lte);
        assert!(r.attached());
    }

    #[test]
    fn read_form_takes_second_field() {
        let r = Registration::from_line("+CEREG: 2,1,\"3a9\",\"0000c33d\",7").unwrap();
        assert_eq!(r.status, RegistrationStatus::RegisteredHome);
    }

    #[test]
    fn gsm_report_clears_lte() {
        let r = Registration::from_line("+CGREG: 1").unwrap();
        assert!(!r.lte);
        assert!(r.attached());
    }

    #[test]
    fn denial_and_loss() {
        assert_eq!(
            Registration::from_line("+CEREG: 3").unwrap().status,
            RegistrationStatus::Denied
        );
        assert_eq!(
            Registration::from_line("+CEREG: 80").unwrap().status,
            RegistrationStatus::Lost
        );
    }
}
