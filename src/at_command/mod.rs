use core::{
    fmt::Debug,
    net::IpAddr,
    num::{ParseFloatError, ParseIntError},
};

use heapless::{String, Vec};

use crate::error::AtError;

pub mod generic;
pub mod registration;

pub mod at;
pub mod ate;
pub mod atf;
pub mod cedrxs;
pub mod cereg;
pub mod cfun;
pub mod cgdcont;
pub mod cgmm;
pub mod cgmr;
pub mod cgreg;
pub mod cmee;
pub mod cops;
pub mod cpin;
pub mod cpsms;
pub mod csq;
pub mod ipr;

pub mod quectel;
pub mod sequans;
pub mod ublox;

pub use generic::{GenericOk, InfoLine, Prompt};
pub use registration::{Registration, RegistrationStatus};

/// The largest payload a single vendor read or send command moves.
pub const DATA_CHUNK: usize = 1536;

#[derive(Clone, Copy, Default, Debug)]
pub struct AtParseErr {
    #[allow(dead_code)]
    message: &'static str,
}

pub trait AtParseLine: Sized {
    fn from_line(line: &str) -> Result<Self, AtParseErr>;
}

/// A command the driver can issue. `encode` renders the full `AT...\r` text.
#[cfg(feature = "defmt")]
pub trait AtRequest: Debug + defmt::Format {
    type Response;
    fn encode(&self) -> String<256>;
}

#[cfg(not(feature = "defmt"))]
pub trait AtRequest: Debug {
    type Response;
    fn encode(&self) -> String<256>;
}

/// A typed view of one [ResponseCode]; the registry of these impls is what
/// turns raw information lines into structured results.
pub trait AtResponse: Sized {
    fn from_generic(code: ResponseCode) -> Result<Self, ResponseCode>;
}

/// What the reader task hands to the command path, one per response line.
///
/// Information lines that are neither final lines nor unsolicited are
/// forwarded raw; the waiting command parses them with its own
/// [AtResponse] impl.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseCode {
    Ok(GenericOk),
    Error(AtError),
    Prompt(Prompt),
    Line(InfoLine),
    Data(SocketData),
}

impl AtParseLine for ResponseCode {
    fn from_line(line: &str) -> Result<Self, AtParseErr> {
        fn parse<'a, T: AtParseLine>(
            line: &'a str,
            f: impl Fn(T) -> ResponseCode + 'a,
        ) -> impl Fn(AtParseErr) -> Result<ResponseCode, AtParseErr> + 'a {
            move |_| Ok(f(T::from_line(line)?))
        }

        Err(AtParseErr::default())
            .or_else(parse(line, ResponseCode::Ok))
            .or_else(parse(line, ResponseCode::Error))
            .or_else(parse(line, ResponseCode::Prompt))
            // anything else is an information line for the pending command
            .or_else(parse(line, ResponseCode::Line))
    }
}

/// One chunk of socket payload, with the source address when the wire
/// format carries one (u-blox `+USORF`).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketData {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    pub addr: Option<(IpAddr, u16)>,
    pub bytes: Vec<u8, DATA_CHUNK>,
}

// SocketData's AtResponse impl lives in ublox::usord, next to the hex line
// parsers it falls back to.

/// A response line announcing a length-delimited binary payload that the
/// reader must consume before framing the next line.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataHeader {
    pub len: usize,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    pub addr: Option<(IpAddr, u16)>,
}

/// Unsolicited result codes, translated by the vendor shim into one
/// vendor-agnostic event stream.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Urc {
    /// Async connect finished; `result` 0 is success, anything else is the
    /// vendor error code.
    SocketOpened { id: u8, result: u16 },
    /// The modem buffered inbound data for the socket.
    SocketReadable { id: u8 },
    /// The peer or the network closed the socket.
    SocketClosed { id: u8 },
    /// The PDP context died; open sockets must deactivate it while closing.
    PdpDeactivated,
    Dns(DnsEvent),
    Registration(Registration),
    /// PSM timer report; arrives on every PSM cycle.
    PsmTimer,
    PoweredDown,
    /// Recognized chatter with no owner (e.g. `+QIND`, `RDY`).
    Ignored,
}

/// Events of an asynchronous (URC-driven) DNS resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DnsEvent {
    /// Result header: `err` 0 announces `count` address lines.
    Summary { err: u16, count: u8 },
    Ip(#[cfg_attr(feature = "defmt", defmt(Debug2Format))] IpAddr),
}

impl From<&'static str> for AtParseErr {
    fn from(message: &'static str) -> Self {
        AtParseErr { message }
    }
}

impl From<ParseIntError> for AtParseErr {
    fn from(_: ParseIntError) -> Self {
        AtParseErr {
            message: "Failed to parse integer",
        }
    }
}

impl From<ParseFloatError> for AtParseErr {
    fn from(_: ParseFloatError) -> Self {
        AtParseErr {
            message: "Failed to parse float",
        }
    }
}

/// Split `+VERB: rest` into `rest`, failing unless the verb matches.
pub(crate) fn payload<'a>(line: &'a str, verb: &str) -> Result<&'a str, AtParseErr> {
    let (head, rest) = line.split_once(':').ok_or("Missing ':'")?;
    if head != verb {
        return Err("Verb mismatch".into());
    }
    Ok(rest.trim_start())
}

/// Strip surrounding double quotes, if present.
pub(crate) fn unquote(field: &str) -> &str {
    field
        .trim()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(field.trim())
}

/// Parse a `"1.2.3.4"`-style field (quotes optional) into an address.
pub(crate) fn parse_ip(field: &str) -> Result<IpAddr, AtParseErr> {
    unquote(field)
        .parse::<IpAddr>()
        .map_err(|_| "Invalid IP address".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_checks_verb() {
        assert_eq!(payload("+CPIN: READY", "+CPIN").unwrap(), "READY");
        assert!(payload("+CPIN: READY", "+CSQ").is_err());
    }

    #[test]
    fn unquote_tolerates_bare_fields() {
        assert_eq!(unquote("\"soracom.io\""), "soracom.io");
        assert_eq!(unquote("7"), "7");
    }

    #[test]
    fn response_code_classification() {
        assert!(matches!(
            ResponseCode::from_line("OK"),
            Ok(ResponseCode::Ok(_))
        ));
        assert!(matches!(
            ResponseCode::from_line("+CME ERROR: SIM busy"),
            Ok(ResponseCode::Error(_))
        ));
        assert!(matches!(
            ResponseCode::from_line("+CSQ: 17,99"),
            Ok(ResponseCode::Line(_))
        ));
    }
}
