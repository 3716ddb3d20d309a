use embassy_time::TimeoutError;
use heapless::String;

/// A final error line reported by the modem.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AtError {
    /// Bare `ERROR`.
    Generic,

    /// `+CME ERROR: <detail>`, mobile equipment or network.
    Cme(String<64>),

    /// `+CMS ERROR: <detail>`, message service.
    Cms(String<64>),

    /// `SEND FAIL`.
    SendFail,

    /// `NO CARRIER`.
    NoCarrier,
}

impl AtError {
    /// Whether the modem reported a transient condition the caller may retry.
    pub fn is_transient(&self) -> bool {
        match self {
            AtError::Cme(detail) => {
                let d = detail.as_str();
                d.contains("busy") || d.contains("memory") || d.contains("not allowed")
            }
            _ => false,
        }
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The modem answered a command with a final error line.
    At(AtError),

    /// No final line arrived before the command deadline.
    CommandTimeout,

    /// Transient fault (busy, memory exhausted, not allowed). Retryable.
    Unavailable,

    /// Unexpected socket-level error, with the vendor error code.
    Unknown(u16),

    /// The network refused the attach. Not retryable at this layer.
    RegistrationDenied,

    /// Registration was lost after attach.
    ConnectionLost,

    /// No free socket id in the vendor range.
    ResourceExhausted,

    /// Datagram exceeds the vendor MTU.
    PayloadTooLarge,

    /// Socket used without a prior connect.
    NotConnected,

    /// Operation on a closed socket or a torn-down session.
    Closed,

    /// Listening sockets and broadcast are not provided by the modems.
    Unimplemented,

    /// No APN configured and the vendor requires one.
    NoApn,

    BufferOverflow,
    InvalidUtf8,
    Serial,
}

impl embedded_io_async::Error for Error {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        match self {
            Error::CommandTimeout => embedded_io_async::ErrorKind::TimedOut,
            Error::Unavailable => embedded_io_async::ErrorKind::Interrupted,
            Error::ResourceExhausted => embedded_io_async::ErrorKind::OutOfMemory,
            Error::NotConnected => embedded_io_async::ErrorKind::NotConnected,
            Error::Unimplemented => embedded_io_async::ErrorKind::Unsupported,
            Error::BufferOverflow => embedded_io_async::ErrorKind::OutOfMemory,
            Error::InvalidUtf8 => embedded_io_async::ErrorKind::InvalidData,
            _ => embedded_io_async::ErrorKind::Other,
        }
    }
}

impl From<AtError> for Error {
    fn from(e: AtError) -> Self {
        if e.is_transient() {
            Error::Unavailable
        } else {
            Error::At(e)
        }
    }
}

impl From<TimeoutError> for Error {
    fn from(_: TimeoutError) -> Self {
        Error::CommandTimeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_cme_becomes_unavailable() {
        let e: Error = AtError::Cme(String::try_from("SIM busy").unwrap()).into();
        assert!(matches!(e, Error::Unavailable));

        let e: Error = AtError::Cme(String::try_from("operation not allowed").unwrap()).into();
        assert!(matches!(e, Error::Unavailable));

        let e: Error = AtError::Cme(String::try_from("no network service").unwrap()).into();
        assert!(matches!(e, Error::At(_)));
    }
}
