use crate::at_command::{payload, registration::Registration, AtParseLine, DataHeader, Urc};

/// Classify a Monarch unsolicited line.
pub fn classify(line: &str) -> Option<Urc> {
    if let Ok(registration) = Registration::from_line(line) {
        return Some(Urc::Registration(registration));
    }

    // +SQNSRING: <connId>[,<pending>] with sr_mode 1.
    if let Ok(rest) = payload(line, "+SQNSRING") {
        let id = rest.split(',').next()?.trim().parse().ok()?;
        return Some(Urc::SocketReadable { id });
    }

    // The chip reuses NO CARRIER as an in-command final; the per-socket
    // closure arrives as +SQNSH when the peer hangs up.
    if let Ok(rest) = payload(line, "+SQNSH") {
        let id = rest.trim().parse().ok()?;
        return Some(Urc::SocketClosed { id });
    }

    if line == "+SHUTDOWN" {
        return Some(Urc::PoweredDown);
    }

    None
}

/// `+SQNSRECV: <id>,<len>` announces `<len>` raw payload bytes.
pub fn data_header(line: &str) -> Option<DataHeader> {
    let rest = payload(line, "+SQNSRECV").ok()?;
    let (_id, len) = rest.split_once(',')?;
    Some(DataHeader {
        len: len.trim().parse().ok()?,
        addr: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_and_close() {
        assert!(matches!(
            classify("+SQNSRING: 1,64"),
            Some(Urc::SocketReadable { id: 1 })
        ));
        assert!(matches!(
            classify("+SQNSRING: 3"),
            Some(Urc::SocketReadable { id: 3 })
        ));
        assert!(matches!(
            classify("+SQNSH: 1"),
            Some(Urc::SocketClosed { id: 1 })
        ));
    }

    #[test]
    fn shutdown() {
        assert!(matches!(classify("+SHUTDOWN"), Some(Urc::PoweredDown)));
    }

    #[test]
    fn read_header() {
        assert_eq!(data_header("+SQNSRECV: 1,128").unwrap().len, 128);
        assert!(data_header("+SQNSI: 1,0,0,0,0").is_none());
    }
}
