use crate::at_command::{payload, registration::Registration, AtParseLine, Urc};

fn id_and_rest(rest: &str) -> Option<(u8, Option<&str>)> {
    match rest.split_once(',') {
        Some((id, tail)) => Some((id.trim().parse().ok()?, Some(tail))),
        None => Some((rest.trim().parse().ok()?, None)),
    }
}

/// Classify a SARA-R4/R5 unsolicited line.
pub fn classify(line: &str) -> Option<Urc> {
    if let Ok(registration) = Registration::from_line(line) {
        return Some(Urc::Registration(registration));
    }

    // +UUSORD/+UUSORF announce buffered data with a byte count we don't
    // need; the read command asks for its own count.
    if let Ok(rest) = payload(line, "+UUSORD") {
        let (id, _) = id_and_rest(rest)?;
        return Some(Urc::SocketReadable { id });
    }
    if let Ok(rest) = payload(line, "+UUSORF") {
        let (id, _) = id_and_rest(rest)?;
        return Some(Urc::SocketReadable { id });
    }

    if let Ok(rest) = payload(line, "+UUSOCL") {
        let (id, _) = id_and_rest(rest)?;
        return Some(Urc::SocketClosed { id });
    }

    // SARA-R5 async connect result.
    if let Ok(rest) = payload(line, "+UUSOCO") {
        let (id, tail) = id_and_rest(rest)?;
        let result = tail.and_then(|t| t.trim().parse().ok()).unwrap_or(0);
        return Some(Urc::SocketOpened { id, result });
    }

    if payload(line, "+UUPSDD").is_ok() {
        return Some(Urc::PdpDeactivated);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_events() {
        assert!(matches!(
            classify("+UUSORD: 3,16"),
            Some(Urc::SocketReadable { id: 3 })
        ));
        assert!(matches!(
            classify("+UUSORF: 2,32"),
            Some(Urc::SocketReadable { id: 2 })
        ));
        assert!(matches!(
            classify("+UUSOCL: 3"),
            Some(Urc::SocketClosed { id: 3 })
        ));
    }

    #[test]
    fn async_connect() {
        assert!(matches!(
            classify("+UUSOCO: 0,0"),
            Some(Urc::SocketOpened { id: 0, result: 0 })
        ));
        assert!(matches!(
            classify("+UUSOCO: 0,11"),
            Some(Urc::SocketOpened { id: 0, result: 11 })
        ));
    }

    #[test]
    fn pdp_loss() {
        assert!(matches!(classify("+UUPSDD: 0"), Some(Urc::PdpDeactivated)));
    }

    #[test]
    fn responses_pass_through() {
        assert!(classify("+USORD: 0,4,\"48545450\"").is_none());
        assert!(classify("+USOCR: 2").is_none());
    }
}
