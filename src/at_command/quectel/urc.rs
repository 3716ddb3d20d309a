use crate::at_command::{
    parse_ip, payload, registration::Registration, unquote, AtParseLine, DataHeader, DnsEvent, Urc,
};

/// Classify a BG96 unsolicited line. Returns None when the line is not a
/// URC (and may therefore belong to the pending command).
pub fn classify(line: &str) -> Option<Urc> {
    if let Ok(registration) = Registration::from_line(line) {
        return Some(Urc::Registration(registration));
    }

    if let Ok(rest) = payload(line, "+QIOPEN") {
        let (id, result) = rest.split_once(',')?;
        return Some(Urc::SocketOpened {
            id: id.trim().parse().ok()?,
            result: result.trim().parse().ok()?,
        });
    }

    if let Ok(rest) = payload(line, "+QIURC") {
        let mut fields = rest.split(',');
        let kind = unquote(fields.next()?);
        return match kind {
            "recv" => Some(Urc::SocketReadable {
                id: fields.next()?.trim().parse().ok()?,
            }),
            "closed" => Some(Urc::SocketClosed {
                id: fields.next()?.trim().parse().ok()?,
            }),
            "pdpdeact" => Some(Urc::PdpDeactivated),
            "dnsgip" => {
                let first = fields.next()?.trim();
                if first.starts_with('"') {
                    Some(Urc::Dns(DnsEvent::Ip(parse_ip(first).ok()?)))
                } else {
                    let err = first.parse().ok()?;
                    let count = fields.next().and_then(|f| f.trim().parse().ok()).unwrap_or(0);
                    Some(Urc::Dns(DnsEvent::Summary { err, count }))
                }
            }
            _ => Some(Urc::Ignored),
        };
    }

    if payload(line, "+QPSMTIMER").is_ok() {
        return Some(Urc::PsmTimer);
    }

    if line == "POWERED DOWN" || line == "NORMAL POWER DOWN" {
        return Some(Urc::PoweredDown);
    }

    if payload(line, "+QIND").is_ok() || line == "RDY" || line == "APP RDY" {
        return Some(Urc::Ignored);
    }

    None
}

/// `+QIRD: <len>` announces `<len>` raw payload bytes. The query form
/// (three counters) is not used by the driver and is left alone.
pub fn data_header(line: &str) -> Option<DataHeader> {
    let rest = payload(line, "+QIRD").ok()?;
    if rest.contains(',') {
        return None;
    }
    Some(DataHeader {
        len: rest.trim().parse().ok()?,
        addr: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at_command::RegistrationStatus;

    #[test]
    fn open_result() {
        assert!(matches!(
            classify("+QIOPEN: 0,0"),
            Some(Urc::SocketOpened { id: 0, result: 0 })
        ));
        assert!(matches!(
            classify("+QIOPEN: 0,566"),
            Some(Urc::SocketOpened {
                id: 0,
                result: 566
            })
        ));
    }

    #[test]
    fn socket_events() {
        assert!(matches!(
            classify("+QIURC: \"recv\",0"),
            Some(Urc::SocketReadable { id: 0 })
        ));
        assert!(matches!(
            classify("+QIURC: \"closed\",3"),
            Some(Urc::SocketClosed { id: 3 })
        ));
        assert!(matches!(
            classify("+QIURC: \"pdpdeact\",1"),
            Some(Urc::PdpDeactivated)
        ));
    }

    #[test]
    fn dns_events() {
        assert!(matches!(
            classify("+QIURC: \"dnsgip\",0,2,60"),
            Some(Urc::Dns(DnsEvent::Summary { err: 0, count: 2 }))
        ));
        let Some(Urc::Dns(DnsEvent::Ip(ip))) = classify("+QIURC: \"dnsgip\",\"93.184.216.34\"")
        else {
            panic!("expected an address event");
        };
        assert_eq!(ip, "93.184.216.34".parse::<core::net::IpAddr>().unwrap());
    }

    #[test]
    fn registration_routes_through() {
        let Some(Urc::Registration(r)) = classify("+CEREG: 5") else {
            panic!("expected registration");
        };
        assert_eq!(r.status, RegistrationStatus::RegisteredRoaming);
    }

    #[test]
    fn read_header() {
        assert_eq!(data_header("+QIRD: 512").unwrap().len, 512);
        assert!(data_header("+QIRD: 4,4,0").is_none());
        assert!(data_header("+CSQ: 17,99").is_none());
    }

    #[test]
    fn chatter_is_ignored() {
        assert!(matches!(classify("RDY"), Some(Urc::Ignored)));
        assert!(matches!(classify("+QIND: SMS DONE"), Some(Urc::Ignored)));
        assert!(classify("+CSQ: 17,99").is_none());
    }
}
