//! Log-hygiene helpers for audit records.
//!
//! Lengths are counted in chars so multi-byte input never splits a code point.

pub const MAX_FIELD_LENGTH: usize = 256;
const ELLIPSIS: &str = "...";

/// IPv4: last octet masked (`192.168.1.XXX`). IPv6: last two hextets replaced,
/// keeping the colon before them (`…:8a2e:::XXX`).
pub fn ip_address(ip: Option<&str>) -> String {
    let ip = match ip {
        Some(ip) if !ip.is_empty() => ip,
        _ => return "unknown_ip".to_string(),
    };

    if let Some(last_dot) = ip.rfind('.') {
        return format!("{}XXX", &ip[..=last_dot]);
    }

    if let Some(last_colon) = ip.rfind(':') {
        return match ip[..last_colon].rfind(':') {
            Some(second_last) => format!("{}::XXX", &ip[..=second_last]),
            None => format!("{ip}:XXX"),
        };
    }

    ip.to_string()
}

pub fn user_agent(user_agent: Option<&str>) -> String {
    match user_agent {
        Some(ua) if !ua.is_empty() => truncate(ua),
        _ => "n/a".to_string(),
    }
}

/// Escapes CR/LF (log injection) and truncates.
pub fn exception_message(message: Option<&str>) -> String {
    match message {
        Some(msg) if !msg.is_empty() => truncate(&msg.replace('\n', "\\n").replace('\r', "\\r")),
        _ => "n/a".to_string(),
    }
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_FIELD_LENGTH {
        return value.to_string();
    }
    let mut out: String = value
        .chars()
        .take(MAX_FIELD_LENGTH - ELLIPSIS.len())
        .collect();
    out.push_str(ELLIPSIS);
    out
}
