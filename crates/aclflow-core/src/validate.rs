// ── Field validators ──
//
// Pure functions over raw field text. They never fail: every outcome is a
// `Verdict`. The backend runs the same grammars, so messages must stay
// stable.

use serde::Serialize;

use crate::model::{AclRequestRow, FieldErrors, RowField};

/// Outcome of validating one field. `error` is empty when valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub valid: bool,
    pub error: String,
}

impl Verdict {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: String::new(),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: error.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl From<Result<(), String>> for Verdict {
    fn from(r: Result<(), String>) -> Self {
        match r {
            Ok(()) => Self::ok(),
            Err(e) => Self::fail(e),
        }
    }
}

/// Outcome of the composite row check. Every failing field is reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestVerdict {
    pub valid: bool,
    pub errors: FieldErrors,
}

// ── Shared helpers ───────────────────────────────────────────────────

fn is_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// A run of ASCII digits as a number. Values past `u64` saturate, and the
/// text form drops leading zeros.
fn number(digits: &str) -> (u64, String) {
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    let trimmed = digits.trim_start_matches('0');
    let text = if trimmed.is_empty() { "0" } else { trimmed };
    (value, text.to_owned())
}

// ── IP / CIDR / list ─────────────────────────────────────────────────

const IP_SENTINELS: [&str; 4] = ["any", "all", "subnet", "0.0.0.0"];

fn is_dotted_quad(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 4 && parts.iter().all(|p| is_digits(p, 1, 3))
}

fn check_octets(ip: &str) -> Result<(), String> {
    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(format!("IP must have 4 octets, found {}", octets.len()));
    }

    for (i, octet) in octets.iter().enumerate() {
        let pos = i + 1;
        match octet.parse::<u32>() {
            Ok(n) if n <= 255 => {}
            _ => return Err(format!("Octet {pos} must be 0-255, got {octet}")),
        }
        if octet.len() > 1 && octet.starts_with('0') {
            return Err(format!("Octet {pos} has leading zero: {octet}"));
        }
    }
    Ok(())
}

fn check_single_ip(token: &str) -> Result<(), String> {
    let token = token.trim().to_lowercase();
    if token.is_empty() {
        return Err("IP address is required".into());
    }
    if IP_SENTINELS.contains(&token.as_str()) {
        return Ok(());
    }

    if let Some((addr, prefix)) = token.split_once('/') {
        if is_dotted_quad(addr) && is_digits(prefix, 1, 2) {
            let (prefix, text) = number(prefix);
            if prefix > 32 {
                return Err(format!("CIDR prefix must be 0-32, got {text}"));
            }
            return check_octets(addr);
        }
    } else if is_dotted_quad(&token) {
        return check_octets(&token);
    }

    Err("Invalid IP format. Use: x.x.x.x or x.x.x.x/prefix".into())
}

/// Validate an address, CIDR block, sentinel, or a comma-separated list of
/// them. The first failing token is named in the error.
pub fn validate_ip(value: &str) -> Verdict {
    if value.trim().is_empty() {
        return Verdict::fail("IP address is required");
    }

    for part in value.split(',') {
        if let Err(e) = check_single_ip(part) {
            return Verdict::fail(format!("{e} in '{}'", part.trim()));
        }
    }
    Verdict::ok()
}

// ── Service / port ───────────────────────────────────────────────────

/// Service names accepted as-is.
pub const KNOWN_SERVICES: [&str; 30] = [
    "http", "https", "ssh", "ftp", "ftps", "sftp", "smtp", "smtps", "pop3", "pop3s", "imap",
    "imaps", "dns", "dhcp", "snmp", "ldap", "ldaps", "telnet", "rdp", "vnc", "nfs", "smb", "mysql",
    "postgres", "mongodb", "redis", "kerberos", "ntp", "syslog", "rsync",
];

/// Bare protocols accepted without a port.
pub const PROTOCOL_ONLY: [&str; 5] = ["icmp", "ip", "gre", "esp", "ah"];

fn check_port(n: u64, text: &str, token: &str) -> Result<(), String> {
    if (1..=65535).contains(&n) {
        Ok(())
    } else {
        Err(format!("Port must be 1-65535, got {text} in '{token}'"))
    }
}

fn check_service_token(token: &str) -> Result<(), String> {
    if KNOWN_SERVICES.contains(&token) || PROTOCOL_ONLY.contains(&token) {
        return Ok(());
    }

    let proto_port = token.split_once('/').filter(|(proto, num)| {
        matches!(*proto, "tcp" | "udp" | "icmp") && is_digits(num, 1, usize::MAX)
    });
    if let Some((proto, num)) = proto_port {
        let (n, text) = number(num);
        if proto == "icmp" {
            if n > 255 {
                return Err(format!("ICMP type must be 0-255, got {text} in '{token}'"));
            }
            return Ok(());
        }
        return check_port(n, &text, token);
    }

    if is_digits(token, 1, usize::MAX) {
        let (n, text) = number(token);
        return check_port(n, &text, token);
    }

    let range = token.split_once('-').filter(|(start, end)| {
        is_digits(start, 1, usize::MAX) && is_digits(end, 1, usize::MAX)
    });
    if let Some((start, end)) = range {
        let (s, s_text) = number(start);
        let (e, e_text) = number(end);
        if !(1..=65535).contains(&s) {
            return Err(format!("Start port must be 1-65535, got {s_text}"));
        }
        if !(1..=65535).contains(&e) {
            return Err(format!("End port must be 1-65535, got {e_text}"));
        }
        if s > e {
            return Err(format!("Start port ({s_text}) > end port ({e_text})"));
        }
        return Ok(());
    }

    Err(format!(
        "Invalid format: '{token}'. Use: port, range, protocol/port, or service name"
    ))
}

/// Validate a comma-separated list of service tokens.
pub fn validate_service(value: &str) -> Verdict {
    if value.trim().is_empty() {
        return Verdict::fail("Service is required");
    }

    value
        .split(',')
        .map(|part| part.trim().to_lowercase())
        .try_for_each(|token| check_service_token(&token))
        .into()
}

// ── Description ──────────────────────────────────────────────────────

pub const DESCRIPTION_MAX_CHARS: usize = 500;

const FORBIDDEN_CHARS: [char; 4] = ['<', '>', '|', '\0'];

/// Validate free-text justification: required, at most 500 characters
/// after trimming, and free of `<`, `>`, `|`, and NUL.
pub fn validate_description(value: &str) -> Verdict {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Verdict::fail("Description is required");
    }

    let len = trimmed.chars().count();
    if len > DESCRIPTION_MAX_CHARS {
        return Verdict::fail(format!(
            "Too long ({len} chars). Maximum {DESCRIPTION_MAX_CHARS} characters"
        ));
    }

    if let Some(c) = FORBIDDEN_CHARS.iter().find(|c| trimmed.contains(**c)) {
        let shown = if *c == '\0' { "\\0".to_owned() } else { c.to_string() };
        return Verdict::fail(format!("Contains forbidden character: '{shown}'"));
    }
    Verdict::ok()
}

// ── Composite ────────────────────────────────────────────────────────

/// The grammar check for one field, if that field has one.
pub fn validate_field(field: RowField, value: &str) -> Option<Verdict> {
    match field {
        RowField::SourceIp | RowField::DestinationIp => Some(validate_ip(value)),
        RowField::Service => Some(validate_service(value)),
        RowField::Description => Some(validate_description(value)),
        _ => None,
    }
}

/// Run every field validator over a row and collect all failures.
pub fn validate_acl_request(row: &AclRequestRow) -> RequestVerdict {
    let checks = [
        (RowField::SourceIp, validate_ip(&row.source_ip)),
        (RowField::DestinationIp, validate_ip(&row.destination_ip)),
        (RowField::Service, validate_service(&row.service)),
        (RowField::Description, validate_description(&row.description)),
    ];

    let errors: FieldErrors = checks
        .into_iter()
        .filter(|(_, v)| !v.valid)
        .map(|(field, v)| (field.to_string(), v.error))
        .collect();

    RequestVerdict {
        valid: errors.is_empty(),
        errors,
    }
}
