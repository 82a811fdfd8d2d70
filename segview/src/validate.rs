use std::fmt;

use segview_common::{PacketInfo, Protocol};
use serde::Serialize;
use serde_json::{Map, Value};

/// A single field-level failure: the path that broke and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub reason: String,
}

impl Violation {
    fn new<P, R>(path: P, reason: R) -> Self
    where
        P: Into<String>,
        R: Into<String>,
    {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

/// Every violation found in one input, in field order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<Violation>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for v in &self.0 {
            write!(f, "{sep}{v}")?;
            sep = "; ";
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Checks an arbitrary JSON value against the packet record contract.
///
/// Collects every violation instead of stopping at the first one, so a
/// rejected line can be reported in full. Unknown keys on the input are
/// dropped, not rejected. Never panics on malformed input.
pub fn validate(input: &Value) -> Result<PacketInfo, ValidationErrors> {
    let Some(obj) = input.as_object() else {
        return Err(ValidationErrors(vec![Violation::new(
            "",
            "expected an object",
        )]));
    };

    let mut violations = Vec::new();
    let listener_ip = ipv4_field(obj, "listener_ip", &mut violations);
    let network_tag = string_field(obj, "network_tag", &mut violations);
    let source_ip = ipv4_field(obj, "source_ip", &mut violations);
    let source_port = port_field(obj, "source_port", &mut violations);
    let target_port = port_field(obj, "target_port", &mut violations);
    let protocol = protocol_field(obj, "protocol", &mut violations);
    let flags = flags_field(obj, "flags", &mut violations);
    let timestamp = string_field(obj, "timestamp", &mut violations);

    match (
        listener_ip,
        network_tag,
        source_ip,
        source_port,
        target_port,
        protocol,
        flags,
        timestamp,
    ) {
        (
            Some(listener_ip),
            Some(network_tag),
            Some(source_ip),
            Some(source_port),
            Some(target_port),
            Some(protocol),
            Some(flags),
            Some(timestamp),
        ) => Ok(PacketInfo {
            listener_ip,
            network_tag,
            source_ip,
            source_port,
            target_port,
            protocol,
            flags,
            timestamp,
        }),
        _ => Err(ValidationErrors(violations)),
    }
}

fn field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<&'a Value> {
    let value = obj.get(key);
    if value.is_none() {
        violations.push(Violation::new(key, "required field is missing"));
    }
    value
}

fn string_field(
    obj: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    let value = field(obj, key, violations)?;
    match value.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            violations.push(Violation::new(key, "expected a string"));
            None
        }
    }
}

fn ipv4_field(
    obj: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<std::net::Ipv4Addr> {
    let value = field(obj, key, violations)?;
    let Some(s) = value.as_str() else {
        violations.push(Violation::new(key, "expected a string"));
        return None;
    };
    match s.parse() {
        Ok(ip) => Some(ip),
        Err(_) => {
            violations.push(Violation::new(key, "not a valid IPv4 address"));
            None
        }
    }
}

fn port_field(obj: &Map<String, Value>, key: &str, violations: &mut Vec<Violation>) -> Option<u16> {
    let value = field(obj, key, violations)?;
    if !value.is_number() {
        violations.push(Violation::new(key, "expected an integer"));
        return None;
    }

    // A JSON number with a zero fractional part still counts as integral.
    let n = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0)
            .map(|f| f as u64)
    });
    match n {
        Some(n) if n <= u64::from(u16::MAX) => Some(n as u16),
        _ => {
            violations.push(Violation::new(key, "expected integer between 0 and 65535"));
            None
        }
    }
}

fn protocol_field(
    obj: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<Protocol> {
    let value = field(obj, key, violations)?;
    let Some(s) = value.as_str() else {
        violations.push(Violation::new(key, "expected a string"));
        return None;
    };
    match s.parse() {
        Ok(proto) => Some(proto),
        Err(_) => {
            violations.push(Violation::new(key, "not one of tcp/udp"));
            None
        }
    }
}

fn flags_field(
    obj: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<Vec<String>> {
    let value = field(obj, key, violations)?;
    let Some(items) = value.as_array() else {
        violations.push(Violation::new(key, "expected an array"));
        return None;
    };

    let mut flags = Vec::with_capacity(items.len());
    let mut ok = true;
    for (idx, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) => flags.push(s.to_string()),
            None => {
                violations.push(Violation::new(format!("{key}[{idx}]"), "expected a string"));
                ok = false;
            }
        }
    }
    ok.then_some(flags)
}
