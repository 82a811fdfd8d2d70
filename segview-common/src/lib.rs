use std::{fmt, net::Ipv4Addr, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One packet observed by a scan listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketInfo {
    pub listener_ip: Ipv4Addr,
    pub network_tag: String,
    pub source_ip: Ipv4Addr,
    pub source_port: u16,
    pub target_port: u16,
    pub protocol: Protocol,
    pub flags: Vec<String>,
    pub timestamp: String,
}

impl PacketInfo {
    /// Listeners stamp records with RFC 3339 UTC text. The contract keeps
    /// the timestamp opaque, so this parse is best-effort.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl fmt::Display for PacketInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = match self.timestamp_utc() {
            Some(dt) => dt.format("[%Y-%m-%d %H:%M:%S]").to_string(),
            None => self.timestamp.clone(),
        };
        write!(
            f,
            "* {:<22}{:<10}{:<23} ->    {:<24}{:<7}flags={}",
            ts,
            self.network_tag,
            format!("{}:{}", self.source_ip, self.source_port),
            format!("{}:{}", self.listener_ip, self.target_port),
            self.protocol.to_string(),
            self.flags.join(","),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseProtocolError;

impl fmt::Display for ParseProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown protocol, expected 'tcp' or 'udp'")
    }
}

impl std::error::Error for ParseProtocolError {}

impl FromStr for Protocol {
    type Err = ParseProtocolError;

    // Matches the wire tokens exactly, "TCP" is not a protocol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(ParseProtocolError),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{PacketInfo, Protocol};

    fn sample() -> PacketInfo {
        PacketInfo {
            listener_ip: "10.0.0.1".parse().unwrap(),
            network_tag: "seg-a".to_string(),
            source_ip: "192.168.1.5".parse().unwrap(),
            source_port: 443,
            target_port: 51000,
            protocol: Protocol::Tcp,
            flags: vec!["SYN".to_string()],
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_protocol_tokens() {
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("udp".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!("TCP".parse::<Protocol>().is_err());
        assert!("icmp".parse::<Protocol>().is_err());
        assert_eq!(Protocol::Udp.to_string(), "udp");
    }

    #[test]
    fn test_protocol_serde_round_trip() {
        let json = serde_json::to_string(&Protocol::Tcp).unwrap();
        assert_eq!(json, "\"tcp\"");
        let back: Protocol = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Protocol::Tcp);
        assert!(serde_json::from_str::<Protocol>("\"TCP\"").is_err());
    }

    #[test]
    fn test_timestamp_parse() {
        let pkt = sample();
        let dt = pkt.timestamp_utc().unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-01 00:00:00");

        let mut pkt = sample();
        pkt.timestamp = "yesterday".to_string();
        assert!(pkt.timestamp_utc().is_none());
    }

    #[test]
    fn test_display_line() {
        let line = sample().to_string();
        assert!(line.contains("192.168.1.5:443"));
        assert!(line.contains("10.0.0.1:51000"));
        assert!(line.contains("flags=SYN"));
    }
}
