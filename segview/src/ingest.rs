use std::fmt;
use std::io::{self, BufRead};

use segview_common::PacketInfo;
use serde_json::Value;

use crate::validate::{validate, ValidationErrors};

/// Accumulates validated packet records from a JSONL capture log.
///
/// A bad line never poisons the rest of the log: it is recorded with its
/// line number and ingestion moves on.
#[derive(Debug, Default)]
pub struct Ingest {
    records: Vec<PacketInfo>,
    rejected: Vec<RejectedLine>,
    lines: usize,
}

#[derive(Debug)]
pub struct RejectedLine {
    /// 1-based line number in the source log. Blank lines count.
    pub line: usize,
    pub reason: RejectReason,
}

#[derive(Debug)]
pub enum RejectReason {
    Json(String),
    Invalid(ValidationErrors),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Json(e) => write!(f, "invalid json ({e})"),
            RejectReason::Invalid(errs) => write!(f, "{errs}"),
        }
    }
}

impl Ingest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut ingest = Self::new();
        for line in reader.lines() {
            ingest.push_line(&line?);
        }
        Ok(ingest)
    }

    pub fn push_line(&mut self, raw: &str) {
        self.lines += 1;
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }

        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                self.rejected.push(RejectedLine {
                    line: self.lines,
                    reason: RejectReason::Json(e.to_string()),
                });
                return;
            }
        };
        match validate(&value) {
            Ok(pkt) => self.records.push(pkt),
            Err(errs) => self.rejected.push(RejectedLine {
                line: self.lines,
                reason: RejectReason::Invalid(errs),
            }),
        }
    }

    pub fn records(&self) -> &[PacketInfo] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PacketInfo> {
        self.records
    }

    pub fn rejected(&self) -> &[RejectedLine] {
        &self.rejected
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::{Ingest, RejectReason};

    #[test]
    fn test_ingest_log() {
        let log = r#"{"listener_ip":"10.0.0.1","network_tag":"seg-a","source_ip":"192.168.1.5","source_port":443,"target_port":51000,"protocol":"tcp","flags":["SYN"],"timestamp":"2024-01-01T00:00:00Z"}

{"listener_ip":"10.0.0.1","network_tag":"seg-a","source_ip":"192.168.1.5","source_port":70000,"target_port":53,"protocol":"udp","flags":[],"timestamp":"2024-01-01T00:00:01Z"}
not json at all
{"listener_ip":"10.0.0.2","network_tag":"seg-b","source_ip":"192.168.1.6","source_port":40000,"target_port":22,"protocol":"udp","flags":[],"timestamp":"2024-01-01T00:00:02Z"}
"#;

        let ingest = Ingest::from_reader(Cursor::new(log)).unwrap();
        assert_eq!(ingest.lines(), 5);
        assert_eq!(ingest.records().len(), 2);
        assert_eq!(ingest.records()[1].network_tag, "seg-b");
        assert!(!ingest.is_clean());

        // Line numbers are 1-based and count the blank line.
        let rejected = ingest.rejected();
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].line, 3);
        assert!(matches!(rejected[0].reason, RejectReason::Invalid(_)));
        assert_eq!(rejected[1].line, 4);
        assert!(matches!(rejected[1].reason, RejectReason::Json(_)));
    }

    #[test]
    fn test_empty_log_is_clean() {
        let ingest = Ingest::from_reader(Cursor::new("\n\n")).unwrap();
        assert!(ingest.is_clean());
        assert_eq!(ingest.lines(), 2);
        assert!(ingest.records().is_empty());
    }
}
