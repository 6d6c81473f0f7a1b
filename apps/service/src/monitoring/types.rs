use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of a probe detail string, in characters.
pub const DETAIL_MAX_CHARS: usize = 2000;

/// Probe method identifying which layer a check exercised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeMethod {
    Icmp,
    Tcp(u16),
    Http,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMethod::Icmp => write!(f, "icmp"),
            ProbeMethod::Tcp(port) => write!(f, "tcp:{}", port),
            ProbeMethod::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown probe method: {0}")]
pub struct ParseMethodError(String);

impl FromStr for ProbeMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "icmp" => Ok(ProbeMethod::Icmp),
            "http" => Ok(ProbeMethod::Http),
            other => match other.strip_prefix("tcp:") {
                Some(port) => port
                    .parse::<u16>()
                    .map(ProbeMethod::Tcp)
                    .map_err(|_| ParseMethodError(s.to_string())),
                None => Err(ParseMethodError(s.to_string())),
            },
        }
    }
}

impl Serialize for ProbeMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProbeMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Outcome of a single probe. Probes never fail with an error; every
/// network, DNS, or protocol problem is folded into `(false, detail)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub reachable: bool,
    pub detail: String,
}

impl ProbeOutcome {
    pub fn up(detail: impl Into<String>) -> Self {
        Self { reachable: true, detail: truncate_detail(&detail.into()) }
    }

    pub fn down(detail: impl Into<String>) -> Self {
        Self { reachable: false, detail: truncate_detail(&detail.into()) }
    }
}

/// One immutable probe outcome, as persisted in the `checks` log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    #[serde(rename = "ip")]
    pub address: String,
    pub time: DateTime<Utc>,
    pub reachable: bool,
    pub method: ProbeMethod,
    pub detail: String,
}

impl ProbeRecord {
    pub fn new(
        address: String,
        time: DateTime<Utc>,
        method: ProbeMethod,
        outcome: ProbeOutcome,
    ) -> Self {
        Self { address, time, reachable: outcome.reachable, method, detail: outcome.detail }
    }
}

/// Bound a detail string to [`DETAIL_MAX_CHARS`] characters, respecting
/// char boundaries
pub fn truncate_detail(detail: &str) -> String {
    match detail.char_indices().nth(DETAIL_MAX_CHARS) {
        Some((idx, _)) => detail[..idx].to_string(),
        None => detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_strings_round_trip() {
        for method in [
            ProbeMethod::Icmp,
            ProbeMethod::Tcp(80),
            ProbeMethod::Tcp(443),
            ProbeMethod::Http,
        ] {
            let parsed: ProbeMethod = method.to_string().parse().unwrap();
            assert_eq!(parsed, method);
        }
        assert_eq!(ProbeMethod::Tcp(80).to_string(), "tcp:80");
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert!("udp:53".parse::<ProbeMethod>().is_err());
        assert!("tcp:notaport".parse::<ProbeMethod>().is_err());
        assert!("".parse::<ProbeMethod>().is_err());
    }

    #[test]
    fn detail_is_bounded() {
        let long = "x".repeat(DETAIL_MAX_CHARS * 3);
        let outcome = ProbeOutcome::down(long);
        assert_eq!(outcome.detail.chars().count(), DETAIL_MAX_CHARS);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(DETAIL_MAX_CHARS + 5);
        let truncated = truncate_detail(&long);
        assert_eq!(truncated.chars().count(), DETAIL_MAX_CHARS);
    }

    #[test]
    fn short_detail_is_untouched() {
        let outcome = ProbeOutcome::up("status:200");
        assert!(outcome.reachable);
        assert_eq!(outcome.detail, "status:200");
    }
}
