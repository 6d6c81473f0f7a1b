use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single most-recently-reported address believed reachable at the
/// monitored site. There is at most one; writes overwrite, never append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedAddress {
    pub address: String,
    pub updated_at: DateTime<Utc>,
}

impl TrackedAddress {
    pub fn now(address: impl Into<String>) -> Self {
        Self { address: address.into(), updated_at: Utc::now() }
    }
}

/// Timestamps are persisted as RFC 3339 text so `ORDER BY time DESC`
/// sorts chronologically
pub fn timestamp_to_text(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}

pub fn text_to_timestamp(text: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_text_round_trips() {
        let now = Utc::now();
        let parsed = text_to_timestamp(&timestamp_to_text(now)).unwrap();
        assert_eq!(parsed, now);
    }

    #[test]
    fn timestamp_text_sorts_chronologically() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::seconds(61);
        assert!(timestamp_to_text(earlier) < timestamp_to_text(later));
    }
}
