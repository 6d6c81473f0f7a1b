//! Opt-in cleanup of old probe records.
//!
//! The source design keeps the `checks` log forever; that stays the default
//! (`CHECK_RETENTION_DAYS=0`). A positive retention window enables an hourly
//! background purge of records older than the window.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::Database;

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// Days of probe history to keep; 0 means unbounded
    pub check_days: i64,
}

impl RetentionPolicy {
    pub fn enabled(&self) -> bool {
        self.check_days > 0
    }
}

pub struct RetentionCleanup {
    database: Arc<dyn Database>,
    policy: RetentionPolicy,
}

impl RetentionCleanup {
    pub fn new(database: Arc<dyn Database>, policy: RetentionPolicy) -> Self {
        Self { database, policy }
    }

    /// Delete probe records older than the retention window
    pub async fn cleanup_expired_checks(&self) -> Result<u64> {
        if !self.policy.enabled() {
            return Ok(0);
        }

        let cutoff = chrono::Utc::now() - chrono::Duration::days(self.policy.check_days);
        let deleted = self.database.purge_checks_before(cutoff).await?;

        if deleted > 0 {
            info!(deleted, days = self.policy.check_days, "retention cleanup purged old checks");
        }
        Ok(deleted)
    }

    /// Start the hourly cleanup task
    pub fn start_periodic_cleanup(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(std::time::Duration::from_secs(3600));

            loop {
                timer.tick().await;

                if let Err(e) = self.cleanup_expired_checks().await {
                    warn!("retention cleanup failed: {e:#}");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::tests::{create_test_database, record_at};
    use crate::monitoring::types::ProbeMethod;
    use chrono::Utc;

    #[test]
    fn zero_days_disables_retention() {
        assert!(!RetentionPolicy { check_days: 0 }.enabled());
        assert!(RetentionPolicy { check_days: 30 }.enabled());
    }

    #[tokio::test]
    async fn disabled_policy_deletes_nothing() -> Result<()> {
        let (db, _dir) = create_test_database().await?;
        let ancient = Utc::now() - chrono::Duration::days(365);
        db.append_round(&[record_at("203.0.113.5", ancient, ProbeMethod::Icmp, true)])
            .await?;

        let cleanup = RetentionCleanup::new(db.clone(), RetentionPolicy { check_days: 0 });
        assert_eq!(cleanup.cleanup_expired_checks().await?, 0);
        assert_eq!(db.latest_checks(10).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn expired_checks_are_purged() -> Result<()> {
        let (db, _dir) = create_test_database().await?;

        let expired = Utc::now() - chrono::Duration::days(31);
        let fresh = Utc::now();
        db.append_round(&[
            record_at("203.0.113.5", expired, ProbeMethod::Icmp, true),
            record_at("203.0.113.5", fresh, ProbeMethod::Icmp, true),
        ])
        .await?;

        let cleanup = RetentionCleanup::new(db.clone(), RetentionPolicy { check_days: 30 });
        assert_eq!(cleanup.cleanup_expired_checks().await?, 1);

        let remaining = db.latest_checks(10).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].time, fresh);
        Ok(())
    }
}
