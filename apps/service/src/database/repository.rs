use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;

use super::models::{TrackedAddress, text_to_timestamp, timestamp_to_text};
use crate::monitoring::types::ProbeRecord;
use crate::pool::LibsqlPool;

/// Store for the tracked-address singleton and the append-only probe history
#[async_trait]
pub trait Database: Send + Sync {
    /// Read the tracked address, if one has been reported yet
    async fn tracked_address(&self) -> Result<Option<TrackedAddress>>;

    /// Overwrite the tracked-address singleton
    async fn set_tracked_address(&self, address: &str) -> Result<TrackedAddress>;

    /// Append one probe round as a single all-or-nothing batch
    async fn append_round(&self, records: &[ProbeRecord]) -> Result<()>;

    /// Most recent probe records, newest first
    async fn latest_checks(&self, limit: usize) -> Result<Vec<ProbeRecord>>;

    /// The single freshest probe record regardless of method
    async fn most_recent_check(&self) -> Result<Option<ProbeRecord>>;

    /// Delete probe records older than the cutoff, returning the count.
    /// Only used by the opt-in retention cleanup.
    async fn purge_checks_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// LibSQL-backed store
pub struct LibsqlDatabase {
    pool: LibsqlPool,
}

impl LibsqlDatabase {
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> Result<deadpool::managed::Object<crate::pool::LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

fn row_to_record(row: &libsql::Row) -> Result<ProbeRecord> {
    let time_text: String = row.get(1)?;
    let method_text: String = row.get(3)?;

    Ok(ProbeRecord {
        address: row.get(0)?,
        time: text_to_timestamp(&time_text)?,
        reachable: row.get::<i64>(2)? != 0,
        method: method_text.parse()?,
        detail: row.get(4)?,
    })
}

#[async_trait]
impl Database for LibsqlDatabase {
    async fn tracked_address(&self) -> Result<Option<TrackedAddress>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query("SELECT ip, updated_at FROM ip_current WHERE id = 1", ())
            .await?;

        if let Some(row) = rows.next().await? {
            let updated_at: String = row.get(1)?;
            Ok(Some(TrackedAddress {
                address: row.get(0)?,
                updated_at: text_to_timestamp(&updated_at)?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn set_tracked_address(&self, address: &str) -> Result<TrackedAddress> {
        let conn = self.get_conn().await?;
        let tracked = TrackedAddress::now(address);

        conn.execute(
            "INSERT OR REPLACE INTO ip_current (id, ip, updated_at) VALUES (1, ?, ?)",
            params![tracked.address.clone(), timestamp_to_text(tracked.updated_at)],
        )
        .await?;

        Ok(tracked)
    }

    async fn append_round(&self, records: &[ProbeRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        for record in records {
            tx.execute(
                "INSERT INTO checks (ip, time, reachable, method, detail) VALUES (?, ?, ?, ?, ?)",
                params![
                    record.address.clone(),
                    timestamp_to_text(record.time),
                    record.reachable as i64,
                    record.method.to_string(),
                    record.detail.clone()
                ],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn latest_checks(&self, limit: usize) -> Result<Vec<ProbeRecord>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(
                "SELECT ip, time, reachable, method, detail FROM checks ORDER BY time DESC LIMIT ?",
            )
            .await?;

        let mut rows = stmt.query(params![limit as i64]).await?;
        let mut records = Vec::new();

        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }

        Ok(records)
    }

    async fn most_recent_check(&self) -> Result<Option<ProbeRecord>> {
        Ok(self.latest_checks(1).await?.into_iter().next())
    }

    async fn purge_checks_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM checks WHERE time < ?",
                params![timestamp_to_text(cutoff)],
            )
            .await?;

        Ok(deleted)
    }
}
