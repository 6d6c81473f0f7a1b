use anyhow::Result;
use serde::Serialize;

use super::types::ProbeRecord;
use crate::database::Database;
use crate::database::models::TrackedAddress;

/// Derived view of the tracked address and the single freshest probe
/// record. Never stored; computed fresh on each query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub tracked: Option<TrackedAddress>,
    pub last_check: Option<ProbeRecord>,
}

/// Current status: the tracked address (if any) plus the most recent probe
/// record regardless of method. Deliberately not an aggregated verdict over
/// the four methods of the latest round; callers wanting that fetch
/// `latest_checks(4)` and inspect the records sharing the newest timestamp.
pub async fn snapshot(database: &dyn Database) -> Result<StatusSnapshot> {
    Ok(StatusSnapshot {
        tracked: database.tracked_address().await?,
        last_check: database.most_recent_check().await?,
    })
}
