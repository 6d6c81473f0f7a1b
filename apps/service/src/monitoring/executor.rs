use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

use super::checker::{Checker, HttpChecker, IcmpChecker, TcpChecker};
use super::types::{ProbeMethod, ProbeRecord};
use crate::config::Config;
use crate::database::Database;

/// Runs one probe round: read the tracked address, fan out the probe set,
/// commit the outcomes as a single batch sharing one timestamp.
pub struct ProbeRoundExecutor {
    database: Arc<dyn Database>,
    probes: Vec<(ProbeMethod, Box<dyn Checker>)>,
}

impl ProbeRoundExecutor {
    /// The standard battery: ICMP echo, TCP connect on 80 and 443, and the
    /// HTTP health check
    pub fn standard(database: Arc<dyn Database>, config: &Config) -> Result<Self> {
        let probes: Vec<(ProbeMethod, Box<dyn Checker>)> = vec![
            (
                ProbeMethod::Icmp,
                Box::new(IcmpChecker::new(config.icmp_ping_count, config.icmp_timeout())),
            ),
            (ProbeMethod::Tcp(80), Box::new(TcpChecker::new(80, config.tcp_timeout()))),
            (ProbeMethod::Tcp(443), Box::new(TcpChecker::new(443, config.tcp_timeout()))),
            (
                ProbeMethod::Http,
                Box::new(HttpChecker::new(
                    config.http_check_path.clone(),
                    config.http_timeout(),
                )?),
            ),
        ];

        Ok(Self::with_probes(database, probes))
    }

    /// Build an executor over an arbitrary probe list (used by tests)
    pub fn with_probes(
        database: Arc<dyn Database>,
        probes: Vec<(ProbeMethod, Box<dyn Checker>)>,
    ) -> Self {
        Self { database, probes }
    }

    /// Execute one round, returning the number of records written.
    ///
    /// An unset tracked address is a quiet no-op. A persistence failure is
    /// the one error that propagates; probe failures are ordinary outcomes.
    pub async fn run_round(&self) -> Result<usize> {
        let Some(tracked) = self.database.tracked_address().await? else {
            debug!("no tracked address yet, skipping probe round");
            return Ok(0);
        };

        let time = Utc::now();
        let outcomes = join_all(
            self.probes.iter().map(|(_, checker)| checker.probe(&tracked.address)),
        )
        .await;

        let records: Vec<ProbeRecord> = self
            .probes
            .iter()
            .zip(outcomes)
            .map(|((method, _), outcome)| {
                ProbeRecord::new(tracked.address.clone(), time, *method, outcome)
            })
            .collect();

        self.database.append_round(&records).await?;

        debug!(
            address = %tracked.address,
            records = records.len(),
            "probe round committed"
        );
        Ok(records.len())
    }
}
