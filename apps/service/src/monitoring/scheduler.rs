use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use super::executor::ProbeRoundExecutor;

/// Fires probe rounds on a fixed interval.
///
/// One owned background task, started and stopped explicitly. The first
/// round runs immediately; rounds are serialized because the loop awaits
/// each one, and a skipped tick just waits for the next boundary instead of
/// catching up. A failed round is logged and never stops the schedule.
pub struct ProbeScheduler {
    executor: Arc<ProbeRoundExecutor>,
    period: Duration,
}

pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl ProbeScheduler {
    pub fn new(executor: Arc<ProbeRoundExecutor>, period: Duration) -> Self {
        Self { executor, period }
    }

    pub fn start(self) -> SchedulerHandle {
        let (shutdown, mut signal) = watch::channel(false);
        let executor = self.executor;
        let period = self.period;

        let task = tokio::spawn(async move {
            info!(period_seconds = period.as_secs_f64(), "probe scheduler started");
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if let Err(e) = executor.run_round().await {
                            error!("probe round failed: {e:#}");
                        }
                    }
                    _ = signal.changed() => break,
                }
            }
            info!("probe scheduler stopped");
        });

        SchedulerHandle { shutdown, task }
    }
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the loop to exit. An in-flight round
    /// finishes first; its batch commit is atomic either way.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::database::models::TrackedAddress;
    use crate::database::repository::tests::create_test_database;
    use crate::monitoring::checker::Checker;
    use crate::monitoring::types::{ProbeMethod, ProbeOutcome, ProbeRecord};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysUp;

    #[async_trait]
    impl Checker for AlwaysUp {
        async fn probe(&self, _target: &str) -> ProbeOutcome {
            ProbeOutcome::up("ok")
        }
    }

    fn stub_probes() -> Vec<(ProbeMethod, Box<dyn Checker>)> {
        vec![
            (ProbeMethod::Icmp, Box::new(AlwaysUp)),
            (ProbeMethod::Tcp(80), Box::new(AlwaysUp)),
            (ProbeMethod::Tcp(443), Box::new(AlwaysUp)),
            (ProbeMethod::Http, Box::new(AlwaysUp)),
        ]
    }

    struct BrokenStore {
        rounds_attempted: AtomicUsize,
    }

    #[async_trait]
    impl Database for BrokenStore {
        async fn tracked_address(&self) -> Result<Option<TrackedAddress>> {
            Ok(Some(TrackedAddress::now("203.0.113.5")))
        }

        async fn set_tracked_address(&self, _address: &str) -> Result<TrackedAddress> {
            unimplemented!("not exercised")
        }

        async fn append_round(&self, _records: &[ProbeRecord]) -> Result<()> {
            self.rounds_attempted.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("store unavailable"))
        }

        async fn latest_checks(&self, _limit: usize) -> Result<Vec<ProbeRecord>> {
            Ok(Vec::new())
        }

        async fn most_recent_check(&self) -> Result<Option<ProbeRecord>> {
            Ok(None)
        }

        async fn purge_checks_before(&self, _cutoff: DateTime<Utc>) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn scheduler_runs_rounds_until_stopped() -> Result<()> {
        let (db, _dir) = create_test_database().await?;
        db.set_tracked_address("203.0.113.5").await?;

        let executor = Arc::new(ProbeRoundExecutor::with_probes(db.clone(), stub_probes()));
        let handle = ProbeScheduler::new(executor, Duration::from_millis(50)).start();

        tokio::time::sleep(Duration::from_millis(320)).await;
        handle.stop().await;

        let checks = db.latest_checks(200).await?;
        // First round fires immediately, then roughly every 50ms
        assert!(checks.len() >= 8, "expected at least two rounds, got {}", checks.len());
        assert_eq!(checks.len() % 4, 0);

        // No further rounds after stop
        let frozen = checks.len();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(db.latest_checks(200).await?.len(), frozen);
        Ok(())
    }

    #[tokio::test]
    async fn failing_rounds_do_not_kill_the_schedule() {
        let db = Arc::new(BrokenStore { rounds_attempted: AtomicUsize::new(0) });
        let executor = Arc::new(ProbeRoundExecutor::with_probes(db.clone(), stub_probes()));
        let handle = ProbeScheduler::new(executor, Duration::from_millis(50)).start();

        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.stop().await;

        // Every round failed, yet ticks kept coming
        assert!(db.rounds_attempted.load(Ordering::SeqCst) >= 2);
    }
}
