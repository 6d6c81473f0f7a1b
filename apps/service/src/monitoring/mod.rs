/// Probe engine
///
/// Everything between the scheduler tick and the history commit lives here:
/// - the probe set (ICMP echo, TCP connect, HTTP health)
/// - the round executor that fans probes out and commits one batch
/// - the interval scheduler with an owned start/stop lifecycle
/// - the status deriver
pub mod checker;
pub mod executor;
pub mod scheduler;
pub mod status;
pub mod types;

pub use executor::ProbeRoundExecutor;
pub use scheduler::{ProbeScheduler, SchedulerHandle};
pub use status::StatusSnapshot;
pub use types::{ProbeMethod, ProbeOutcome, ProbeRecord};
