//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings object for the supervisory
//! core. Config is consumed in two ways:
//!
//! 1. **Orchestrator construction**: `OrchestratorBuilder::new(config)`
//! 2. **Direct tracker construction**: each monitor takes the fields it needs
//!
//! All cadences are plain [`Duration`]s; every wait derived from them
//! observes the runtime cancellation token, so shutdown never has to sit out
//! a full interval.

use std::time::Duration;

use crate::policies::{RetentionPolicy, RetryPolicy, TierSchedule};

/// Global configuration for the supervisory core.
///
/// Groups:
/// - **Poll cadences**: one interval per monitor loop
/// - **Idle restart**: threshold and post-stop settle delay
/// - **Health thresholds**: latency, long-uptime and cycle budgets
/// - **Backups**: creation/cleanup intervals, retention policy, tier schedule
/// - **Shutdown**: grace period for stopping the monitor tasks
#[derive(Clone, Debug)]
pub struct Config {
    /// Interval between presence polls (player-list snapshots).
    pub presence_interval: Duration,

    /// Interval between fast process-status checks.
    pub status_interval: Duration,

    /// Interval between slow deep health checks. Fires only while the
    /// process is running.
    pub health_interval: Duration,

    /// Interval between idle-timer evaluations.
    pub idle_check_interval: Duration,

    /// Continuous zero-player duration after which an automatic restart is
    /// triggered.
    pub idle_threshold: Duration,

    /// Wait between the stop and start steps of the idle-restart workflow,
    /// giving the process time to release its resources.
    pub restart_settle: Duration,

    /// Interval between scheduled backup-creation ticks.
    pub backup_interval: Duration,

    /// Interval between retention-cleanup passes. Deliberately longer than
    /// [`Config::backup_interval`]; the two activities are independently
    /// scheduled.
    pub cleanup_interval: Duration,

    /// Maximum time to wait for monitor tasks to stop during shutdown before
    /// abandoning them.
    pub grace: Duration,

    /// Retry budget and backoff base for presence polls.
    pub retry: RetryPolicy,

    /// Retention policy applied by every cleanup pass.
    pub retention: RetentionPolicy,

    /// Calendar rules classifying each backup tick into a tier.
    pub schedule: TierSchedule,

    /// Facade latency above which the health check reports a slow response.
    pub slow_response: Duration,

    /// Uptime beyond which an empty server is reported as a health issue.
    pub long_uptime: Duration,

    /// Budget for one full status poll; exceeding it raises a
    /// performance-issue event.
    pub cycle_budget: Duration,
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `presence_interval = 10s`, `status_interval = 30s`,
    ///   `health_interval = 300s`, `idle_check_interval = 30s`
    /// - `idle_threshold = 30min`, `restart_settle = 5s`
    /// - `backup_interval = 1h`, `cleanup_interval = 6h`
    /// - `grace = 30s`
    /// - `slow_response = 5s`, `long_uptime = 1h`, `cycle_budget = 1s`
    fn default() -> Self {
        Self {
            presence_interval: Duration::from_secs(10),
            status_interval: Duration::from_secs(30),
            health_interval: Duration::from_secs(300),
            idle_check_interval: Duration::from_secs(30),
            idle_threshold: Duration::from_secs(30 * 60),
            restart_settle: Duration::from_secs(5),
            backup_interval: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(6 * 3600),
            grace: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            retention: RetentionPolicy::default(),
            schedule: TierSchedule::default(),
            slow_response: Duration::from_secs(5),
            long_uptime: Duration::from_secs(3600),
            cycle_budget: Duration::from_secs(1),
        }
    }
}
