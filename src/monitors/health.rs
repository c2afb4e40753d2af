//! # ProcessHealthTracker: run-state transitions and deep health checks.
//!
//! One tracker, two independently scheduled loops:
//!
//! - **Status cycle** (fast): rebuilds [`ProcessStatus`] from the process
//!   controller plus a best-effort player count, compares it against the
//!   previous observation and dispatches [`StatusChange`] transitions.
//! - **Health cycle** (slow): only while the process is running, times the
//!   deep info query and batches every detected issue into a single
//!   [`Event::HealthWarning`]. Advisory only — it never stops or restarts
//!   the process; that authority belongs to the idle supervisor.
//!
//! ## Transition rules
//! ```text
//! running false → true                     StatusChange::Started
//! running true  → false                    StatusChange::Stopped
//! running true  → true, pid differs        StatusChange::UnexpectedRestart
//! ```
//! The pid-swap case is a distinct, rarer condition from an observed
//! stop/start pair and is never conflated with it. The first observation
//! establishes a baseline and emits nothing.

use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::ticker::Ticker;
use crate::events::{Event, EventRouter, HealthIssue, StatusChange};
use crate::facades::{GameServerFacade, ProcessController};

use super::Monitor;

/// One observation of the managed process.
#[derive(Debug, Clone)]
pub struct ProcessStatus {
    /// True while the process was alive at check time.
    pub running: bool,
    /// Pid at check time, when running.
    pub pid: Option<u32>,
    /// Uptime at check time.
    pub uptime: Duration,
    /// Player count at check time (0 when the query failed).
    pub player_count: usize,
    /// Wall-clock instant of the check.
    pub last_check: SystemTime,
}

/// Monitors process run-state and health.
pub struct ProcessHealthTracker {
    controller: Arc<dyn ProcessController>,
    facade: Arc<dyn GameServerFacade>,
    router: Arc<EventRouter>,

    status_interval: Duration,
    health_interval: Duration,
    slow_response: Duration,
    long_uptime: Duration,
    cycle_budget: Duration,

    // Written only by the status cycle; the health cycle and status readers
    // take cheap clones.
    last: RwLock<Option<ProcessStatus>>,
}

impl ProcessHealthTracker {
    /// Creates a tracker observing `controller` and `facade`, dispatching
    /// through `router`.
    pub fn new(
        controller: Arc<dyn ProcessController>,
        facade: Arc<dyn GameServerFacade>,
        router: Arc<EventRouter>,
        cfg: &Config,
    ) -> Self {
        Self {
            controller,
            facade,
            router,
            status_interval: cfg.status_interval,
            health_interval: cfg.health_interval,
            slow_response: cfg.slow_response,
            long_uptime: cfg.long_uptime,
            cycle_budget: cfg.cycle_budget,
            last: RwLock::new(None),
        }
    }

    /// Last observed status, if a status cycle has completed yet.
    pub fn last_status(&self) -> Option<ProcessStatus> {
        self.last.read().expect("status history poisoned").clone()
    }

    /// Builds a fresh observation from the controller and facade.
    async fn probe(&self) -> ProcessStatus {
        let running = self.controller.is_running();
        let pid = self.controller.pid();
        let uptime = self.controller.uptime();

        // Player count is best-effort here; the presence tracker owns the
        // authoritative roster.
        let player_count = match self.facade.players().await {
            Ok(players) => players.len(),
            Err(e) => {
                debug!(error = %e, "player count unavailable for status probe");
                0
            }
        };

        ProcessStatus {
            running,
            pid,
            uptime,
            player_count,
            last_check: SystemTime::now(),
        }
    }

    /// One fast cycle: probe, detect transitions, store the observation.
    async fn status_cycle(&self) {
        let started = Instant::now();
        let current = self.probe().await;
        let previous = self.last_status();

        if let Some(previous) = previous {
            if let Some(change) = detect_transition(&previous, &current) {
                info!(change = %change, "process status changed");
                self.router
                    .dispatch(&Event::StatusChanged {
                        change,
                        at: current.last_check,
                    })
                    .await;
            }
        } else {
            debug!(
                running = current.running,
                pid = ?current.pid,
                "process status baseline established"
            );
        }

        *self.last.write().expect("status history poisoned") = Some(current);

        let elapsed = started.elapsed();
        if elapsed > self.cycle_budget {
            warn!(?elapsed, budget = ?self.cycle_budget, "status cycle over budget");
            self.router
                .dispatch(&Event::PerformanceIssue {
                    message: format!(
                        "status poll took {elapsed:?} (budget {:?})",
                        self.cycle_budget
                    ),
                    at: SystemTime::now(),
                })
                .await;
        }
    }

    /// One slow cycle: deep health check, batched into one warning.
    ///
    /// Skipped entirely while the process is stopped — a stopped server is
    /// a status condition, not a health issue.
    async fn health_cycle(&self) {
        let Some(status) = self.last_status().filter(|s| s.running) else {
            return;
        };

        let mut issues = Vec::new();

        let started = Instant::now();
        match self.facade.server_info().await {
            Ok(_) => {
                let latency = started.elapsed();
                if latency > self.slow_response {
                    issues.push(HealthIssue::SlowResponse { latency });
                }
            }
            Err(e) => {
                issues.push(HealthIssue::Unreachable {
                    reason: e.as_label().to_string(),
                });
            }
        }

        if status.uptime > self.long_uptime && status.player_count == 0 {
            issues.push(HealthIssue::IdleUptime {
                uptime: status.uptime,
            });
        }

        if issues.is_empty() {
            debug!("health check passed");
            return;
        }

        warn!(count = issues.len(), "health issues detected");
        self.router
            .dispatch(&Event::HealthWarning {
                issues,
                uptime: status.uptime,
                player_count: status.player_count,
                at: SystemTime::now(),
            })
            .await;
    }
}

/// Applies the transition rules to two consecutive observations.
fn detect_transition(previous: &ProcessStatus, current: &ProcessStatus) -> Option<StatusChange> {
    match (previous.running, current.running) {
        (false, true) => Some(StatusChange::Started { pid: current.pid }),
        (true, false) => Some(StatusChange::Stopped {
            last_pid: previous.pid,
            uptime: previous.uptime,
        }),
        (true, true) if previous.pid != current.pid => Some(StatusChange::UnexpectedRestart {
            old_pid: previous.pid,
            new_pid: current.pid,
        }),
        _ => None,
    }
}

/// Fast status loop of a shared [`ProcessHealthTracker`].
pub struct StatusCycle(pub Arc<ProcessHealthTracker>);

#[async_trait]
impl Monitor for StatusCycle {
    fn name(&self) -> &'static str {
        "process-status"
    }

    async fn run(&self, ctx: CancellationToken) {
        info!(interval = ?self.0.status_interval, "status monitoring started");
        let ticker = Ticker::new(self.0.status_interval, ctx.clone());
        loop {
            self.0.status_cycle().await;
            if !ticker.tick().await {
                break;
            }
        }
        info!("status monitoring stopped");
    }
}

/// Slow health loop of a shared [`ProcessHealthTracker`].
pub struct HealthCycle(pub Arc<ProcessHealthTracker>);

#[async_trait]
impl Monitor for HealthCycle {
    fn name(&self) -> &'static str {
        "process-health"
    }

    async fn run(&self, ctx: CancellationToken) {
        info!(interval = ?self.0.health_interval, "health monitoring started");
        let ticker = Ticker::new(self.0.health_interval, ctx.clone());
        // The first health check waits out one interval: a status baseline
        // must exist before anything useful can be said.
        while ticker.tick().await {
            self.0.health_cycle().await;
        }
        info!("health monitoring stopped");
    }
}
