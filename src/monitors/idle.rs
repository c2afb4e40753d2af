//! # IdleSupervisor: autonomous restart after sustained emptiness.
//!
//! Reads the presence tracker's live player count and the controller's
//! running flag on its own cadence and maintains the idle timer. States:
//!
//! ```text
//! Active ── running && count == 0 ──► Idle(since)
//! Idle   ── count > 0             ──► Active   (longest-idle stat updated)
//! Idle   ── process stopped      ──► Active   (no idle without a process)
//! Idle   ── elapsed ≥ threshold  ──► restart workflow, then Active
//! ```
//!
//! The restart workflow is: dispatch [`Event::IdleRestartTriggered`], request
//! a graceful stop through the controller (which owns the
//! announce/wait/force internals), wait a settle interval, request a start.
//! The idle timer is cleared **unconditionally** afterwards — outcome is
//! reported separately via [`Event::RestartSucceeded`] /
//! [`Event::RestartFailed`], and `total_restarts` counts only verified
//! successes. Clearing regardless of outcome means a failed restart does not
//! re-trigger immediately; the server must be continuously idle for another
//! full threshold first.
//!
//! ## Cancellation
//! The loop observes its token at the interval wait, but once a stop has
//! been requested the workflow runs to completion: cancelling between the
//! stop and start steps would leave the managed process down.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::ticker::Ticker;
use crate::events::{Event, EventRouter};
use crate::facades::ProcessController;

use super::{Monitor, PresenceTracker};

/// Read-only view of the idle timer and its statistics.
#[derive(Debug, Clone)]
pub struct IdleStatus {
    /// True while the idle timer is armed.
    pub armed: bool,
    /// Accumulated idle duration of the current interval.
    pub current_idle: Duration,
    /// Time left until the restart triggers (full threshold when disarmed).
    pub remaining: Duration,
    /// The configured threshold.
    pub threshold: Duration,
    /// Verified successful idle restarts.
    pub total_restarts: u64,
    /// Longest idle interval ever observed.
    pub longest_idle: Duration,
    /// Completion instant of the last successful restart.
    pub last_restart: Option<SystemTime>,
}

/// Mutable timer state; written only by the supervisor's own loop.
#[derive(Debug, Default)]
struct IdleState {
    idle_since: Option<Instant>,
    total_restarts: u64,
    last_restart: Option<SystemTime>,
    longest_idle: Duration,
}

/// Drives the idle timer and the stop→settle→start workflow.
pub struct IdleSupervisor {
    presence: Arc<PresenceTracker>,
    controller: Arc<dyn ProcessController>,
    router: Arc<EventRouter>,

    check_interval: Duration,
    threshold: Duration,
    settle: Duration,

    state: Mutex<IdleState>,
}

impl IdleSupervisor {
    /// Creates a supervisor reading `presence` and driving `controller`.
    pub fn new(
        presence: Arc<PresenceTracker>,
        controller: Arc<dyn ProcessController>,
        router: Arc<EventRouter>,
        cfg: &Config,
    ) -> Self {
        Self {
            presence,
            controller,
            router,
            check_interval: cfg.idle_check_interval,
            threshold: cfg.idle_threshold,
            settle: cfg.restart_settle,
            state: Mutex::new(IdleState::default()),
        }
    }

    /// Returns the timer state and statistics.
    pub fn status(&self) -> IdleStatus {
        let state = self.state.lock().expect("idle state poisoned");
        let current_idle = state
            .idle_since
            .map(|since| since.elapsed())
            .unwrap_or_default();
        IdleStatus {
            armed: state.idle_since.is_some(),
            current_idle,
            remaining: self.threshold.saturating_sub(current_idle),
            threshold: self.threshold,
            total_restarts: state.total_restarts,
            longest_idle: state.longest_idle.max(current_idle),
            last_restart: state.last_restart,
        }
    }

    /// One idle-timer evaluation.
    pub(crate) async fn cycle(&self) {
        if !self.controller.is_running() {
            let mut state = self.state.lock().expect("idle state poisoned");
            if state.idle_since.take().is_some() {
                debug!("server not running; idle timer cleared");
            }
            return;
        }

        let count = self.presence.current_count();
        if count == 0 {
            self.observe_idle().await;
        } else {
            self.observe_active(count);
        }
    }

    /// Zero players while running: arm or advance the timer, trigger on
    /// threshold breach.
    async fn observe_idle(&self) {
        let elapsed = {
            let mut state = self.state.lock().expect("idle state poisoned");
            let Some(since) = state.idle_since else {
                state.idle_since = Some(Instant::now());
                info!("no players online; idle timer started");
                return;
            };
            let elapsed = since.elapsed();
            state.longest_idle = state.longest_idle.max(elapsed);
            elapsed
        };

        if elapsed >= self.threshold {
            self.trigger_restart(elapsed).await;
        }
    }

    /// Players are back: disarm and fold the ended interval into the stats.
    fn observe_active(&self, count: usize) {
        let mut state = self.state.lock().expect("idle state poisoned");
        if let Some(since) = state.idle_since.take() {
            let idle_for = since.elapsed();
            state.longest_idle = state.longest_idle.max(idle_for);
            info!(count, ?idle_for, "players online; idle timer reset");
        }
    }

    /// The restart workflow: notify, stop, settle, start, report, clear.
    async fn trigger_restart(&self, idle: Duration) {
        warn!(?idle, threshold = ?self.threshold, "idle threshold breached; restarting server");
        self.router
            .dispatch(&Event::IdleRestartTriggered {
                idle,
                threshold: self.threshold,
                at: SystemTime::now(),
            })
            .await;

        match self.perform_restart().await {
            Ok(downtime) => {
                {
                    let mut state = self.state.lock().expect("idle state poisoned");
                    state.total_restarts += 1;
                    state.last_restart = Some(SystemTime::now());
                }
                info!(?downtime, "idle restart completed");
                self.router
                    .dispatch(&Event::RestartSucceeded {
                        downtime,
                        at: SystemTime::now(),
                    })
                    .await;
            }
            Err(reason) => {
                warn!(reason, "idle restart failed");
                self.router
                    .dispatch(&Event::RestartFailed {
                        reason: reason.to_string(),
                        at: SystemTime::now(),
                    })
                    .await;
            }
        }

        // Timer reset is decoupled from the outcome: a failed restart must
        // not re-trigger on the very next cycle.
        let mut state = self.state.lock().expect("idle state poisoned");
        state.idle_since = None;
    }

    /// Stop → settle → start. Once the stop is requested this sequence does
    /// not observe cancellation; aborting between the two steps would leave
    /// the process stopped.
    async fn perform_restart(&self) -> Result<Duration, &'static str> {
        let begun = Instant::now();

        if !self.controller.stop().await {
            return Err("graceful stop failed");
        }
        time::sleep(self.settle).await;
        if !self.controller.start().await {
            return Err("start after idle stop failed");
        }

        Ok(begun.elapsed())
    }
}

#[async_trait]
impl Monitor for IdleSupervisor {
    fn name(&self) -> &'static str {
        "idle"
    }

    async fn run(&self, ctx: CancellationToken) {
        info!(threshold = ?self.threshold, interval = ?self.check_interval, "idle monitoring started");
        let ticker = Ticker::new(self.check_interval, ctx.clone());
        loop {
            self.cycle().await;
            if !ticker.tick().await {
                break;
            }
        }
        let status = self.status();
        info!(
            total_restarts = status.total_restarts,
            longest_idle = ?status.longest_idle,
            "idle monitoring stopped"
        );
    }
}
