//! # PresenceTracker: join/leave detection from player-list snapshots.
//!
//! Polls the player-list facade on a fixed cadence, computes the set
//! difference against the previous snapshot, and dispatches
//! [`Event::PlayerJoined`]/[`Event::PlayerLeft`] for every change.
//!
//! ## Rules
//! - The **first successful poll** only establishes the baseline and emits
//!   nothing (cold-start suppression).
//! - `joined = current − previous`, `left = previous − current`;
//!   `count_after` is `|current|` for every event of the cycle.
//! - Joins are dispatched before leaves; order inside each group follows set
//!   iteration — implementation-defined, stable within a run, never relied
//!   upon.
//! - A failed poll is retried with bounded exponential backoff. Exhausting
//!   the budget **skips the cycle**: the previous snapshot is preserved, no
//!   diff is computed and no event is emitted, so poll outages can never
//!   manufacture spurious joins or leaves.
//! - The stored snapshot is replaced only on a successful poll.
//!
//! The tracker exposes [`current_count`](PresenceTracker::current_count)
//! (lock-free) and [`current_members`](PresenceTracker::current_members) for
//! the idle supervisor, which reads them without going through events.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::ticker::{sleep_cancellable, Ticker};
use crate::events::{Event, EventRouter};
use crate::facades::GameServerFacade;
use crate::policies::RetryPolicy;

use super::Monitor;

/// Read-only view of the tracker's counters.
#[derive(Debug, Clone, Default)]
pub struct PresenceStatus {
    /// Completed poll cycles (including skipped ones).
    pub cycles: u64,
    /// Polls that returned a snapshot.
    pub successful_polls: u64,
    /// Individual poll attempts that failed.
    pub failed_polls: u64,
    /// Size of the current snapshot.
    pub player_count: usize,
    /// True once the cold-start baseline has been established.
    pub primed: bool,
}

/// Monitors player joins and leaves via snapshot diffing.
pub struct PresenceTracker {
    facade: Arc<dyn GameServerFacade>,
    router: Arc<EventRouter>,
    interval: Duration,
    retry: RetryPolicy,

    members: RwLock<HashSet<String>>,
    count: AtomicUsize,
    primed: AtomicBool,

    cycles: AtomicU64,
    successful_polls: AtomicU64,
    failed_polls: AtomicU64,
}

impl PresenceTracker {
    /// Creates a tracker polling `facade` and dispatching through `router`.
    pub fn new(facade: Arc<dyn GameServerFacade>, router: Arc<EventRouter>, cfg: &Config) -> Self {
        Self {
            facade,
            router,
            interval: cfg.presence_interval,
            retry: cfg.retry,
            members: RwLock::new(HashSet::new()),
            count: AtomicUsize::new(0),
            primed: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
            successful_polls: AtomicU64::new(0),
            failed_polls: AtomicU64::new(0),
        }
    }

    /// Current player count. Lock-free; at most one poll interval stale.
    pub fn current_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Current player identifiers (cloned snapshot).
    pub fn current_members(&self) -> HashSet<String> {
        self.members.read().expect("presence snapshot poisoned").clone()
    }

    /// Returns the tracker's counters.
    pub fn status(&self) -> PresenceStatus {
        PresenceStatus {
            cycles: self.cycles.load(Ordering::Relaxed),
            successful_polls: self.successful_polls.load(Ordering::Relaxed),
            failed_polls: self.failed_polls.load(Ordering::Relaxed),
            player_count: self.current_count(),
            primed: self.primed.load(Ordering::Relaxed),
        }
    }

    /// Runs one poll-diff-dispatch cycle.
    pub(crate) async fn cycle(&self, ctx: &CancellationToken) {
        self.cycles.fetch_add(1, Ordering::Relaxed);

        let Some(current) = self.poll_with_retry(ctx).await else {
            return;
        };

        if !self.primed.load(Ordering::Relaxed) {
            info!(count = current.len(), "presence baseline established");
            self.replace_snapshot(current);
            self.primed.store(true, Ordering::Relaxed);
            return;
        }

        let previous = self.current_members();
        let joined: Vec<String> = current.difference(&previous).cloned().collect();
        let left: Vec<String> = previous.difference(&current).cloned().collect();
        let count_after = current.len();

        // Snapshot first, events second: the idle supervisor's count
        // accessor must already reflect the cycle the events describe.
        self.replace_snapshot(current);

        if joined.is_empty() && left.is_empty() {
            return;
        }
        info!(?joined, ?left, count_after, "player changes detected");

        let at = SystemTime::now();
        for name in joined {
            self.router
                .dispatch(&Event::PlayerJoined {
                    name,
                    count_after,
                    at,
                })
                .await;
        }
        for name in left {
            self.router
                .dispatch(&Event::PlayerLeft {
                    name,
                    count_after,
                    at,
                })
                .await;
        }
    }

    /// Polls the facade, retrying with bounded exponential backoff.
    ///
    /// Returns `None` when every attempt failed or cancellation interrupted
    /// a backoff sleep; the caller then skips the cycle.
    async fn poll_with_retry(&self, ctx: &CancellationToken) -> Option<HashSet<String>> {
        let attempts = self.retry.max_attempts.max(1);
        for attempt in 0..attempts {
            if ctx.is_cancelled() {
                return None;
            }
            match self.facade.players().await {
                Ok(players) => {
                    self.successful_polls.fetch_add(1, Ordering::Relaxed);
                    return Some(players.into_iter().map(|p| p.name).collect());
                }
                Err(e) => {
                    self.failed_polls.fetch_add(1, Ordering::Relaxed);
                    if self.retry.is_last_attempt(attempt) {
                        warn!(
                            error = %e,
                            label = e.as_label(),
                            attempts,
                            "presence poll exhausted retries; skipping cycle"
                        );
                        return None;
                    }
                    let delay = self.retry.delay_for(attempt);
                    debug!(error = %e, attempt, ?delay, "presence poll failed; backing off");
                    if !sleep_cancellable(ctx, delay).await {
                        return None;
                    }
                }
            }
        }
        None
    }

    fn replace_snapshot(&self, current: HashSet<String>) {
        self.count.store(current.len(), Ordering::Relaxed);
        *self.members.write().expect("presence snapshot poisoned") = current;
    }
}

#[async_trait]
impl Monitor for PresenceTracker {
    fn name(&self) -> &'static str {
        "presence"
    }

    async fn run(&self, ctx: CancellationToken) {
        info!(interval = ?self.interval, "presence monitoring started");
        let ticker = Ticker::new(self.interval, ctx.clone());
        loop {
            self.cycle(&ctx).await;
            if !ticker.tick().await {
                break;
            }
        }
        let status = self.status();
        info!(
            cycles = status.cycles,
            ok = status.successful_polls,
            failed = status.failed_polls,
            "presence monitoring stopped"
        );
    }
}
