//! Monitor loops of the supervisory core.
//!
//! Each monitor is an independent, cooperatively-scheduled polling loop
//! spawned by the [`Orchestrator`](crate::Orchestrator) under its own child
//! cancellation token. Monitors never push-subscribe to the managed process:
//! they poll at their own cadence, diff against their previous observation,
//! and hand typed events to the shared [`EventRouter`](crate::EventRouter).
//!
//! ## The six loops
//! ```text
//! PresenceTracker        "presence"        player-list snapshots → join/leave diffs
//! ProcessHealthTracker   "process-status"  fast run-state/pid transition detection
//!                        "process-health"  slow deep health check (advisory)
//! IdleSupervisor         "idle"            idle timer → restart workflow
//! RetentionEngine        "backup-create"   scheduled tiered archive creation
//!                        "backup-cleanup"  retention cleanup passes
//! ```
//!
//! Within one monitor, cycles run strictly sequentially; across monitors no
//! ordering is guaranteed or required.

mod health;
mod idle;
mod presence;
mod retention;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use health::{HealthCycle, ProcessHealthTracker, ProcessStatus, StatusCycle};
pub use idle::{IdleStatus, IdleSupervisor};
pub use presence::{PresenceStatus, PresenceTracker};
pub use retention::{BackupCycle, CleanupCycle, RetentionEngine, RetentionStatus};

/// Shared handle to a monitor loop.
pub type MonitorRef = Arc<dyn Monitor>;

/// # One cancellable supervisory loop.
///
/// A `Monitor` has a stable [`name`](Monitor::name) (used in logs and in the
/// stuck-task report during shutdown) and a [`run`](Monitor::run) method
/// that loops until the token is cancelled. Failures inside a cycle are
/// logged and absorbed; `run` itself never fails.
#[async_trait]
pub trait Monitor: Send + Sync + 'static {
    /// Returns the stable task name.
    fn name(&self) -> &'static str;

    /// Runs the loop until cancellation.
    ///
    /// Implementations must observe `ctx` at every suspension point so
    /// shutdown is prompt rather than waiting out a full interval.
    async fn run(&self, ctx: CancellationToken);
}
