//! # Process controller for the managed server.
//!
//! [`ProcessController`] is the coarse start/stop surface plus the
//! process-status provider. `stop` owns the whole graceful-shutdown dance
//! (announce, wait, escalate to force-kill); the supervisory core requests
//! it and observes the boolean outcome, nothing more.

use std::time::Duration;

use async_trait::async_trait;

/// Lifecycle control and status of the managed server process.
#[async_trait]
pub trait ProcessController: Send + Sync + 'static {
    /// True while the managed process is alive.
    fn is_running(&self) -> bool;

    /// Pid of the managed process, when running.
    fn pid(&self) -> Option<u32>;

    /// Time since the managed process was started.
    fn uptime(&self) -> Duration;

    /// Starts the process. Returns `true` once the process is confirmed
    /// running; implementations verify liveness before answering.
    async fn start(&self) -> bool;

    /// Stops the process gracefully, escalating to force termination if
    /// needed. Returns `true` once the process is confirmed stopped.
    async fn stop(&self) -> bool;
}
