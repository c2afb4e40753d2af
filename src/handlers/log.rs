//! # Logging handler.
//!
//! [`LogHandler`] writes one structured log line per event. Usually
//! registered for every kind via
//! [`EventRouter::register_all`](crate::EventRouter::register_all).
//!
//! ## Output shape
//! ```text
//! INFO player joined name="alice" count_after=3
//! WARN health issues detected issues=2 player_count=0
//! INFO backup created archive="save-daily-20250601020000.zip" tier=daily
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::events::{Event, Handler};

/// Structured-logging event handler.
#[derive(Default)]
pub struct LogHandler;

impl LogHandler {
    /// Creates the handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for LogHandler {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        match event {
            Event::PlayerJoined {
                name, count_after, ..
            } => info!(name = %name, count_after, "player joined"),
            Event::PlayerLeft {
                name, count_after, ..
            } => info!(name = %name, count_after, "player left"),
            Event::StatusChanged { change, .. } => info!(change = %change, "status changed"),
            Event::HealthWarning {
                issues,
                player_count,
                ..
            } => {
                warn!(
                    issues = issues.len(),
                    player_count,
                    detail = ?issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "health issues detected"
                );
            }
            Event::PerformanceIssue { message, .. } => warn!(message = %message, "performance issue"),
            Event::BackupCompleted { record, .. } => {
                info!(
                    archive = %record.filename,
                    tier = %record.tier,
                    size_bytes = record.size_bytes,
                    "backup created"
                );
            }
            Event::IdleRestartTriggered {
                idle, threshold, ..
            } => warn!(?idle, ?threshold, "idle restart triggered"),
            Event::RestartSucceeded { downtime, .. } => info!(?downtime, "restart succeeded"),
            Event::RestartFailed { reason, .. } => warn!(reason = %reason, "restart failed"),
        }
        Ok(())
    }
}
