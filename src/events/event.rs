//! # Supervisory events emitted by the monitor loops.
//!
//! [`Event`] is a closed tagged union: every observable change a monitor can
//! detect is one variant with a typed payload, and [`EventKind`] is the
//! field-less classification used to key handler registration. Events are
//! immutable once constructed; the emitting monitor owns one transiently
//! until it hands it to the [`EventRouter`](crate::EventRouter).
//!
//! ## Emitters
//! ```text
//! PresenceTracker      → PlayerJoined / PlayerLeft
//! ProcessHealthTracker → StatusChanged / HealthWarning / PerformanceIssue
//! IdleSupervisor       → IdleRestartTriggered / RestartSucceeded / RestartFailed
//! RetentionEngine      → BackupCompleted
//! ```

use std::fmt;
use std::time::{Duration, SystemTime};

use crate::store::BackupRecord;

/// Classification of supervisory events.
///
/// Used as the registration key in the
/// [`EventRouter`](crate::EventRouter): handlers subscribe to kinds, and
/// dispatch routes each event to the handlers of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A player appeared in the latest presence snapshot.
    PlayerJoined,
    /// A player disappeared from the latest presence snapshot.
    PlayerLeft,
    /// The managed process started, stopped, or swapped pids.
    StatusChanged,
    /// The slow health check found one or more advisory issues.
    HealthWarning,
    /// A monitor cycle exceeded its performance budget.
    PerformanceIssue,
    /// A backup archive was created.
    BackupCompleted,
    /// The idle threshold was breached; the restart workflow is starting.
    IdleRestartTriggered,
    /// The idle-restart workflow completed with a verified running process.
    RestartSucceeded,
    /// The idle-restart workflow failed to stop or start the process.
    RestartFailed,
}

impl EventKind {
    /// Every kind, in declaration order. Used to register a handler for the
    /// full event stream.
    pub const ALL: [EventKind; 9] = [
        EventKind::PlayerJoined,
        EventKind::PlayerLeft,
        EventKind::StatusChanged,
        EventKind::HealthWarning,
        EventKind::PerformanceIssue,
        EventKind::BackupCompleted,
        EventKind::IdleRestartTriggered,
        EventKind::RestartSucceeded,
        EventKind::RestartFailed,
    ];

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::PlayerJoined => "player_joined",
            EventKind::PlayerLeft => "player_left",
            EventKind::StatusChanged => "status_changed",
            EventKind::HealthWarning => "health_warning",
            EventKind::PerformanceIssue => "performance_issue",
            EventKind::BackupCompleted => "backup_completed",
            EventKind::IdleRestartTriggered => "idle_restart_triggered",
            EventKind::RestartSucceeded => "restart_succeeded",
            EventKind::RestartFailed => "restart_failed",
        }
    }
}

/// A process start/stop/pid transition detected by the status cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    /// `running` went `false → true`.
    Started {
        /// Pid of the freshly observed process, when available.
        pid: Option<u32>,
    },
    /// `running` went `true → false`.
    Stopped {
        /// Last pid observed before the stop.
        last_pid: Option<u32>,
        /// Uptime recorded at the last observation before the stop.
        uptime: Duration,
    },
    /// `running` stayed `true` but the pid changed: the process restarted
    /// behind the supervisor's back. Distinct from an observed stop/start
    /// pair and reported as its own condition.
    UnexpectedRestart {
        /// Pid from the previous observation.
        old_pid: Option<u32>,
        /// Pid from the current observation.
        new_pid: Option<u32>,
    },
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusChange::Started { pid } => write!(f, "server started (pid {pid:?})"),
            StatusChange::Stopped { last_pid, uptime } => {
                write!(f, "server stopped (pid {last_pid:?}, uptime {uptime:?})")
            }
            StatusChange::UnexpectedRestart { old_pid, new_pid } => {
                write!(f, "server restarted unexpectedly ({old_pid:?} -> {new_pid:?})")
            }
        }
    }
}

/// One advisory issue found by the slow health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthIssue {
    /// The deep info query answered, but slower than the configured
    /// threshold.
    SlowResponse {
        /// Measured round-trip latency.
        latency: Duration,
    },
    /// The deep info query failed outright.
    Unreachable {
        /// Short label of the underlying facade error.
        reason: String,
    },
    /// The process has been up past the long-uptime threshold with nobody
    /// connected.
    IdleUptime {
        /// Observed uptime.
        uptime: Duration,
    },
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthIssue::SlowResponse { latency } => {
                write!(f, "slow server-info response: {latency:?}")
            }
            HealthIssue::Unreachable { reason } => write!(f, "server info unreachable: {reason}"),
            HealthIssue::IdleUptime { uptime } => {
                write!(f, "running without players for {uptime:?}")
            }
        }
    }
}

/// A supervisory event with its typed payload.
///
/// Every variant carries `at`, the wall-clock instant the emitting monitor
/// observed the change.
#[derive(Debug, Clone)]
pub enum Event {
    /// A player joined between two consecutive snapshots.
    PlayerJoined {
        /// Player identifier.
        name: String,
        /// Snapshot size after the change; shared by all events of one cycle.
        count_after: usize,
        /// Observation instant.
        at: SystemTime,
    },
    /// A player left between two consecutive snapshots.
    PlayerLeft {
        /// Player identifier.
        name: String,
        /// Snapshot size after the change; shared by all events of one cycle.
        count_after: usize,
        /// Observation instant.
        at: SystemTime,
    },
    /// The managed process transitioned between run states.
    StatusChanged {
        /// The detected transition.
        change: StatusChange,
        /// Observation instant.
        at: SystemTime,
    },
    /// Advisory health issues, batched into one event per check.
    HealthWarning {
        /// Every issue found by this check (never empty).
        issues: Vec<HealthIssue>,
        /// Process uptime at check time.
        uptime: Duration,
        /// Player count at check time.
        player_count: usize,
        /// Observation instant.
        at: SystemTime,
    },
    /// A monitor cycle blew its performance budget.
    PerformanceIssue {
        /// Human-readable description.
        message: String,
        /// Observation instant.
        at: SystemTime,
    },
    /// A backup archive was created.
    BackupCompleted {
        /// The freshly created record.
        record: BackupRecord,
        /// Creation instant.
        at: SystemTime,
    },
    /// The idle threshold was breached; dispatched before the restart
    /// workflow begins.
    IdleRestartTriggered {
        /// Continuous idle duration that tripped the threshold.
        idle: Duration,
        /// The configured threshold.
        threshold: Duration,
        /// Trigger instant.
        at: SystemTime,
    },
    /// The restart workflow stopped and started the process successfully.
    RestartSucceeded {
        /// Wall time between the stop request and the completed start.
        downtime: Duration,
        /// Completion instant.
        at: SystemTime,
    },
    /// The restart workflow failed; the idle timer was still cleared.
    RestartFailed {
        /// Which step failed and why.
        reason: String,
        /// Failure instant.
        at: SystemTime,
    },
}

impl Event {
    /// Returns the classification used for handler routing.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PlayerJoined { .. } => EventKind::PlayerJoined,
            Event::PlayerLeft { .. } => EventKind::PlayerLeft,
            Event::StatusChanged { .. } => EventKind::StatusChanged,
            Event::HealthWarning { .. } => EventKind::HealthWarning,
            Event::PerformanceIssue { .. } => EventKind::PerformanceIssue,
            Event::BackupCompleted { .. } => EventKind::BackupCompleted,
            Event::IdleRestartTriggered { .. } => EventKind::IdleRestartTriggered,
            Event::RestartSucceeded { .. } => EventKind::RestartSucceeded,
            Event::RestartFailed { .. } => EventKind::RestartFailed,
        }
    }

    /// Returns the wall-clock instant the event was observed.
    pub fn at(&self) -> SystemTime {
        match self {
            Event::PlayerJoined { at, .. }
            | Event::PlayerLeft { at, .. }
            | Event::StatusChanged { at, .. }
            | Event::HealthWarning { at, .. }
            | Event::PerformanceIssue { at, .. }
            | Event::BackupCompleted { at, .. }
            | Event::IdleRestartTriggered { at, .. }
            | Event::RestartSucceeded { at, .. }
            | Event::RestartFailed { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let ev = Event::PlayerJoined {
            name: "steve".into(),
            count_after: 1,
            at: SystemTime::now(),
        };
        assert_eq!(ev.kind(), EventKind::PlayerJoined);
        assert_eq!(ev.kind().as_label(), "player_joined");
    }

    #[test]
    fn test_all_covers_every_kind() {
        // A handler registered via ALL must see the full stream.
        assert_eq!(EventKind::ALL.len(), 9);
        let mut labels: Vec<_> = EventKind::ALL.iter().map(|k| k.as_label()).collect();
        labels.dedup();
        assert_eq!(labels.len(), EventKind::ALL.len());
    }

    #[test]
    fn test_status_change_display() {
        let change = StatusChange::UnexpectedRestart {
            old_pid: Some(100),
            new_pid: Some(200),
        };
        let text = change.to_string();
        assert!(text.contains("unexpectedly"));
        assert!(text.contains("100"));
        assert!(text.contains("200"));
    }
}
