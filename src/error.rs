//! Error types used by the gamevisor core and its collaborators.
//!
//! This module defines three error enums:
//!
//! - [`FacadeError`] — failures of a single poll against the managed server's
//!   query surface (timeouts, transport faults, malformed payloads).
//! - [`ArchiveError`] — failures while creating or listing backup archives.
//! - [`RuntimeError`] — errors raised by the orchestration runtime itself.
//!
//! All types provide `as_label()` helpers for logs/metrics. Every
//! [`FacadeError`] is transient by definition: the external process may
//! recover at any time, so pollers retry with backoff and never give up
//! permanently.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by one poll against the managed server.
///
/// These cover the transient poll-failure taxonomy: a facade call that timed
/// out, could not reach the process, or returned a payload the client could
/// not decode. Exhausting the retry budget skips the cycle without mutating
/// tracked state.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum FacadeError {
    /// The query did not complete within the client's deadline.
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The transport layer failed (connection refused, reset, DNS, ...).
    #[error("transport error: {message}")]
    Transport {
        /// The underlying transport error message.
        message: String,
    },

    /// The response arrived but could not be decoded.
    #[error("malformed response: {message}")]
    Malformed {
        /// What failed to decode.
        message: String,
    },
}

impl FacadeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gamevisor::FacadeError;
    /// use std::time::Duration;
    ///
    /// let err = FacadeError::Timeout { timeout: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "poll_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FacadeError::Timeout { .. } => "poll_timeout",
            FacadeError::Transport { .. } => "poll_transport",
            FacadeError::Malformed { .. } => "poll_malformed",
        }
    }
}

/// # Errors produced by the backup archive store.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The directory that should be archived does not exist.
    #[error("source directory not found: {path}")]
    MissingSource {
        /// The missing directory.
        path: PathBuf,
    },

    /// Filesystem I/O failed while packing or scanning archives.
    #[error("archive io error: {0}")]
    Io(#[from] std::io::Error),

    /// The packing step itself failed (archive writer error).
    #[error("packing failed: {message}")]
    Pack {
        /// The underlying packer error message.
        message: String,
    },
}

impl ArchiveError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ArchiveError::MissingSource { .. } => "archive_missing_source",
            ArchiveError::Io(_) => "archive_io",
            ArchiveError::Pack { .. } => "archive_pack",
        }
    }
}

/// # Errors produced by the orchestration runtime.
///
/// These represent failures of the supervisory system itself, not of the
/// managed process: individual monitor-cycle failures surface only as log
/// entries and events, never as runtime errors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some monitor tasks remained stuck
    /// and were abandoned.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the monitor tasks that did not stop in time.
        stuck: Vec<String>,
    },

    /// `start()` was called while the monitor tasks were already running.
    #[error("orchestrator already running")]
    AlreadyRunning,

    /// `stop()` was called but no monitor tasks are running.
    #[error("orchestrator not running")]
    NotRunning,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gamevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::AlreadyRunning => "runtime_already_running",
            RuntimeError::NotRunning => "runtime_not_running",
        }
    }
}
