//! Supervisory events: data model and fan-out.
//!
//! This module groups the event **data model** and the **router** used to
//! deliver every detected change to the registered handlers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] closed tagged union with typed payloads
//! - [`StatusChange`], [`HealthIssue`] payload detail types
//! - [`EventRouter`], [`Handler`] ordered fan-out with failure isolation
//!
//! ## Quick reference
//! - **Publishers**: the monitor loops (`PresenceTracker`,
//!   `ProcessHealthTracker`, `IdleSupervisor`, `RetentionEngine`).
//! - **Consumers**: handlers wired at orchestrator setup time (logging,
//!   notification forwarding, custom observers).

mod event;
mod router;

pub use event::{Event, EventKind, HealthIssue, StatusChange};
pub use router::{EventRouter, Handler, HandlerRef};
