//! Built-in event handlers.
//!
//! This module provides the two handlers every deployment wants wired:
//! - [`LogHandler`] structured log line per event
//! - [`NotifierHandler`] forwards events to the injected
//!   [`Notifier`](crate::Notifier)
//!
//! Both are ordinary [`Handler`](crate::Handler) implementations; custom
//! observers register through the same
//! [`EventRouter::register`](crate::EventRouter::register) surface.
//!
//! ## Implementing custom handlers
//! ```no_run
//! use gamevisor::{Event, Handler};
//! use async_trait::async_trait;
//!
//! struct Metrics;
//!
//! #[async_trait]
//! impl Handler for Metrics {
//!     async fn handle(&self, event: &Event) -> anyhow::Result<()> {
//!         // increment a counter keyed by event.kind().as_label() ...
//!         let _ = event;
//!         Ok(())
//!     }
//! }
//! ```

mod log;
mod notify;

pub use log::LogHandler;
pub use notify::NotifierHandler;
