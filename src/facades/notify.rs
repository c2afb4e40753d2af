//! # Outbound notification sink.
//!
//! [`Notifier`] receives supervisory events and turns them into user-facing
//! messages. Localization, formatting and transport (chat webhooks, email,
//! ...) are entirely the implementation's concern; the core only learns
//! whether delivery succeeded.

use async_trait::async_trait;

use crate::events::Event;

/// Delivery sink for supervisory events.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Delivers one event. Returns `false` when delivery failed; the caller
    /// logs and moves on.
    async fn send(&self, event: &Event) -> bool;
}
