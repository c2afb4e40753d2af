//! # Notification-forwarding handler.
//!
//! [`NotifierHandler`] bridges the event stream to the injected
//! [`Notifier`]. Which kinds reach the notifier is decided at registration
//! time; the handler itself forwards whatever it is given. A rejected
//! delivery surfaces as a handler error, which the router logs and isolates
//! from the emitting monitor.

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;

use crate::events::{Event, Handler};
use crate::facades::Notifier;

/// Forwards events to a [`Notifier`].
pub struct NotifierHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotifierHandler {
    /// Creates a handler delivering through `notifier`.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Handler for NotifierHandler {
    fn name(&self) -> &'static str {
        "notifier"
    }

    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        if !self.notifier.send(event).await {
            bail!("notifier rejected {} event", event.kind().as_label());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::SystemTime;

    struct FakeNotifier {
        accept: AtomicBool,
        sent: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn send(&self, _event: &Event) -> bool {
            self.sent.fetch_add(1, Ordering::SeqCst);
            self.accept.load(Ordering::SeqCst)
        }
    }

    fn event() -> Event {
        Event::PlayerJoined {
            name: "alice".into(),
            count_after: 1,
            at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn test_forwards_to_notifier() {
        let notifier = Arc::new(FakeNotifier {
            accept: AtomicBool::new(true),
            sent: AtomicUsize::new(0),
        });
        let handler = NotifierHandler::new(notifier.clone());

        handler.handle(&event()).await.unwrap();
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_delivery_becomes_handler_error() {
        let notifier = Arc::new(FakeNotifier {
            accept: AtomicBool::new(false),
            sent: AtomicUsize::new(0),
        });
        let handler = NotifierHandler::new(notifier);

        let err = handler.handle(&event()).await.unwrap_err();
        assert!(err.to_string().contains("player_joined"));
    }
}
