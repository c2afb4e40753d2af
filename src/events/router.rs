//! # EventRouter: ordered fan-out with per-handler isolation.
//!
//! [`EventRouter`] maps an [`EventKind`] to the handlers registered for it
//! and invokes them **sequentially, in registration order** on dispatch.
//! Each invocation is individually guarded: an `Err` result is logged, a
//! panic is caught, and neither prevents the remaining handlers for the same
//! event nor propagates to the emitting monitor's loop.
//!
//! ## Registration is setup-time only
//! `register` takes `&mut self`; the orchestrator wires handlers before any
//! monitor task starts and then shares the router behind an `Arc`. Dispatch
//! therefore reads an immutable map — no synchronization is needed at
//! runtime.
//!
//! ## Diagram
//! ```text
//!    dispatch(&Event)
//!        │  routes[event.kind()]
//!        ├──► handler 1 ── Err/panic? → log, continue
//!        ├──► handler 2
//!        └──► handler N      (registration order, awaited one by one)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{error, warn};

use super::{Event, EventKind};

/// Shared handle to a registered event handler.
pub type HandlerRef = Arc<dyn Handler>;

/// Contract for event handlers.
///
/// Called from the dispatching monitor's task. Implementations may be slow
/// (network notifications, disk writes); they delay only the emitting
/// monitor's current cycle, never other monitors.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handles a single event.
    ///
    /// Returning `Err` marks the invocation failed; the router logs it and
    /// moves on to the next handler.
    async fn handle(&self, event: &Event) -> anyhow::Result<()>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Typed registry mapping event kinds to ordered handler lists.
#[derive(Default)]
pub struct EventRouter {
    routes: HashMap<EventKind, Vec<HandlerRef>>,
}

impl EventRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list for `kind`.
    ///
    /// Handlers for one kind run in the order they were registered.
    pub fn register(&mut self, kind: EventKind, handler: HandlerRef) {
        self.routes.entry(kind).or_default().push(handler);
    }

    /// Registers `handler` for every event kind.
    pub fn register_all(&mut self, handler: HandlerRef) {
        for kind in EventKind::ALL {
            self.register(kind, handler.clone());
        }
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.routes.get(&kind).map_or(0, Vec::len)
    }

    /// Invokes every handler registered for `event.kind()`, isolating
    /// failures.
    ///
    /// Handlers run sequentially in registration order. A handler that
    /// returns `Err` or panics is logged under its own name; the remaining
    /// handlers still run, and the caller never observes the failure.
    pub async fn dispatch(&self, event: &Event) {
        let Some(handlers) = self.routes.get(&event.kind()) else {
            return;
        };

        for handler in handlers {
            let guarded = std::panic::AssertUnwindSafe(handler.handle(event)).catch_unwind();
            match guarded.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        handler = handler.name(),
                        event = event.kind().as_label(),
                        error = %e,
                        "event handler failed"
                    );
                }
                Err(panic) => {
                    error!(
                        handler = handler.name(),
                        event = event.kind().as_label(),
                        panic = ?panic,
                        "event handler panicked"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::SystemTime;

    fn joined(name: &str) -> Event {
        Event::PlayerJoined {
            name: name.into(),
            count_after: 1,
            at: SystemTime::now(),
        }
    }

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Handler for Counting {
        async fn handle(&self, _event: &Event) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Handler for Failing {
        async fn handle(&self, _event: &Event) -> anyhow::Result<()> {
            Err(anyhow!("boom"))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Handler for Panicking {
        async fn handle(&self, _event: &Event) -> anyhow::Result<()> {
            panic!("handler exploded");
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_registered_handler() {
        let counting = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut router = EventRouter::new();
        router.register(EventKind::PlayerJoined, counting.clone());

        router.dispatch(&joined("steve")).await;
        router.dispatch(&joined("alex")).await;
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unregistered_kind_is_a_no_op() {
        let counting = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut router = EventRouter::new();
        router.register(EventKind::PlayerLeft, counting.clone());

        router.dispatch(&joined("steve")).await;
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_later_handlers() {
        let counting = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut router = EventRouter::new();
        router.register(EventKind::PlayerJoined, Arc::new(Failing));
        router.register(EventKind::PlayerJoined, counting.clone());

        router.dispatch(&joined("steve")).await;
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let counting = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut router = EventRouter::new();
        router.register(EventKind::PlayerJoined, Arc::new(Panicking));
        router.register(EventKind::PlayerJoined, counting.clone());

        // Must not unwind into the dispatching loop.
        router.dispatch(&joined("steve")).await;
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_register_all_covers_every_kind() {
        let counting = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut router = EventRouter::new();
        router.register_all(counting);
        for kind in EventKind::ALL {
            assert_eq!(router.handler_count(kind), 1);
        }
    }
}
