//! # Builder wiring the trackers, router and handlers together.
//!
//! Handler registration is setup-time only: the builder owns the mutable
//! [`EventRouter`], and `build` freezes it behind an `Arc` before any
//! tracker exists. Collaborators are injected, never looked up — there are
//! no global singletons anywhere in the crate.

use std::sync::Arc;

use crate::config::Config;
use crate::core::orchestrator::Orchestrator;
use crate::events::{EventKind, EventRouter, HandlerRef};
use crate::facades::{GameServerFacade, ProcessController};
use crate::monitors::{IdleSupervisor, PresenceTracker, ProcessHealthTracker, RetentionEngine};
use crate::store::ArchiveStore;

/// Builder for constructing an [`Orchestrator`] with its handler wiring.
///
/// ## Example
/// ```no_run
/// use std::sync::Arc;
/// use gamevisor::{Config, LogHandler, OrchestratorBuilder};
/// # fn collaborators() -> (Arc<dyn gamevisor::GameServerFacade>, Arc<dyn gamevisor::ProcessController>, Arc<dyn gamevisor::ArchiveStore>) { unimplemented!() }
///
/// let (game, controller, store) = collaborators();
/// let orchestrator = OrchestratorBuilder::new(Config::default())
///     .with_observer(Arc::new(LogHandler::new()))
///     .build(game, controller, store);
/// ```
pub struct OrchestratorBuilder {
    cfg: Config,
    router: EventRouter,
}

impl OrchestratorBuilder {
    /// Creates a builder with the given configuration and an empty router.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            router: EventRouter::new(),
        }
    }

    /// Registers `handler` for one event kind.
    pub fn with_handler(mut self, kind: EventKind, handler: HandlerRef) -> Self {
        self.router.register(kind, handler);
        self
    }

    /// Registers `handler` for every event kind.
    pub fn with_observer(mut self, handler: HandlerRef) -> Self {
        self.router.register_all(handler);
        self
    }

    /// Builds the trackers around the injected collaborators and returns
    /// the orchestrator owning them.
    pub fn build(
        self,
        game: Arc<dyn GameServerFacade>,
        controller: Arc<dyn ProcessController>,
        store: Arc<dyn ArchiveStore>,
    ) -> Orchestrator {
        let router = Arc::new(self.router);

        let presence = Arc::new(PresenceTracker::new(game.clone(), router.clone(), &self.cfg));
        let health = Arc::new(ProcessHealthTracker::new(
            controller.clone(),
            game,
            router.clone(),
            &self.cfg,
        ));
        let idle = Arc::new(IdleSupervisor::new(
            presence.clone(),
            controller,
            router.clone(),
            &self.cfg,
        ));
        let retention = Arc::new(RetentionEngine::new(store, router, &self.cfg));

        Orchestrator::new(self.cfg, presence, health, idle, retention)
    }
}
