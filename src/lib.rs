//! # gamevisor
//!
//! **Gamevisor** is a supervisory control core for one long-running,
//! externally managed game-server process. It observes the process only
//! through polling facades (a player-list query, a deep info query, a
//! process-status provider) and a coarse start/stop control surface, and it
//! turns those polls into typed events, autonomous idle restarts, and tiered
//! backups.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!    ┌────────────────┐  ┌─────────────────────┐  ┌─────────────────┐
//!    │ GameServer     │  │ ProcessController   │  │ ArchiveStore    │
//!    │ Facade (poll)  │  │ (status, start/stop)│  │ (create/prune)  │
//!    └───────┬────────┘  └──────────┬──────────┘  └────────┬────────┘
//!            ▼                      ▼                      ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Orchestrator (lifecycle owner)                                  │
//! │   spawns one task per monitor loop, child CancellationToken each │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  PresenceTracker      snapshot diff → PlayerJoined / PlayerLeft  │
//! │  ProcessHealthTracker fast status cycle + slow health cycle      │
//! │  IdleSupervisor       idle timer → stop → settle → start         │
//! │  RetentionEngine      tiered creation + retention cleanup        │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 ▼
//!                     ┌───────────────────────┐
//!                     │      EventRouter      │
//!                     │ map<EventKind, [h..]> │
//!                     └───┬───────────────┬───┘
//!                         ▼               ▼
//!                    LogHandler    NotifierHandler ... (isolated)
//! ```
//!
//! ### Concurrency model
//! One cooperatively scheduled task per loop (presence, status, health,
//! idle, backup-create, backup-cleanup). Each piece of mutable state has
//! exactly one writer task; readers take atomic loads or short lock clones.
//! Every interval wait and backoff sleep observes the cancellation token,
//! so shutdown is prompt — with one deliberate exception: once the idle
//! restart workflow has requested a stop, it completes the start step even
//! under cancellation rather than leaving the process down.
//!
//! ## Features
//! | Area            | Description                                                | Key types                              |
//! |-----------------|------------------------------------------------------------|----------------------------------------|
//! | **Events**      | Closed tagged union, typed registry, isolated fan-out.     | [`Event`], [`EventKind`], [`EventRouter`], [`Handler`] |
//! | **Presence**    | Snapshot diffing with cold-start suppression and retries.  | [`PresenceTracker`], [`RetryPolicy`]   |
//! | **Health**      | Run-state transitions, pid-swap detection, batched checks. | [`ProcessHealthTracker`], [`ProcessStatus`] |
//! | **Idle restart**| Idle timer driving a stop/settle/start workflow.           | [`IdleSupervisor`], [`IdleStatus`]     |
//! | **Backups**     | Calendar-tiered creation and policy-driven cleanup.        | [`RetentionEngine`], [`RetentionPolicy`], [`TierSchedule`] |
//! | **Storage**     | Zip archives of the save directory, tier in the name.      | [`ArchiveStore`], [`ZipArchiveStore`]  |
//! | **Lifecycle**   | Start/stop of all loops with a bounded shutdown grace.     | [`Orchestrator`], [`OrchestratorBuilder`] |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use gamevisor::{
//!     Config, LogHandler, NotifierHandler, OrchestratorBuilder, ZipArchiveStore,
//! };
//! # fn collaborators() -> (Arc<dyn gamevisor::GameServerFacade>, Arc<dyn gamevisor::ProcessController>, Arc<dyn gamevisor::Notifier>) { unimplemented!() }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (game, controller, notifier) = collaborators();
//!     let store = Arc::new(ZipArchiveStore::new(
//!         "/srv/game/save",
//!         "/srv/game/backups",
//!         "save",
//!     )?);
//!
//!     let orchestrator = OrchestratorBuilder::new(Config::default())
//!         .with_observer(Arc::new(LogHandler::new()))
//!         .with_observer(Arc::new(NotifierHandler::new(notifier)))
//!         .build(game, controller, store);
//!
//!     orchestrator.start().await?;
//!     // ... the six monitor loops now run until:
//!     orchestrator.stop().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod facades;
mod handlers;
mod monitors;
mod policies;
mod store;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{Orchestrator, OrchestratorBuilder, OrchestratorStatus};
pub use error::{ArchiveError, FacadeError, RuntimeError};
pub use events::{Event, EventKind, EventRouter, Handler, HandlerRef, HealthIssue, StatusChange};
pub use facades::{GameServerFacade, Notifier, PlayerInfo, ProcessController, ServerInfo};
pub use handlers::{LogHandler, NotifierHandler};
pub use monitors::{
    BackupCycle, CleanupCycle, HealthCycle, IdleStatus, IdleSupervisor, Monitor, MonitorRef,
    PresenceStatus, PresenceTracker, ProcessHealthTracker, ProcessStatus, RetentionEngine,
    RetentionStatus, StatusCycle,
};
pub use policies::{RetentionPolicy, RetryPolicy, TierSchedule};
pub use store::{ArchiveStore, BackupRecord, BackupTier, ZipArchiveStore};
