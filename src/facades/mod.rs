//! Collaborator interfaces consumed by the supervisory core.
//!
//! The core observes and minimally controls the managed process only through
//! these narrow traits; the concrete clients (retry-wrapped HTTP/RCON
//! transports, the process-launch wrapper, the notification transport) live
//! outside the crate and are injected at construction time.
//!
//! ## Contents
//! - [`GameServerFacade`] player-list and deep-info queries plus the coarse
//!   announce/stop command surface
//! - [`ProcessController`] start/stop control and process-status provider
//! - [`Notifier`] outbound notification sink (formatting is its concern)

mod game;
mod notify;
mod process;

pub use game::{GameServerFacade, PlayerInfo, ServerInfo};
pub use notify::Notifier;
pub use process::ProcessController;
