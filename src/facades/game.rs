//! # Query/command facade of the managed game server.
//!
//! [`GameServerFacade`] is the polling surface the monitors observe the
//! server through. Queries return [`FacadeError`] on failure — always
//! treated as transient, retried by the caller's [`RetryPolicy`] and never
//! allowed to mutate tracked state. The command surface (`announce`,
//! `request_stop`) reports plain success/failure; its transport mechanics,
//! retry wrapping and message formatting belong to the implementation.
//!
//! [`RetryPolicy`]: crate::RetryPolicy
//! [`FacadeError`]: crate::FacadeError

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FacadeError;

/// One entry of the player-list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    /// Player identifier as reported by the server.
    pub name: String,
}

/// Deep server information returned by the info query.
///
/// The monitors only time this call and check it answered; the payload is
/// surfaced to handlers and status consumers as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server display name.
    pub name: String,
    /// Server build/version string.
    pub version: String,
}

/// Polling facade over the managed game server.
#[async_trait]
pub trait GameServerFacade: Send + Sync + 'static {
    /// Queries the current player list.
    async fn players(&self) -> Result<Vec<PlayerInfo>, FacadeError>;

    /// Queries deep server information; used by the health check to measure
    /// responsiveness.
    async fn server_info(&self) -> Result<ServerInfo, FacadeError>;

    /// Broadcasts a message to connected players. Returns delivery success.
    async fn announce(&self, text: &str) -> bool;

    /// Asks the server to shut itself down after `wait`, showing `message`
    /// to players. Returns whether the request was accepted.
    async fn request_stop(&self, wait: Duration, message: &str) -> bool;
}
