//! Message transport port.
//!
//! The protocol spoken over an established connection is out of scope for
//! the registry; it only needs to hold the transport and tear it down when
//! the connection is dropped.

use thiserror::Error;

/// Errors while establishing a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server process could not be spawned.
    #[error("failed to launch server process: {0}")]
    SpawnFailed(String),

    /// The transport closed or misbehaved during startup.
    #[error("transport failed during startup: {0}")]
    StartupFailed(String),
}

/// A live channel to a started MCP server.
pub trait McpMessageTransport: Send + Sync {
    /// Tear down the underlying channel. Must be idempotent.
    fn stop(&self);
}
