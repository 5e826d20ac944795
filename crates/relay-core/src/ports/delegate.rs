//! Host delegate port.
//!
//! A delegate is a pluggable backend capable of starting a transport for a
//! server definition (local process host, remote host, test harness). The
//! registry consults delegates in descending priority order and uses the
//! first one that can start the requested server.

use async_trait::async_trait;

use crate::domain::{McpCollection, McpServerDefinition, McpServerLaunch};
use crate::ports::transport::{McpMessageTransport, TransportError};

/// Transport-starting backend.
#[async_trait]
pub trait McpHostDelegate: Send + Sync {
    /// Selection priority; higher wins. Ties keep registration order.
    fn priority(&self) -> i32 {
        0
    }

    /// Completes once the delegate's own startup discovery has finished.
    ///
    /// Awaited for every registered delegate before the registry's first
    /// resolution attempt.
    async fn wait_for_initial_providers(&self) {}

    /// Whether this delegate can start the given server.
    fn can_start(&self, collection: &McpCollection, definition: &McpServerDefinition) -> bool;

    /// Start the server and return its transport.
    async fn start(
        &self,
        collection: &McpCollection,
        definition: &McpServerDefinition,
        launch: &McpServerLaunch,
    ) -> Result<Box<dyn McpMessageTransport>, TransportError>;
}
