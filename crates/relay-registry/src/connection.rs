//! Live connection handle returned by `resolve_connection`.

use std::fmt;
use std::sync::Arc;

use relay_core::{McpMessageTransport, McpServerDefinition, McpServerLaunch};

/// A started MCP server connection.
///
/// Owned exclusively by the caller. Dropping it stops the transport; trust
/// records and saved variable inputs outlive the connection.
pub struct McpServerConnection {
    definition: Arc<McpServerDefinition>,
    launch_definition: McpServerLaunch,
    transport: Box<dyn McpMessageTransport>,
}

impl McpServerConnection {
    pub(crate) fn new(
        definition: Arc<McpServerDefinition>,
        launch_definition: McpServerLaunch,
        transport: Box<dyn McpMessageTransport>,
    ) -> Self {
        Self {
            definition,
            launch_definition,
            transport,
        }
    }

    /// The definition this connection was resolved for.
    pub fn definition(&self) -> &Arc<McpServerDefinition> {
        &self.definition
    }

    /// The launch configuration after variable substitution.
    pub fn launch_definition(&self) -> &McpServerLaunch {
        &self.launch_definition
    }

    /// The live transport.
    pub fn transport(&self) -> &dyn McpMessageTransport {
        self.transport.as_ref()
    }

    /// Stop the transport and drop the handle.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for McpServerConnection {
    fn drop(&mut self) {
        self.transport.stop();
        tracing::debug!(
            definition_id = %self.definition.id,
            "MCP server connection closed"
        );
    }
}

impl fmt::Debug for McpServerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpServerConnection")
            .field("definition", &self.definition.id)
            .field("launch_definition", &self.launch_definition)
            .finish_non_exhaustive()
    }
}
