//! Registry error taxonomy.

use thiserror::Error;

use crate::ports::storage::StorageError;
use crate::ports::transport::TransportError;

/// Errors surfaced by registry operations.
///
/// A denied trust prompt is not an error: `resolve_connection` returns
/// `Ok(None)` in that case. Persisted side effects (trust decisions, saved
/// inputs) are deliberately kept when a later pipeline step fails, so a
/// retried call skips already-answered prompts.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The referenced collection is not registered.
    #[error("MCP collection not found: {0}")]
    CollectionNotFound(String),

    /// The referenced server definition is not in its collection.
    #[error("MCP server definition not found: {0}")]
    DefinitionNotFound(String),

    /// The collection's custom launch resolver failed.
    #[error("launch resolution failed for {definition}: {message}")]
    LaunchResolution {
        /// Definition whose launch could not be produced.
        definition: String,
        /// Failure reported by the resolver.
        message: String,
    },

    /// Variable references remained unresolved after both passes.
    #[error("unresolved variables in launch configuration: {}", .0.join(", "))]
    UnresolvedVariables(Vec<String>),

    /// The resolution backend failed.
    #[error("variable resolution backend error: {0}")]
    Backend(String),

    /// No registered delegate can start the server.
    #[error("no delegate available to start server: {0}")]
    NoDelegate(String),

    /// Transport establishment failed; propagated from the delegate.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Persisted storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
