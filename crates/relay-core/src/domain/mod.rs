//! Domain model for the relay MCP registry.
//!
//! - `collection` - Collections of server definitions, trust/scope policy,
//!   and the lazy-discovery metadata and state machine states
//! - `definition` - Individual server definitions and launch configurations

mod collection;
mod definition;

pub use collection::{
    ConfigTarget, LazyCollectionMetadata, LazyCollectionState, McpCollection, StorageScope,
};
pub use definition::{McpServerDefinition, McpServerLaunch, VariableReplacement};
