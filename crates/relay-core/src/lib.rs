//! Core domain types and port definitions for the relay MCP registry.
//!
//! This crate holds everything the registry machinery consumes but does not
//! implement itself: the domain model (collections, server definitions,
//! launch configurations), the capability traits owned by collaborators
//! (storage, dialogs, variable resolution, host delegates, transports), and
//! the event union emitted to adapters. It deliberately carries no adapter
//! dependencies so that every port stays mockable in isolation.

pub mod domain;
pub mod events;
pub mod observable;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    ConfigTarget, LazyCollectionMetadata, LazyCollectionState, McpCollection,
    McpServerDefinition, McpServerLaunch, StorageScope, VariableReplacement,
};
pub use events::{CollectionSummary, RegistryEvent};
pub use observable::ObservableList;
pub use ports::{
    CollectionLoader, ConfigurationResolver, LaunchResolver, McpHostDelegate,
    McpMessageTransport, MemoryStorage, NoopEmitter, RegistryError, RegistryEventEmitter,
    ResolverBackendError, ScopedStorage, StorageError, TransportError, TrustDialog,
    TrustPromptRequest,
};
