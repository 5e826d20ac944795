//! Port (capability) traits consumed by the registry.
//!
//! Each port is owned by a collaborator outside the core: storage backends,
//! dialog surfaces, variable resolution, host delegates, and transports.
//! Implementations are injected as `Arc<dyn Trait>` so the registry machinery
//! stays testable in isolation.

mod delegate;
mod dialog;
mod error;
mod event_emitter;
mod loader;
mod resolver;
mod storage;
mod transport;

pub use delegate::McpHostDelegate;
pub use dialog::{TrustDialog, TrustPromptRequest};
pub use error::RegistryError;
pub use event_emitter::{NoopEmitter, RegistryEventEmitter};
pub use loader::{CollectionLoader, LaunchResolver};
pub use resolver::{ConfigurationResolver, ResolverBackendError};
pub use storage::{MemoryStorage, ScopedStorage, StorageError};
pub use transport::{McpMessageTransport, TransportError};
