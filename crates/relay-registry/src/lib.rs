//! MCP connection registry.
//!
//! This crate decides, for any requested MCP server, whether a connection
//! may be established (trust gating), how its launch parameters are
//! finalized (variable substitution with memoized inputs), and which host
//! delegate starts it — then hands back a live connection handle.
//!
//! The entry point is [`McpRegistry`]; the pieces it composes are public for
//! callers that need them in isolation.

#![deny(unsafe_code)]

mod connection;
mod delegates;
mod discovery;
mod registry;
mod store;
mod trust;
mod variables;

pub use connection::McpServerConnection;
pub use delegates::{DelegateRegistration, DelegateRegistry};
pub use discovery::LazyDiscoveryCoordinator;
pub use registry::{McpRegistry, ResolveConnectionOptions};
pub use store::{CollectionRegistration, CollectionStore, CollectionUpsert};
pub use trust::{TrustState, TrustStore};
pub use variables::VariableResolver;
