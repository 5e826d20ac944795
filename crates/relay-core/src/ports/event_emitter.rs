//! Event emitter trait for cross-crate event broadcasting.
//!
//! Implementations handle transport details (channels, UI bridges, SSE).
//! The registry only calls `emit` and never blocks on it.

use crate::events::RegistryEvent;

/// Trait for emitting registry events.
pub trait RegistryEventEmitter: Send + Sync {
    /// Emit an event. Implementations should buffer or forward without
    /// blocking.
    fn emit(&self, event: RegistryEvent);
}

/// A no-op event emitter for tests and contexts without listeners.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl RegistryEventEmitter for NoopEmitter {
    fn emit(&self, _event: RegistryEvent) {
        // Intentionally do nothing
    }
}
