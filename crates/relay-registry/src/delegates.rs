//! Ordered registry of host delegates.
//!
//! Delegates are published sorted by descending priority, stable by
//! registration order for equal priorities. Selection simply walks the
//! published order and takes the first delegate that can start the server.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;

use relay_core::{McpHostDelegate, ObservableList};

struct DelegateEntry {
    sequence: u64,
    delegate: Arc<dyn McpHostDelegate>,
}

struct RegistryInner {
    entries: Vec<DelegateEntry>,
    next_sequence: u64,
}

struct RegistryShared {
    inner: Mutex<RegistryInner>,
    observable: ObservableList<Arc<dyn McpHostDelegate>>,
}

impl RegistryShared {
    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &RegistryInner) {
        let mut ordered: Vec<&DelegateEntry> = inner.entries.iter().collect();
        ordered.sort_by(|a, b| {
            b.delegate
                .priority()
                .cmp(&a.delegate.priority())
                .then(a.sequence.cmp(&b.sequence))
        });
        self.observable
            .set(ordered.into_iter().map(|e| e.delegate.clone()).collect());
    }

    fn remove(&self, sequence: u64) {
        let mut inner = self.lock();
        if let Some(position) = inner.entries.iter().position(|e| e.sequence == sequence) {
            inner.entries.remove(position);
            self.publish(&inner);
        }
    }
}

/// Disposal handle for a registered delegate.
pub struct DelegateRegistration {
    shared: Weak<RegistryShared>,
    sequence: u64,
}

impl DelegateRegistration {
    /// Remove the registration now instead of at drop time.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for DelegateRegistration {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.remove(self.sequence);
        }
    }
}

/// Ordered set of transport-starting backends.
#[derive(Clone)]
pub struct DelegateRegistry {
    shared: Arc<RegistryShared>,
}

impl DelegateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                inner: Mutex::new(RegistryInner {
                    entries: Vec::new(),
                    next_sequence: 0,
                }),
                observable: ObservableList::default(),
            }),
        }
    }

    /// Register a delegate.
    pub fn register(&self, delegate: Arc<dyn McpHostDelegate>) -> DelegateRegistration {
        let sequence = {
            let mut inner = self.shared.lock();
            let sequence = inner.next_sequence;
            inner.next_sequence += 1;
            inner.entries.push(DelegateEntry {
                sequence,
                delegate,
            });
            self.shared.publish(&inner);
            sequence
        };
        DelegateRegistration {
            shared: Arc::downgrade(&self.shared),
            sequence,
        }
    }

    /// Snapshot the delegates, highest priority first.
    pub fn list(&self) -> Vec<Arc<dyn McpHostDelegate>> {
        self.shared.observable.get()
    }

    /// Subscribe to delegate list changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Arc<dyn McpHostDelegate>>> {
        self.shared.observable.subscribe()
    }
}

impl Default for DelegateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_core::{
        McpCollection, McpMessageTransport, McpServerDefinition, McpServerLaunch, TransportError,
    };

    struct StubTransport;

    impl McpMessageTransport for StubTransport {
        fn stop(&self) {}
    }

    struct StubDelegate {
        priority: i32,
    }

    #[async_trait]
    impl McpHostDelegate for StubDelegate {
        fn priority(&self) -> i32 {
            self.priority
        }

        fn can_start(&self, _: &McpCollection, _: &McpServerDefinition) -> bool {
            true
        }

        async fn start(
            &self,
            _: &McpCollection,
            _: &McpServerDefinition,
            _: &McpServerLaunch,
        ) -> Result<Box<dyn McpMessageTransport>, TransportError> {
            Ok(Box::new(StubTransport))
        }
    }

    fn priorities(registry: &DelegateRegistry) -> Vec<i32> {
        registry.list().iter().map(|d| d.priority()).collect()
    }

    #[test]
    fn test_register_and_dispose() {
        let registry = DelegateRegistry::new();
        let registration = registry.register(Arc::new(StubDelegate { priority: 0 }));
        assert_eq!(registry.list().len(), 1);

        registration.dispose();
        assert_eq!(registry.list().len(), 0);
    }

    #[test]
    fn test_ordered_by_descending_priority() {
        let registry = DelegateRegistry::new();
        let first_low = Arc::new(StubDelegate { priority: 1 });
        let _a = registry.register(first_low.clone());
        let _b = registry.register(Arc::new(StubDelegate { priority: 10 }));
        let _c = registry.register(Arc::new(StubDelegate { priority: 1 }));

        assert_eq!(priorities(&registry), vec![10, 1, 1]);
        // Stable for equal priority: the earlier registration comes first
        let listed = registry.list();
        assert!(Arc::ptr_eq(&listed[1], &(first_low as Arc<dyn McpHostDelegate>)));
    }
}
