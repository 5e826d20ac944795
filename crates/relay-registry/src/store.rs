//! Deduplicated, observable collection store.
//!
//! Collections are keyed by id: registering a collection whose id matches an
//! existing entry replaces that entry in place, as a single observable
//! update. Registration returns an explicit upsert result — the previous
//! occupant (if any) plus a disposal handle — so replace-vs-insert is a
//! first-class outcome rather than an inferred side effect.
//!
//! The store also carries an enablement flag mirroring a host setting: while
//! disabled it publishes an empty list, keeping registrations intact so they
//! reappear on re-enable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use tokio::sync::watch;

use relay_core::{McpCollection, ObservableList, RegistryEvent, RegistryEventEmitter};

struct StoreEntry {
    /// Monotonic tag distinguishing this occupant from later ones with the
    /// same id; disposal only removes a matching generation.
    generation: u64,
    collection: Arc<McpCollection>,
}

struct StoreInner {
    entries: Vec<StoreEntry>,
    next_generation: u64,
}

struct StoreShared {
    inner: Mutex<StoreInner>,
    observable: ObservableList<Arc<McpCollection>>,
    emitter: Arc<dyn RegistryEventEmitter>,
    /// Mirrors the host enablement setting; gates what `publish` exposes.
    enabled: AtomicBool,
    /// Invoked after every mutation; wired to the discovery coordinator.
    on_change: OnceLock<Box<dyn Fn() + Send + Sync>>,
}

impl StoreShared {
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &StoreInner) {
        let items = if self.enabled.load(Ordering::Acquire) {
            inner.entries.iter().map(|e| e.collection.clone()).collect()
        } else {
            Vec::new()
        };
        self.observable.set(items);
    }

    fn changed(&self) {
        if let Some(hook) = self.on_change.get() {
            hook();
        }
    }

    /// Remove the occupant with this id only if its generation still matches.
    fn remove_generation(&self, collection_id: &str, generation: u64) -> bool {
        let removed = {
            let mut inner = self.lock();
            let position = inner
                .entries
                .iter()
                .position(|e| e.collection.id == collection_id && e.generation == generation);
            match position {
                Some(position) => {
                    inner.entries.remove(position);
                    self.publish(&inner);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.emitter
                .emit(RegistryEvent::collection_removed(collection_id));
            self.changed();
        }
        removed
    }
}

/// Result of registering a collection.
pub struct CollectionUpsert {
    /// The entry this registration replaced, if the id was already taken.
    pub previous: Option<Arc<McpCollection>>,
    /// Handle whose disposal removes exactly this occupant.
    pub handle: CollectionRegistration,
}

/// Disposal handle for a registered collection.
///
/// Dropping it removes the collection from the store; a no-op if the entry
/// was already superseded by a later registration with the same id or
/// removed by a discovery sweep.
pub struct CollectionRegistration {
    shared: Weak<StoreShared>,
    collection_id: String,
    generation: u64,
}

impl CollectionRegistration {
    /// Remove the registration now instead of at drop time.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for CollectionRegistration {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.remove_generation(&self.collection_id, self.generation);
        }
    }
}

/// Observable set of collection definitions, deduplicated by id.
#[derive(Clone)]
pub struct CollectionStore {
    shared: Arc<StoreShared>,
}

impl CollectionStore {
    /// Create an empty store.
    pub fn new(emitter: Arc<dyn RegistryEventEmitter>) -> Self {
        Self {
            shared: Arc::new(StoreShared {
                inner: Mutex::new(StoreInner {
                    entries: Vec::new(),
                    next_generation: 0,
                }),
                observable: ObservableList::default(),
                emitter,
                enabled: AtomicBool::new(true),
                on_change: OnceLock::new(),
            }),
        }
    }

    /// Install the change hook. Later calls are ignored.
    pub(crate) fn set_on_change(&self, hook: impl Fn() + Send + Sync + 'static) {
        let _ = self.shared.on_change.set(Box::new(hook));
    }

    /// Toggle collection visibility.
    ///
    /// While disabled the store publishes an empty list; registrations are
    /// kept and become visible again once re-enabled.
    pub fn set_enabled(&self, enabled: bool) {
        if self.shared.enabled.swap(enabled, Ordering::AcqRel) == enabled {
            return;
        }
        {
            let inner = self.shared.lock();
            self.shared.publish(&inner);
        }
        self.shared.changed();
    }

    /// Register a collection, replacing any existing entry with the same id
    /// in a single observable update.
    pub fn register(&self, collection: Arc<McpCollection>) -> CollectionUpsert {
        let previous;
        let generation;
        {
            let mut inner = self.shared.lock();
            generation = inner.next_generation;
            inner.next_generation += 1;
            let entry = StoreEntry {
                generation,
                collection: collection.clone(),
            };
            let position = inner
                .entries
                .iter()
                .position(|e| e.collection.id == collection.id);
            previous = match position {
                Some(position) => {
                    Some(std::mem::replace(&mut inner.entries[position], entry).collection)
                }
                None => {
                    inner.entries.push(entry);
                    None
                }
            };
            self.shared.publish(&inner);
        }

        tracing::debug!(
            collection_id = %collection.id,
            lazy = collection.lazy.is_some(),
            replaced = previous.is_some(),
            "MCP collection registered"
        );
        self.shared
            .emitter
            .emit(RegistryEvent::collection_registered(&collection));
        self.shared.changed();

        CollectionUpsert {
            previous,
            handle: CollectionRegistration {
                shared: Arc::downgrade(&self.shared),
                collection_id: collection.id.clone(),
                generation,
            },
        }
    }

    /// Remove a collection only if this exact instance is still registered.
    ///
    /// Used by the discovery sweep so a placeholder that was replaced during
    /// its own load is left alone.
    pub(crate) fn remove_exact(&self, collection: &Arc<McpCollection>) -> bool {
        let generation = {
            let inner = self.shared.lock();
            inner
                .entries
                .iter()
                .find(|e| Arc::ptr_eq(&e.collection, collection))
                .map(|e| e.generation)
        };
        generation.is_some_and(|generation| {
            self.shared.remove_generation(&collection.id, generation)
        })
    }

    /// Snapshot the registered collections.
    pub fn list(&self) -> Vec<Arc<McpCollection>> {
        self.shared.observable.get()
    }

    /// Look up a collection by id.
    pub fn find(&self, collection_id: &str) -> Option<Arc<McpCollection>> {
        self.shared
            .observable
            .get()
            .into_iter()
            .find(|c| c.id == collection_id)
    }

    /// Subscribe to collection list changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Arc<McpCollection>>> {
        self.shared.observable.subscribe()
    }
}
