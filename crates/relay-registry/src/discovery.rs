//! Lazy collection discovery state machine.
//!
//! Tracks whether every registered collection's contents are known and
//! drives bulk "discover now" sweeps. Outside a sweep the state is derived
//! from the store: `HasUnknown` while any non-cached lazy placeholder is
//! registered, `AllKnown` otherwise. During a sweep the state is
//! `LoadingUnknown` and concurrent callers share the in-flight operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::watch;

use relay_core::{LazyCollectionState, McpCollection};

use crate::store::CollectionStore;

/// State machine driving lazy collection discovery.
pub struct LazyDiscoveryCoordinator {
    store: CollectionStore,
    state: watch::Sender<LazyCollectionState>,
    /// Set while a sweep owns the state; `refresh` backs off until cleared.
    loading: AtomicBool,
}

impl LazyDiscoveryCoordinator {
    /// Create a coordinator over the given store.
    pub fn new(store: CollectionStore) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            store,
            state: watch::Sender::new(LazyCollectionState::AllKnown),
            loading: AtomicBool::new(false),
        });
        coordinator.refresh();
        coordinator
    }

    /// Current state.
    pub fn state(&self) -> LazyCollectionState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LazyCollectionState> {
        self.state.subscribe()
    }

    /// Recompute the idle state from the store contents.
    ///
    /// No-op while a sweep is in flight; the sweep recomputes on completion.
    pub(crate) fn refresh(&self) {
        if self.loading.load(Ordering::Acquire) {
            return;
        }
        let next = Self::idle_state(&self.store.list());
        self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    fn idle_state(collections: &[Arc<McpCollection>]) -> LazyCollectionState {
        if collections.iter().any(|c| c.awaits_discovery()) {
            LazyCollectionState::HasUnknown
        } else {
            LazyCollectionState::AllKnown
        }
    }

    /// Load every non-cached lazy collection currently registered.
    ///
    /// Resolves immediately unless the state is `HasUnknown`. After all
    /// loads settle, every placeholder that is still present and still lazy
    /// (not replaced by a realized registration during the sweep) has its
    /// loader's `removed()` invoked exactly once and is removed from the
    /// store. Concurrent calls while a sweep is in flight await that sweep
    /// instead of starting another.
    pub async fn discover_collections(&self) {
        loop {
            match self.state() {
                LazyCollectionState::AllKnown => return,
                LazyCollectionState::LoadingUnknown => {
                    self.wait_for_sweep().await;
                    return;
                }
                LazyCollectionState::HasUnknown => {
                    if self
                        .loading
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        break;
                    }
                    // Another caller is entering the sweep; let it publish
                    // `LoadingUnknown` and join it on the next pass.
                    tokio::task::yield_now().await;
                }
            }
        }

        self.state.send_replace(LazyCollectionState::LoadingUnknown);

        let targets: Vec<Arc<McpCollection>> = self
            .store
            .list()
            .into_iter()
            .filter(|c| c.awaits_discovery())
            .collect();

        tracing::debug!(count = targets.len(), "discovering lazy MCP collections");

        let loads = targets.iter().map(|collection| {
            let loader = collection.lazy.as_ref().map(|lazy| lazy.loader.clone());
            async move {
                match loader {
                    Some(loader) => loader.load().await,
                    None => Ok(()),
                }
            }
        });

        for (collection, result) in targets.iter().zip(join_all(loads).await) {
            if let Err(error) = result {
                tracing::warn!(
                    collection_id = %collection.id,
                    error = %error,
                    "lazy collection discovery failed"
                );
            }
        }

        // Placeholders that were not replaced by a realized registration are
        // gone for good: notify their loaders and drop them from the store.
        for collection in &targets {
            if self.store.remove_exact(collection) {
                if let Some(lazy) = &collection.lazy {
                    lazy.loader.removed();
                }
            }
        }

        self.loading.store(false, Ordering::Release);
        self.refresh();
    }

    async fn wait_for_sweep(&self) {
        let mut rx = self.state.subscribe();
        while *rx.borrow_and_update() == LazyCollectionState::LoadingUnknown {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
