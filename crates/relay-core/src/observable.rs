//! Versioned observable list container.
//!
//! The registry exposes its collection and delegate sets as live lists that
//! consumers can read synchronously or subscribe to. This container replaces
//! polling with an explicit publish/subscribe pair: every `set` is a single
//! atomic update on a [`tokio::sync::watch`] channel, so subscribers never
//! observe a transient intermediate state.

use tokio::sync::watch;

/// A list whose current value can be read at any time and whose changes can
/// be awaited through a watch subscription.
pub struct ObservableList<T> {
    tx: watch::Sender<Vec<T>>,
}

impl<T: Clone> ObservableList<T> {
    /// Create a list with the given initial contents.
    pub fn new(initial: Vec<T>) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    /// Snapshot the current contents.
    pub fn get(&self) -> Vec<T> {
        self.tx.borrow().clone()
    }

    /// Replace the contents in one atomic update.
    ///
    /// Subscribers see either the previous list or the new one, never an
    /// empty intermediate.
    pub fn set(&self, items: Vec<T>) {
        let _ = self.tx.send_replace(items);
    }

    /// Subscribe to changes. The receiver starts out marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
