//! Canonical event union for registry adapters.
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "collection_registered", "collection": { "id": "ws", "label": "Workspace", "lazy": false } }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::McpCollection;

/// Summary of a collection for event payloads.
///
/// A lightweight representation for events — not the full [`McpCollection`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    /// Collection id.
    pub id: String,
    /// Human-readable name.
    pub label: String,
    /// Whether the collection is still an unresolved placeholder.
    pub lazy: bool,
}

impl CollectionSummary {
    /// Summarize a collection.
    pub fn of(collection: &McpCollection) -> Self {
        Self {
            id: collection.id.clone(),
            label: collection.label.clone(),
            lazy: collection.lazy.is_some(),
        }
    }
}

/// Registry lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A collection was registered (or replaced an entry with the same id).
    CollectionRegistered {
        /// The registered collection.
        collection: CollectionSummary,
    },

    /// A collection was removed.
    CollectionRemoved {
        /// Id of the removed collection.
        #[serde(rename = "collectionId")]
        collection_id: String,
    },

    /// A trust decision was persisted for a collection.
    TrustUpdated {
        /// Id of the collection.
        #[serde(rename = "collectionId")]
        collection_id: String,
        /// The user's decision.
        trusted: bool,
    },

    /// A connection to a server was established.
    ConnectionOpened {
        /// Id of the owning collection.
        #[serde(rename = "collectionId")]
        collection_id: String,
        /// Id of the server definition.
        #[serde(rename = "definitionId")]
        definition_id: String,
    },
}

impl RegistryEvent {
    /// Create a collection registered event.
    pub fn collection_registered(collection: &McpCollection) -> Self {
        Self::CollectionRegistered {
            collection: CollectionSummary::of(collection),
        }
    }

    /// Create a collection removed event.
    pub fn collection_removed(collection_id: impl Into<String>) -> Self {
        Self::CollectionRemoved {
            collection_id: collection_id.into(),
        }
    }

    /// Create a trust updated event.
    pub fn trust_updated(collection_id: impl Into<String>, trusted: bool) -> Self {
        Self::TrustUpdated {
            collection_id: collection_id.into(),
            trusted,
        }
    }

    /// Create a connection opened event.
    pub fn connection_opened(
        collection_id: impl Into<String>,
        definition_id: impl Into<String>,
    ) -> Self {
        Self::ConnectionOpened {
            collection_id: collection_id.into(),
            definition_id: definition_id.into(),
        }
    }
}
