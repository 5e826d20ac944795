//! Per-collection trust decisions.
//!
//! Trust is a persisted user decision gating whether a collection's servers
//! may be launched. Records live in scoped storage under one JSON document
//! per scope, keyed by collection id, so clearing a storage scope also
//! invalidates the trust records it contains.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relay_core::{
    McpCollection, RegistryError, RegistryEvent, RegistryEventEmitter, ScopedStorage,
    StorageScope, TrustDialog, TrustPromptRequest,
};

/// Storage key for the per-scope trust document.
const TRUST_STORAGE_KEY: &str = "mcp.collectionTrust";

/// Tri-state trust for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustState {
    /// No persisted record and the collection is not trusted by default.
    Unknown,
    /// Trusted, by record or by default.
    Trusted,
    /// The user declined trust.
    Untrusted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrustRecord {
    trusted: bool,
    decided_at: DateTime<Utc>,
}

/// Persisted trust cache gated by a user-facing confirmation dialog.
pub struct TrustStore {
    storage: Arc<dyn ScopedStorage>,
    dialog: Arc<dyn TrustDialog>,
    emitter: Arc<dyn RegistryEventEmitter>,
}

impl TrustStore {
    /// Create a trust store over the given storage and dialog.
    pub fn new(
        storage: Arc<dyn ScopedStorage>,
        dialog: Arc<dyn TrustDialog>,
        emitter: Arc<dyn RegistryEventEmitter>,
    ) -> Self {
        Self {
            storage,
            dialog,
            emitter,
        }
    }

    /// Read the trust state of a collection without prompting.
    pub async fn is_trusted(&self, collection: &McpCollection) -> Result<TrustState, RegistryError> {
        let records = self.read_records(collection.scope).await?;
        Ok(match records.get(&collection.id) {
            Some(record) if record.trusted => TrustState::Trusted,
            Some(_) => TrustState::Untrusted,
            None if collection.trusted_by_default => TrustState::Trusted,
            None => TrustState::Unknown,
        })
    }

    /// Decide whether the collection's servers may be launched.
    ///
    /// Default-trusted collections pass without prompting unless
    /// `force_trust` is set. A persisted record answers without prompting
    /// unless `force_trust` re-asks. Otherwise the dialog decides; an
    /// explicit answer is persisted, a dismissed prompt denies without
    /// persisting anything (the next attempt asks again).
    pub async fn confirm(
        &self,
        collection: &McpCollection,
        force_trust: bool,
    ) -> Result<bool, RegistryError> {
        if collection.trusted_by_default && !force_trust {
            return Ok(true);
        }

        if !force_trust {
            let records = self.read_records(collection.scope).await?;
            if let Some(record) = records.get(&collection.id) {
                return Ok(record.trusted);
            }
        }

        let server_labels: Vec<String> = collection
            .server_definitions
            .get()
            .iter()
            .map(|d| d.label.clone())
            .collect();
        let request = TrustPromptRequest {
            collection_label: collection.label.clone(),
            message: format!(
                "'{}' wants to start MCP servers on your behalf. Do you trust it?",
                collection.label
            ),
            server_labels,
        };

        match self.dialog.prompt(request).await {
            Some(trusted) => {
                // Re-read after the prompt: records persisted for other
                // collections in this scope while it was open must survive
                // the write below.
                let mut records = self.read_records(collection.scope).await?;
                records.insert(
                    collection.id.clone(),
                    TrustRecord {
                        trusted,
                        decided_at: Utc::now(),
                    },
                );
                self.write_records(collection.scope, &records).await?;
                tracing::info!(
                    collection_id = %collection.id,
                    trusted,
                    "trust decision recorded"
                );
                self.emitter
                    .emit(RegistryEvent::trust_updated(&collection.id, trusted));
                Ok(trusted)
            }
            // Dismissed: deny this attempt but keep the question open
            None => Ok(false),
        }
    }

    async fn read_records(
        &self,
        scope: StorageScope,
    ) -> Result<BTreeMap<String, TrustRecord>, RegistryError> {
        let raw = self.storage.get(scope, TRUST_STORAGE_KEY).await?;
        Ok(raw
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(records) => Some(records),
                Err(error) => {
                    tracing::warn!(%error, "discarding unreadable trust records");
                    None
                }
            })
            .unwrap_or_default())
    }

    async fn write_records(
        &self,
        scope: StorageScope,
        records: &BTreeMap<String, TrustRecord>,
    ) -> Result<(), RegistryError> {
        let raw = serde_json::to_string(records)
            .map_err(|e| RegistryError::Backend(e.to_string()))?;
        self.storage.set(scope, TRUST_STORAGE_KEY, raw).await?;
        Ok(())
    }
}
