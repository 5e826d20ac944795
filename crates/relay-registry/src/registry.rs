//! The registry orchestrator.
//!
//! Composes the collection store, delegate registry, discovery coordinator,
//! trust store, and variable resolver behind one API. The resolution
//! pipeline for a connection runs strictly in order: trust gate, launch
//! resolution, variable substitution, delegate selection, transport start.
//! Persisted side effects (trust decisions, saved inputs) are deliberately
//! not rolled back when a later step fails, so a retried call skips
//! already-answered prompts.

use std::sync::Arc;

use tokio::sync::{watch, OnceCell};

use relay_core::{
    ConfigurationResolver, LazyCollectionState, McpCollection, McpHostDelegate, RegistryError,
    RegistryEvent, RegistryEventEmitter, ScopedStorage, StorageScope, TrustDialog,
};

use crate::connection::McpServerConnection;
use crate::delegates::{DelegateRegistration, DelegateRegistry};
use crate::discovery::LazyDiscoveryCoordinator;
use crate::store::{CollectionStore, CollectionUpsert};
use crate::trust::{TrustState, TrustStore};
use crate::variables::VariableResolver;

/// Arguments for [`McpRegistry::resolve_connection`].
#[derive(Debug, Clone)]
pub struct ResolveConnectionOptions {
    /// Id of the collection owning the server.
    pub collection_id: String,
    /// Id of the server definition within the collection.
    pub definition_id: String,
    /// Re-prompt for trust even when a decision is cached.
    pub force_trust: bool,
}

impl ResolveConnectionOptions {
    /// Options for an unforced resolution.
    pub fn new(collection_id: impl Into<String>, definition_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            definition_id: definition_id.into(),
            force_trust: false,
        }
    }

    /// Re-prompt for trust regardless of any cached decision.
    #[must_use]
    pub fn force_trust(mut self) -> Self {
        self.force_trust = true;
        self
    }
}

/// Connection registry for MCP server collections.
pub struct McpRegistry {
    collections: CollectionStore,
    delegates: DelegateRegistry,
    discovery: Arc<LazyDiscoveryCoordinator>,
    trust: TrustStore,
    variables: VariableResolver,
    emitter: Arc<dyn RegistryEventEmitter>,
    /// Completed once every delegate's startup discovery has been awaited.
    delegates_ready: OnceCell<()>,
}

impl McpRegistry {
    /// Create a registry over the given collaborators.
    pub fn new(
        storage: Arc<dyn ScopedStorage>,
        dialog: Arc<dyn TrustDialog>,
        resolver_backend: Arc<dyn ConfigurationResolver>,
        emitter: Arc<dyn RegistryEventEmitter>,
    ) -> Self {
        let collections = CollectionStore::new(emitter.clone());
        let discovery = LazyDiscoveryCoordinator::new(collections.clone());
        {
            let discovery = discovery.clone();
            collections.set_on_change(move || discovery.refresh());
        }

        Self {
            collections,
            delegates: DelegateRegistry::new(),
            discovery,
            trust: TrustStore::new(storage.clone(), dialog, emitter.clone()),
            variables: VariableResolver::new(resolver_backend, storage),
            emitter,
            delegates_ready: OnceCell::new(),
        }
    }

    /// Register a collection, replacing any entry with the same id.
    pub fn register_collection(&self, collection: Arc<McpCollection>) -> CollectionUpsert {
        self.collections.register(collection)
    }

    /// Snapshot the registered collections.
    pub fn collections(&self) -> Vec<Arc<McpCollection>> {
        self.collections.list()
    }

    /// Subscribe to collection list changes.
    pub fn watch_collections(&self) -> watch::Receiver<Vec<Arc<McpCollection>>> {
        self.collections.subscribe()
    }

    /// Enable or disable collection visibility, mirroring a host enablement
    /// setting.
    ///
    /// While disabled, registered collections are hidden from
    /// [`Self::collections`] and subscribers (and cannot be resolved);
    /// re-enabling restores them.
    pub fn set_enabled(&self, enabled: bool) {
        self.collections.set_enabled(enabled);
    }

    /// Register a host delegate.
    pub fn register_delegate(&self, delegate: Arc<dyn McpHostDelegate>) -> DelegateRegistration {
        self.delegates.register(delegate)
    }

    /// Snapshot the delegates, highest priority first.
    pub fn delegates(&self) -> Vec<Arc<dyn McpHostDelegate>> {
        self.delegates.list()
    }

    /// Current lazy collection state.
    pub fn lazy_collection_state(&self) -> LazyCollectionState {
        self.discovery.state()
    }

    /// Subscribe to lazy collection state transitions.
    pub fn watch_lazy_collection_state(&self) -> watch::Receiver<LazyCollectionState> {
        self.discovery.subscribe()
    }

    /// Load every non-cached lazy collection. Concurrent calls share one
    /// sweep.
    pub async fn discover_collections(&self) {
        self.discovery.discover_collections().await;
    }

    /// Trust state of a registered collection, without prompting.
    pub async fn trust_state(&self, collection_id: &str) -> Result<TrustState, RegistryError> {
        let collection = self
            .collections
            .find(collection_id)
            .ok_or_else(|| RegistryError::CollectionNotFound(collection_id.to_string()))?;
        self.trust.is_trusted(&collection).await
    }

    /// Purge memoized variable inputs for a scope.
    pub async fn clear_saved_inputs(&self, scope: StorageScope) -> Result<(), RegistryError> {
        self.variables.clear_saved_inputs(scope).await
    }

    /// Resolve a connection for a server definition.
    ///
    /// Returns `Ok(None)` when the user declines trust; every other failure
    /// mode is an error. On success the returned connection is owned by the
    /// caller and the underlying transport is already started.
    pub async fn resolve_connection(
        &self,
        options: ResolveConnectionOptions,
    ) -> Result<Option<McpServerConnection>, RegistryError> {
        // Let delegates finish their own startup discovery before the very
        // first resolution attempt.
        self.delegates_ready
            .get_or_init(|| async {
                for delegate in self.delegates.list() {
                    delegate.wait_for_initial_providers().await;
                }
            })
            .await;

        let collection = self
            .collections
            .find(&options.collection_id)
            .ok_or_else(|| RegistryError::CollectionNotFound(options.collection_id.clone()))?;
        let definition = collection
            .server_definitions
            .get()
            .into_iter()
            .find(|d| d.id == options.definition_id)
            .ok_or_else(|| RegistryError::DefinitionNotFound(options.definition_id.clone()))?;

        // Step 1: trust gate. A denial is a normal outcome, not an error.
        if !self.trust.confirm(&collection, options.force_trust).await? {
            tracing::info!(
                collection_id = %collection.id,
                definition_id = %definition.id,
                "connection not resolved: collection is not trusted"
            );
            return Ok(None);
        }

        // Step 2: base launch, from the collection's hook if it has one.
        let base_launch = match &collection.launch_resolver {
            Some(resolver) => resolver.resolve_launch(&definition).await.map_err(|e| {
                RegistryError::LaunchResolution {
                    definition: definition.id.clone(),
                    message: e.to_string(),
                }
            })?,
            None => definition.launch.clone(),
        };

        // Step 3: variable substitution.
        let launch = match &definition.variable_replacement {
            Some(replacement) => self.variables.resolve(&base_launch, replacement).await?,
            None => base_launch,
        };

        // Step 4: delegate selection, highest priority first.
        let delegate = self
            .delegates
            .list()
            .into_iter()
            .find(|d| d.can_start(&collection, &definition))
            .ok_or_else(|| RegistryError::NoDelegate(definition.label.clone()))?;

        // Step 5: start the transport.
        let transport = delegate.start(&collection, &definition, &launch).await?;

        tracing::info!(
            collection_id = %collection.id,
            definition_id = %definition.id,
            "MCP server connection established"
        );
        self.emitter
            .emit(RegistryEvent::connection_opened(&collection.id, &definition.id));

        Ok(Some(McpServerConnection::new(definition, launch, transport)))
    }
}
