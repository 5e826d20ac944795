//! Collection domain types.
//!
//! A collection is a named group of server definitions sharing one trust and
//! scope policy. Collections are registered with the registry either fully
//! realized (their definitions are known) or lazy (a placeholder awaiting an
//! asynchronous discovery step).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::definition::McpServerDefinition;
use crate::observable::ObservableList;
use crate::ports::{CollectionLoader, LaunchResolver};

/// Storage partition for persisted state (trust records, saved inputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageScope {
    /// Application-wide state, shared across workspaces.
    Application,
    /// State scoped to the current workspace.
    Workspace,
}

/// Configuration layer a collection's settings were declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigTarget {
    /// User-level configuration.
    User,
    /// Workspace-level configuration.
    Workspace,
}

impl ConfigTarget {
    /// Storage partition that persisted values for this target live in.
    #[must_use]
    pub const fn storage_scope(self) -> StorageScope {
        match self {
            Self::User => StorageScope::Application,
            Self::Workspace => StorageScope::Workspace,
        }
    }
}

/// Whether every collection's contents are known yet.
///
/// `LoadingUnknown` is only entered while a discovery sweep is in flight;
/// outside a sweep the state is derived from the registered collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LazyCollectionState {
    /// Every registered collection is realized or cached.
    #[default]
    AllKnown,
    /// At least one non-cached lazy collection is registered.
    HasUnknown,
    /// A discovery sweep is currently loading lazy collections.
    LoadingUnknown,
}

/// Discovery metadata carried by a lazy collection until it is realized.
#[derive(Clone)]
pub struct LazyCollectionMetadata {
    /// Cached placeholders count as "known" and are not loaded eagerly.
    pub is_cached: bool,
    /// Loader invoked by a discovery sweep; also notified when the
    /// placeholder is removed without being realized.
    pub loader: Arc<dyn CollectionLoader>,
}

impl fmt::Debug for LazyCollectionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCollectionMetadata")
            .field("is_cached", &self.is_cached)
            .finish_non_exhaustive()
    }
}

/// A named group of MCP server definitions sharing a trust/scope policy.
///
/// Collections are identified by `id`: registering a collection whose id
/// matches an existing entry replaces that entry. A realized collection has
/// concrete `server_definitions`; a lazy one carries [`LazyCollectionMetadata`]
/// until discovery realizes or removes it.
pub struct McpCollection {
    /// Unique key within the registry.
    pub id: String,
    /// Human-readable name, used in trust prompts.
    pub label: String,
    /// Storage partition for this collection's persisted state.
    pub scope: StorageScope,
    /// Configuration layer the collection was declared in.
    pub config_target: ConfigTarget,
    /// Whether servers may start without asking the user first.
    pub trusted_by_default: bool,
    /// Live, ordered sequence of server definitions.
    pub server_definitions: ObservableList<Arc<McpServerDefinition>>,
    /// Present while the collection is an unresolved placeholder.
    pub lazy: Option<LazyCollectionMetadata>,
    /// Optional hook that produces the base launch configuration instead of
    /// `definition.launch` (e.g. to inject collection-level settings).
    pub launch_resolver: Option<Arc<dyn LaunchResolver>>,
}

impl McpCollection {
    /// Create a realized collection with no definitions yet.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        scope: StorageScope,
        config_target: ConfigTarget,
        trusted_by_default: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            scope,
            config_target,
            trusted_by_default,
            server_definitions: ObservableList::default(),
            lazy: None,
            launch_resolver: None,
        }
    }

    /// Mark this collection as a lazy placeholder.
    #[must_use]
    pub fn with_lazy(mut self, is_cached: bool, loader: Arc<dyn CollectionLoader>) -> Self {
        self.lazy = Some(LazyCollectionMetadata { is_cached, loader });
        self
    }

    /// Attach a custom launch resolver.
    #[must_use]
    pub fn with_launch_resolver(mut self, resolver: Arc<dyn LaunchResolver>) -> Self {
        self.launch_resolver = Some(resolver);
        self
    }

    /// Whether this collection still awaits discovery before its contents
    /// count as known.
    #[must_use]
    pub fn awaits_discovery(&self) -> bool {
        self.lazy.as_ref().is_some_and(|lazy| !lazy.is_cached)
    }
}

impl fmt::Debug for McpCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpCollection")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("scope", &self.scope)
            .field("trusted_by_default", &self.trusted_by_default)
            .field("lazy", &self.lazy)
            .finish_non_exhaustive()
    }
}
