//! Optional collection capabilities.
//!
//! These are the small closed set of hooks a collection may provide: a
//! discovery loader for lazy placeholders and a custom launch resolver.
//! Both use `anyhow` at the seam since implementations live in adapters
//! with their own failure modes.

use async_trait::async_trait;

use crate::domain::{McpServerDefinition, McpServerLaunch};

/// Discovery hook carried by a lazy collection.
#[async_trait]
pub trait CollectionLoader: Send + Sync {
    /// Discover the collection's real contents.
    ///
    /// Expected to register a realized replacement (same collection id)
    /// before returning. Errors are logged by the sweep and do not abort it.
    async fn load(&self) -> anyhow::Result<()>;

    /// Called exactly once if discovery completes without the placeholder
    /// being replaced; the placeholder is removed from the registry.
    fn removed(&self);
}

/// Custom base-launch hook carried by a collection.
///
/// When present, the registry calls this instead of using
/// `definition.launch` directly, letting the collection inject settings of
/// its own before variable substitution.
#[async_trait]
pub trait LaunchResolver: Send + Sync {
    /// Produce the base launch configuration for a definition.
    async fn resolve_launch(
        &self,
        definition: &McpServerDefinition,
    ) -> anyhow::Result<McpServerLaunch>;
}
