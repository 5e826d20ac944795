//! Variable resolution backend port.
//!
//! The registry parses `${...}` placeholders itself; this port supplies the
//! values. Plain variables (`${workspaceFolder}`) resolve without user
//! interaction. Interactive variables (`${input:...}`, `${command:...}`)
//! may prompt the user or run a command, so the registry memoizes their
//! results and only calls [`ConfigurationResolver::resolve_with_interaction`]
//! on a cache miss.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ConfigTarget;

/// Errors from the resolution backend.
#[derive(Debug, Error)]
pub enum ResolverBackendError {
    /// The backend could not produce values (command failed, prompt error).
    #[error("variable resolution backend error: {0}")]
    Failed(String),
}

/// Capability that resolves variable references to string values.
#[async_trait]
pub trait ConfigurationResolver: Send + Sync {
    /// Resolve non-interactive variables.
    ///
    /// Variables the backend does not know are simply absent from the result;
    /// the caller decides whether that is fatal.
    async fn resolve_variables(
        &self,
        variables: &[String],
    ) -> Result<HashMap<String, String>, ResolverBackendError>;

    /// Resolve interactive variables, prompting or running commands as
    /// needed.
    ///
    /// `known` carries the values already resolved for this launch so the
    /// backend can substitute them into command arguments. The result may
    /// contain more entries than were asked for; callers should memoize all
    /// of them.
    async fn resolve_with_interaction(
        &self,
        variables: &[String],
        section: &str,
        known: &HashMap<String, String>,
        target: ConfigTarget,
    ) -> Result<HashMap<String, String>, ResolverBackendError>;
}
