//! Trust confirmation dialog port.

use async_trait::async_trait;

/// What a trust prompt should show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPromptRequest {
    /// Label of the collection asking for trust.
    pub collection_label: String,
    /// Labels of the servers the collection wants to start.
    pub server_labels: Vec<String>,
    /// Prompt body text.
    pub message: String,
}

/// User-facing confirmation capability.
///
/// Rendering lives entirely in the adapter; the registry only consumes the
/// answer.
#[async_trait]
pub trait TrustDialog: Send + Sync {
    /// Ask the user whether to trust a collection.
    ///
    /// Returns `Some(true)` / `Some(false)` for an explicit answer, or `None`
    /// if the prompt was dismissed without deciding.
    async fn prompt(&self, request: TrustPromptRequest) -> Option<bool>;
}
