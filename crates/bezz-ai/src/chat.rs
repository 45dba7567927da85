use async_trait::async_trait;

use crate::{AiError, ChatRequest};

/// Chat-completion transport. Implementations send the request as given;
/// callers sanitize it first.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Returns the first choice's message content.
    ///
    /// # Errors
    ///
    /// [`AiError::EmptyResponse`] when the provider returns no choices or
    /// blank content; transport and provider errors otherwise.
    async fn complete(&self, request: &ChatRequest) -> Result<String, AiError>;
}
