use async_trait::async_trait;
use base64::Engine;

use crate::AiError;

/// What an image model hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Provider-hosted, typically short-lived.
    Url(String),
    /// Decoded image bytes from a `b64_json` response.
    Bytes(Vec<u8>),
}

#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<ImagePayload, AiError>;

    /// Fetch a provider-hosted image so it can be re-uploaded.
    async fn download(&self, url: &str) -> Result<Vec<u8>, AiError>;
}

/// Decode standard base64, tolerating a `data:image/png;base64,` prefix.
///
/// # Errors
///
/// Returns [`AiError::ImagePayload`] when the data is not valid base64.
pub fn decode_base64_image(encoded: &str) -> Result<Vec<u8>, AiError> {
    let body = match encoded.split_once(',') {
        Some((header, rest)) if header.to_ascii_lowercase().contains("base64") => rest,
        _ => encoded,
    };

    base64::engine::general_purpose::STANDARD
        .decode(body.trim())
        .map_err(|e| AiError::ImagePayload(format!("invalid base64 image: {e}")))
}
