use thiserror::Error;

/// Errors returned by model clients and the router.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("empty response from {model}")]
    EmptyResponse { model: String },

    /// A body could not be decoded into the expected shape.
    #[error("could not decode response from {model}: {source}")]
    Decode {
        model: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no candidate models were configured")]
    NoCandidates,

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// The image response carried neither a URL nor decodable base64 data.
    #[error("unusable image payload: {0}")]
    ImagePayload(String),
}
