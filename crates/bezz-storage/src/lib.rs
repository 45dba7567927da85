//! Object storage for rendered images: store bytes under a key, hand back a
//! time-limited signed reference, and re-sign keys on demand.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpObjectStore;
pub use memory::MemoryObjectStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload of '{key}' rejected with status {status}")]
    Upload { key: String, status: u16 },

    #[error("invalid storage base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("object key must be non-empty")]
    EmptyKey,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `key` and return a signed, retrievable reference.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, StorageError>;

    /// A fresh signed reference for an already-stored key.
    fn sign(&self, key: &str) -> Result<String, StorageError>;

    /// `true` when `url` already points into this store.
    fn is_stored_reference(&self, url: &str) -> bool;
}
