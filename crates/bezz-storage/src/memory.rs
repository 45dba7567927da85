use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{ObjectStore, StorageError};

const PREFIX: &str = "memory://objects/";

/// In-process store for tests and local development. Every signature is
/// distinct so re-signing is observable.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    signatures: AtomicU64,
    reject_uploads: AtomicBool,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose uploads always fail with status 503.
    #[must_use]
    pub fn failing() -> Self {
        let store = Self::default();
        store.reject_uploads.store(true, Ordering::SeqCst);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.reject_uploads.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .map(|(bytes, _)| bytes.clone())
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        if self.reject_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Upload {
                key: key.to_string(),
                status: 503,
            });
        }

        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), (bytes, content_type.to_string()));
        self.sign(key)
    }

    fn sign(&self, key: &str) -> Result<String, StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        let version = self.signatures.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{PREFIX}{key}?sig={version}"))
    }

    fn is_stored_reference(&self, url: &str) -> bool {
        url.starts_with(PREFIX)
    }
}
