//! Bucket storage over plain HTTP `PUT`, with HMAC-SHA256 signed read URLs.
//!
//! A signed URL has the shape
//! `{base}/{bucket}/{key}?expires={unix}&signature={hex}` where the signature
//! is hex `HMAC-SHA256(secret, "{bucket}/{key}\n{expires}")`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use sha2::Sha256;

use crate::{ObjectStore, StorageError};

/// Characters left as-is inside one key segment.
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const UPLOAD_TIMEOUT_SECS: u64 = 60;

type HmacSha256 = Hmac<Sha256>;

pub struct HttpObjectStore {
    client: Client,
    base_url: String,
    bucket: String,
    token: Option<String>,
    signing_secret: String,
    ttl_secs: i64,
}

impl std::fmt::Debug for HttpObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpObjectStore")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("signing_secret", &"[redacted]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl HttpObjectStore {
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidBaseUrl`] unless `base_url` is an
    /// `http(s)` URL, or [`StorageError::Http`] if the client cannot be built.
    pub fn new(
        base_url: &str,
        bucket: &str,
        signing_secret: &str,
        ttl_secs: u64,
    ) -> Result<Self, StorageError> {
        let trimmed = base_url.trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(StorageError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
            bucket: bucket.trim_matches('/').to_string(),
            token: None,
            signing_secret: signing_secret.to_string(),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn object_url(&self, key: &str) -> String {
        let encoded = key
            .split('/')
            .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}/{encoded}", self.base_url, self.bucket)
    }

    fn signature(&self, key: &str, expires: i64) -> String {
        // HMAC accepts keys of any length, so this never fails.
        let Ok(mut mac) = HmacSha256::new_from_slice(self.signing_secret.as_bytes()) else {
            return String::new();
        };
        mac.update(format!("{}/{key}\n{expires}", self.bucket).as_bytes());
        format!("{:x}", mac.finalize().into_bytes())
    }

    /// Sign `key` as of `now_unix` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EmptyKey`] for an empty key.
    pub fn sign_at(&self, key: &str, now_unix: i64) -> Result<String, StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        let expires = now_unix.saturating_add(self.ttl_secs);
        Ok(format!(
            "{}?expires={expires}&signature={}",
            self.object_url(key),
            self.signature(key, expires)
        ))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }

        let size = bytes.len();
        let mut request = self
            .client
            .put(self.object_url(key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StorageError::Upload {
                key: key.to_string(),
                status: response.status().as_u16(),
            });
        }

        tracing::info!(key, size, "object stored");
        self.sign(key)
    }

    fn sign(&self, key: &str) -> Result<String, StorageError> {
        self.sign_at(key, Utc::now().timestamp())
    }

    fn is_stored_reference(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/{}/", self.base_url, self.bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpObjectStore {
        HttpObjectStore::new("https://media.example.com/", "bezz", "secret", 3600).unwrap()
    }

    #[test]
    fn signed_url_carries_expiry_and_signature() {
        let url = store().sign_at("ads/b1/acme-ad-1.png", 1_000).unwrap();
        assert!(url.starts_with("https://media.example.com/bezz/ads/b1/acme-ad-1.png?expires=4600&signature="));
        let signature = url.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn signature_is_hmac_sha256_of_object_path_and_expiry() {
        let url = store().sign_at("ads/b1/acme-ad-1.png", 1_000).unwrap();
        assert!(url.ends_with(
            "&signature=a1ffef1faff3abc444ba307a244bc27b1cee160b8aef06e445e5c3bf8a59f7ad"
        ));
    }

    #[test]
    fn signature_depends_on_secret() {
        let other = HttpObjectStore::new("https://media.example.com/", "bezz", "other", 3600).unwrap();
        assert_ne!(
            store().sign_at("a.png", 0).unwrap(),
            other.sign_at("a.png", 0).unwrap()
        );
    }

    #[test]
    fn signature_depends_on_key_and_expiry() {
        let store = store();
        assert_ne!(store.sign_at("a.png", 0).unwrap(), store.sign_at("b.png", 0).unwrap());
        assert_ne!(store.sign_at("a.png", 0).unwrap(), store.sign_at("a.png", 1).unwrap());
        assert_eq!(store.sign_at("a.png", 5).unwrap(), store.sign_at("a.png", 5).unwrap());
    }

    #[test]
    fn key_segments_are_percent_encoded() {
        let url = store().sign_at("ads/b1/café & co.png", 0).unwrap();
        assert!(url.contains("/ads/b1/caf%C3%A9%20%26%20co.png?"), "{url}");
    }

    #[test]
    fn own_urls_are_recognised() {
        let store = store();
        let url = store.sign_at("logos/b1/acme-logo.png", 0).unwrap();
        assert!(store.is_stored_reference(&url));
        assert!(!store.is_stored_reference("https://oaidalleapi.example.net/img.png"));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(store().sign_at("", 0), Err(StorageError::EmptyKey)));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = HttpObjectStore::new("ftp://nope", "b", "s", 60).unwrap_err();
        assert!(matches!(err, StorageError::InvalidBaseUrl(_)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let store = store().with_token(Some("tok-123".to_string()));
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("tok-123"));
        assert!(!rendered.contains("secret\""));
    }
}
