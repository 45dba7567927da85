//! The document-store seam the pipeline persists through.

use async_trait::async_trait;
use bezz_core::{Brief, BriefStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::DbError;

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

/// One `path = value` write. `path` is dot-separated from the document root,
/// e.g. `results.strategy`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub path: String,
    pub value: Value,
}

impl FieldUpdate {
    /// # Errors
    ///
    /// Returns [`DbError::Document`] if `value` cannot be serialized.
    pub fn new(path: impl Into<String>, value: impl Serialize) -> Result<Self, DbError> {
        Ok(Self {
            path: path.into(),
            value: serde_json::to_value(value)?,
        })
    }

    /// The `{status, updated_at}` pair every transition writes.
    #[must_use]
    pub fn status(status: BriefStatus, now: DateTime<Utc>) -> Vec<Self> {
        vec![
            Self {
                path: "status".to_string(),
                value: Value::String(status.as_str().to_string()),
            },
            Self {
                path: "updated_at".to_string(),
                value: Value::String(now.to_rfc3339()),
            },
        ]
    }
}

#[must_use]
pub fn clamp_list_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

#[async_trait]
pub trait BriefStore: Send + Sync {
    /// # Errors
    ///
    /// [`DbError::NotFound`] when no brief has this id.
    async fn get(&self, id: &str) -> Result<Brief, DbError>;

    /// Insert or fully replace a brief.
    async fn set(&self, brief: &Brief) -> Result<(), DbError>;

    /// Apply all `updates` atomically. The resulting document must still
    /// decode as a [`Brief`]; otherwise nothing is written.
    ///
    /// # Errors
    ///
    /// [`DbError::NotFound`], [`DbError::InvalidPath`], or
    /// [`DbError::Document`] when the result no longer decodes.
    async fn update_fields(&self, id: &str, updates: &[FieldUpdate]) -> Result<(), DbError>;

    /// [`BriefStore::update_fields`] guarded by the stored status: the write
    /// happens only while the brief is still `expected`, checked under the
    /// same lock as the write.
    ///
    /// # Errors
    ///
    /// [`DbError::StatusConflict`] when another writer moved the brief first,
    /// plus the errors of `update_fields`.
    async fn update_fields_if(
        &self,
        id: &str,
        expected: BriefStatus,
        updates: &[FieldUpdate],
    ) -> Result<(), DbError>;

    /// Newest first; `limit` is clamped with [`clamp_list_limit`].
    async fn list_by_owner(&self, owner_id: &str, limit: Option<i64>)
        -> Result<Vec<Brief>, DbError>;

    /// Returns `true` when a brief was removed.
    async fn delete(&self, id: &str) -> Result<bool, DbError>;

    /// Non-terminal briefs whose `updated_at` is older than `cutoff`.
    async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<Brief>, DbError>;

    async fn ping(&self) -> Result<(), DbError>;
}
