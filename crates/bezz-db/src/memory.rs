use std::collections::HashMap;

use async_trait::async_trait;
use bezz_core::{Brief, BriefStatus};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{apply_updates, clamp_list_limit, BriefStore, DbError, FieldUpdate};

/// Process-local document store for tests and single-node development.
///
/// Documents are kept as JSON so path updates behave exactly as they do
/// against Postgres.
#[derive(Debug, Default)]
pub struct MemoryBriefStore {
    docs: RwLock<HashMap<String, Value>>,
}

impl MemoryBriefStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw document, for assertions on absent sub-documents.
    pub async fn raw(&self, id: &str) -> Option<Value> {
        self.docs.read().await.get(id).cloned()
    }

    async fn write(
        &self,
        id: &str,
        expected: Option<BriefStatus>,
        updates: &[FieldUpdate],
    ) -> Result<(), DbError> {
        let mut docs = self.docs.write().await;
        let current = docs
            .get(id)
            .ok_or_else(|| DbError::NotFound(id.to_string()))?;

        if let Some(expected) = expected {
            let actual = serde_json::from_value::<Brief>(current.clone())?.status;
            if actual != expected {
                return Err(DbError::StatusConflict {
                    id: id.to_string(),
                    expected,
                    actual,
                });
            }
        }

        let mut next = current.clone();
        apply_updates(&mut next, updates)?;
        serde_json::from_value::<Brief>(next.clone())?;

        docs.insert(id.to_string(), next);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Brief>, DbError> {
        self.docs
            .read()
            .await
            .values()
            .map(|doc| serde_json::from_value::<Brief>(doc.clone()).map_err(DbError::from))
            .collect()
    }
}

#[async_trait]
impl BriefStore for MemoryBriefStore {
    async fn get(&self, id: &str) -> Result<Brief, DbError> {
        let docs = self.docs.read().await;
        let doc = docs
            .get(id)
            .ok_or_else(|| DbError::NotFound(id.to_string()))?;
        Ok(serde_json::from_value(doc.clone())?)
    }

    async fn set(&self, brief: &Brief) -> Result<(), DbError> {
        let doc = serde_json::to_value(brief)?;
        self.docs.write().await.insert(brief.id.clone(), doc);
        Ok(())
    }

    async fn update_fields(&self, id: &str, updates: &[FieldUpdate]) -> Result<(), DbError> {
        self.write(id, None, updates).await
    }

    async fn update_fields_if(
        &self,
        id: &str,
        expected: BriefStatus,
        updates: &[FieldUpdate],
    ) -> Result<(), DbError> {
        self.write(id, Some(expected), updates).await
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Brief>, DbError> {
        let limit = usize::try_from(clamp_list_limit(limit)).unwrap_or(1);
        let mut briefs: Vec<Brief> = self
            .all()
            .await?
            .into_iter()
            .filter(|brief| brief.owner_id == owner_id)
            .collect();
        briefs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        briefs.truncate(limit);
        Ok(briefs)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        Ok(self.docs.write().await.remove(id).is_some())
    }

    async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<Brief>, DbError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|brief| !brief.status.is_terminal() && brief.updated_at < cutoff)
            .collect())
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}
