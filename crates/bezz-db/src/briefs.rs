//! Postgres-backed [`BriefStore`]. The full brief lives in `briefs.doc`;
//! `owner_id`, `status`, and the timestamps are mirrored into columns for
//! filtering.

use async_trait::async_trait;
use bezz_core::{Brief, BriefStatus};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::{apply_updates, clamp_list_limit, BriefStore, DbError, FieldUpdate};

#[derive(Debug, Clone)]
pub struct PgBriefStore {
    pool: PgPool,
}

impl PgBriefStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Read-modify-write under `FOR UPDATE`, so the status check and the
    /// write see the same row.
    async fn write(
        &self,
        id: &str,
        expected: Option<BriefStatus>,
        updates: &[FieldUpdate],
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let mut doc =
            sqlx::query_scalar::<_, Value>("SELECT doc FROM briefs WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::NotFound(id.to_string()))?;

        if let Some(expected) = expected {
            let actual = serde_json::from_value::<Brief>(doc.clone())?.status;
            if actual != expected {
                return Err(DbError::StatusConflict {
                    id: id.to_string(),
                    expected,
                    actual,
                });
            }
        }

        apply_updates(&mut doc, updates)?;
        let brief: Brief = serde_json::from_value(doc.clone())?;

        sqlx::query("UPDATE briefs SET doc = $2, status = $3, updated_at = $4 WHERE id = $1")
            .bind(id)
            .bind(&doc)
            .bind(brief.status.as_str())
            .bind(brief.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn decode_all(docs: Vec<Value>) -> Result<Vec<Brief>, DbError> {
    docs.into_iter()
        .map(|doc| serde_json::from_value::<Brief>(doc).map_err(DbError::from))
        .collect()
}

#[async_trait]
impl BriefStore for PgBriefStore {
    async fn get(&self, id: &str) -> Result<Brief, DbError> {
        let doc = sqlx::query_scalar::<_, Value>("SELECT doc FROM briefs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(id.to_string()))?;

        Ok(serde_json::from_value(doc)?)
    }

    async fn set(&self, brief: &Brief) -> Result<(), DbError> {
        let doc = serde_json::to_value(brief)?;

        sqlx::query(
            "INSERT INTO briefs (id, owner_id, status, doc, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                 owner_id = EXCLUDED.owner_id, \
                 status = EXCLUDED.status, \
                 doc = EXCLUDED.doc, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(&brief.id)
        .bind(&brief.owner_id)
        .bind(brief.status.as_str())
        .bind(&doc)
        .bind(brief.created_at)
        .bind(brief.updated_at)
        .execute(&self.pool)
        .await?;

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
        let docs = sqlx::query_scalar::<_, Value>(
            "SELECT doc FROM briefs WHERE owner_id = $1 ORDER BY created_at DESC, id LIMIT $2",
        )
        .bind(owner_id)
        .bind(clamp_list_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        decode_all(docs)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM briefs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<Brief>, DbError> {
        let docs = sqlx::query_scalar::<_, Value>(
            "SELECT doc FROM briefs \
             WHERE status IN ('processing', 'strategy_completed', 'ads_completed') \
               AND updated_at < $1 \
             ORDER BY updated_at",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        decode_all(docs)
    }

    async fn ping(&self) -> Result<(), DbError> {
        crate::ping(&self.pool).await?;
        Ok(())
    }
}
