//! Prep artifact repository.
//!
//! Artifacts are unique per schedule. The conditional insert relies on
//! the unique index: a losing writer's row is simply not inserted, and
//! the winner is re-read and returned.

use super::invalid_column;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiet_sentinel_core::{MemoryNoteId, PrepArtifactId, ScheduleId};
use quiet_sentinel_prep::{PrepArtifact, PrepArtifactStore, PrepStoreError};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for artifact queries.
#[derive(FromRow)]
struct PrepArtifactRow {
    id: String,
    schedule_id: String,
    generated_at: DateTime<Utc>,
    checklist_items: serde_json::Value,
    memory_note_ids: serde_json::Value,
}

impl PrepArtifactRow {
    fn try_into_artifact(self) -> Result<PrepArtifact, sqlx::Error> {
        let id = PrepArtifactId::from_str(&self.id)
            .map_err(|e| invalid_column(format!("invalid artifact id '{}': {}", self.id, e)))?;
        let schedule_id = ScheduleId::from_str(&self.schedule_id).map_err(|e| {
            invalid_column(format!(
                "invalid schedule id '{}': {}",
                self.schedule_id, e
            ))
        })?;

        let checklist_items: Vec<String> = serde_json::from_value(self.checklist_items)
            .map_err(|e| invalid_column(format!("invalid checklist items: {e}")))?;
        let memory_note_ids: Vec<MemoryNoteId> = serde_json::from_value(self.memory_note_ids)
            .map_err(|e| invalid_column(format!("invalid memory note ids: {e}")))?;

        Ok(PrepArtifact {
            id,
            schedule_id,
            generated_at: self.generated_at,
            checklist_items,
            memory_note_ids,
        })
    }
}

/// Repository for prep artifacts.
pub struct PrepArtifactRepository {
    pool: PgPool,
}

impl PrepArtifactRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_store_error(e: sqlx::Error) -> PrepStoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PrepStoreError::Unavailable {
                reason: e.to_string(),
            }
        }
        other => PrepStoreError::QueryFailed {
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl PrepArtifactStore for PrepArtifactRepository {
    async fn find_by_schedule(
        &self,
        schedule_id: ScheduleId,
    ) -> Result<Option<PrepArtifact>, PrepStoreError> {
        let row: Option<PrepArtifactRow> = sqlx::query_as(
            r#"
            SELECT id, schedule_id, generated_at, checklist_items, memory_note_ids
            FROM prep_artifacts
            WHERE schedule_id = $1
            "#,
        )
        .bind(schedule_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_store_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_artifact().map_err(to_store_error)?)),
            None => Ok(None),
        }
    }

    async fn insert_if_absent(
        &self,
        artifact: PrepArtifact,
    ) -> Result<PrepArtifact, PrepStoreError> {
        let checklist_items =
            serde_json::to_value(&artifact.checklist_items).unwrap_or_default();
        let memory_note_ids =
            serde_json::to_value(&artifact.memory_note_ids).unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO prep_artifacts
                (id, schedule_id, generated_at, checklist_items, memory_note_ids)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (schedule_id) DO NOTHING
            "#,
        )
        .bind(artifact.id.to_string())
        .bind(artifact.schedule_id.to_string())
        .bind(artifact.generated_at)
        .bind(&checklist_items)
        .bind(&memory_note_ids)
        .execute(&self.pool)
        .await
        .map_err(to_store_error)?;

        // Re-read to return the winner, whichever writer it was.
        self.find_by_schedule(artifact.schedule_id)
            .await?
            .ok_or_else(|| PrepStoreError::QueryFailed {
                reason: "artifact missing after conditional insert".to_string(),
            })
    }
}
