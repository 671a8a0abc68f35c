//! Schedule repository.
//!
//! Schedules are written by the assistant's conversation layer; this
//! repository is the notification core's read-only view.

use super::invalid_column;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use quiet_sentinel_core::{ScheduleId, UserId};
use quiet_sentinel_schedule::{ScheduleRecord, ScheduleStore, ScheduleStoreError};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for schedule queries.
#[derive(FromRow)]
struct ScheduleRow {
    id: String,
    owner_id: String,
    title: String,
    category: Option<String>,
    start_time: Option<DateTime<Utc>>,
    critical: bool,
    created_at: DateTime<Utc>,
}

impl ScheduleRow {
    fn try_into_record(self) -> Result<ScheduleRecord, sqlx::Error> {
        let id = ScheduleId::from_str(&self.id)
            .map_err(|e| invalid_column(format!("invalid schedule id '{}': {}", self.id, e)))?;
        let owner_id = UserId::from_str(&self.owner_id)
            .map_err(|e| invalid_column(format!("invalid owner id '{}': {}", self.owner_id, e)))?;

        Ok(ScheduleRecord {
            id,
            owner_id,
            title: self.title,
            category: self.category,
            start_time: self.start_time,
            critical: self.critical,
            created_at: self.created_at,
        })
    }
}

/// Repository for schedule reads.
pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_store_error(e: sqlx::Error) -> ScheduleStoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            ScheduleStoreError::Unavailable {
                reason: e.to_string(),
            }
        }
        other => ScheduleStoreError::QueryFailed {
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl ScheduleStore for ScheduleRepository {
    async fn upcoming_within(
        &self,
        now: DateTime<Utc>,
        horizon: Duration,
    ) -> Result<Vec<ScheduleRecord>, ScheduleStoreError> {
        // Rows with no start time are returned too, so their invalidity
        // is surfaced by the caller instead of silently skipped.
        let rows: Vec<ScheduleRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, title, category, start_time, critical, created_at
            FROM schedules
            WHERE start_time IS NULL
               OR (start_time > $1 AND start_time <= $2)
            ORDER BY start_time ASC NULLS FIRST
            "#,
        )
        .bind(now)
        .bind(now + horizon)
        .fetch_all(&self.pool)
        .await
        .map_err(to_store_error)?;

        rows.into_iter()
            .map(|r| r.try_into_record().map_err(to_store_error))
            .collect()
    }

    async fn find_by_id(
        &self,
        id: ScheduleId,
    ) -> Result<Option<ScheduleRecord>, ScheduleStoreError> {
        let row: Option<ScheduleRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, title, category, start_time, critical, created_at
            FROM schedules
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_store_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_record().map_err(to_store_error)?)),
            None => Ok(None),
        }
    }
}
