//! Dismissal log repository.

use super::invalid_column;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiet_sentinel_core::{DismissalEventId, ScheduleId, UserId};
use quiet_sentinel_schedule::{
    DismissalEvent, DismissalLog, DismissalLogError, NotificationChannel,
};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for dismissal queries.
#[derive(FromRow)]
struct DismissalRow {
    id: String,
    schedule_id: String,
    user_id: String,
    channel: String,
    occurred_at: DateTime<Utc>,
}

impl DismissalRow {
    fn try_into_event(self) -> Result<DismissalEvent, sqlx::Error> {
        let id = DismissalEventId::from_str(&self.id)
            .map_err(|e| invalid_column(format!("invalid dismissal id '{}': {}", self.id, e)))?;
        let schedule_id = ScheduleId::from_str(&self.schedule_id).map_err(|e| {
            invalid_column(format!(
                "invalid schedule id '{}': {}",
                self.schedule_id, e
            ))
        })?;
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| invalid_column(format!("invalid user id '{}': {}", self.user_id, e)))?;
        let channel = NotificationChannel::from_str(&self.channel)
            .map_err(|e| invalid_column(format!("invalid channel: {e}")))?;

        Ok(DismissalEvent {
            id,
            schedule_id,
            user_id,
            channel,
            occurred_at: self.occurred_at,
        })
    }
}

/// Repository for the append-only dismissal log.
pub struct DismissalRepository {
    pool: PgPool,
}

impl DismissalRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn append_error(e: sqlx::Error) -> DismissalLogError {
    DismissalLogError::AppendFailed {
        reason: e.to_string(),
    }
}

fn query_error(e: sqlx::Error) -> DismissalLogError {
    DismissalLogError::QueryFailed {
        reason: e.to_string(),
    }
}

#[async_trait]
impl DismissalLog for DismissalRepository {
    async fn append(&self, event: DismissalEvent) -> Result<(), DismissalLogError> {
        sqlx::query(
            r#"
            INSERT INTO dismissal_events (id, schedule_id, user_id, channel, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.schedule_id.to_string())
        .bind(event.user_id.to_string())
        .bind(event.channel.as_str())
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(append_error)?;

        Ok(())
    }

    async fn count_for(
        &self,
        user_id: UserId,
        schedule_id: ScheduleId,
    ) -> Result<u32, DismissalLogError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM dismissal_events
            WHERE user_id = $1 AND schedule_id = $2
            "#,
        )
        .bind(user_id.to_string())
        .bind(schedule_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(count as u32)
    }

    async fn last_for(
        &self,
        user_id: UserId,
        schedule_id: ScheduleId,
    ) -> Result<Option<DismissalEvent>, DismissalLogError> {
        let row: Option<DismissalRow> = sqlx::query_as(
            r#"
            SELECT id, schedule_id, user_id, channel, occurred_at
            FROM dismissal_events
            WHERE user_id = $1 AND schedule_id = $2
            ORDER BY occurred_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.to_string())
        .bind(schedule_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_event().map_err(query_error)?)),
            None => Ok(None),
        }
    }
}
