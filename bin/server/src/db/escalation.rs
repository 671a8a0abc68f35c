//! Escalation state repository.
//!
//! State rows carry a `version` column; every update is guarded on the
//! version the caller read, so concurrent triggers cannot double-apply
//! a transition. Rows are never deleted.

use super::invalid_column;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiet_sentinel_core::{EscalationStateId, ScheduleId, UserId};
use quiet_sentinel_escalation::{
    DecisionKind, EscalationState, EscalationStateStore, StateStoreError, StateVersion,
    VersionedState,
};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for escalation state queries.
#[derive(FromRow)]
struct EscalationStateRow {
    id: String,
    user_id: String,
    schedule_id: String,
    strike_count: i32,
    level: i32,
    last_strike_at: Option<DateTime<Utc>>,
    suppressed_until: Option<DateTime<Utc>>,
    last_decision: Option<String>,
    last_decided_at: Option<DateTime<Utc>>,
    last_sent_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EscalationStateRow {
    fn try_into_versioned(self) -> Result<VersionedState, sqlx::Error> {
        let id = EscalationStateId::from_str(&self.id)
            .map_err(|e| invalid_column(format!("invalid state id '{}': {}", self.id, e)))?;
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| invalid_column(format!("invalid user id '{}': {}", self.user_id, e)))?;
        let schedule_id = ScheduleId::from_str(&self.schedule_id).map_err(|e| {
            invalid_column(format!(
                "invalid schedule id '{}': {}",
                self.schedule_id, e
            ))
        })?;

        let last_decision = self
            .last_decision
            .as_deref()
            .map(DecisionKind::from_str)
            .transpose()
            .map_err(|e| invalid_column(format!("invalid decision kind: {e}")))?;

        Ok(VersionedState {
            state: EscalationState {
                id,
                user_id,
                schedule_id,
                strike_count: self.strike_count as u32,
                level: self.level as u32,
                last_strike_at: self.last_strike_at,
                suppressed_until: self.suppressed_until,
                last_decision,
                last_decided_at: self.last_decided_at,
                last_sent_at: self.last_sent_at,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            version: self.version,
        })
    }
}

/// Repository for escalation state.
pub struct EscalationStateRepository {
    pool: PgPool,
}

impl EscalationStateRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_store_error(e: sqlx::Error) -> StateStoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StateStoreError::Unavailable {
                reason: e.to_string(),
            }
        }
        other => StateStoreError::QueryFailed {
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl EscalationStateStore for EscalationStateRepository {
    async fn load(
        &self,
        user_id: UserId,
        schedule_id: ScheduleId,
    ) -> Result<Option<VersionedState>, StateStoreError> {
        let row: Option<EscalationStateRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, schedule_id, strike_count, level,
                   last_strike_at, suppressed_until, last_decision,
                   last_decided_at, last_sent_at, version, created_at, updated_at
            FROM escalation_states
            WHERE user_id = $1 AND schedule_id = $2
            "#,
        )
        .bind(user_id.to_string())
        .bind(schedule_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_store_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_versioned().map_err(to_store_error)?)),
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        state: &EscalationState,
        expected_version: Option<StateVersion>,
    ) -> Result<StateVersion, StateStoreError> {
        let conflict = || StateStoreError::Conflict {
            user_id: state.user_id,
            schedule_id: state.schedule_id,
        };

        match expected_version {
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO escalation_states
                        (id, user_id, schedule_id, strike_count, level,
                         last_strike_at, suppressed_until, last_decision,
                         last_decided_at, last_sent_at, version, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1, $11, $12)
                    "#,
                )
                .bind(state.id.to_string())
                .bind(state.user_id.to_string())
                .bind(state.schedule_id.to_string())
                .bind(state.strike_count as i32)
                .bind(state.level as i32)
                .bind(state.last_strike_at)
                .bind(state.suppressed_until)
                .bind(state.last_decision.map(|d| d.as_str()))
                .bind(state.last_decided_at)
                .bind(state.last_sent_at)
                .bind(state.created_at)
                .bind(state.updated_at)
                .execute(&self.pool)
                .await;

                match result {
                    Ok(_) => Ok(1),
                    Err(e)
                        if e.as_database_error()
                            .is_some_and(|d| d.is_unique_violation()) =>
                    {
                        Err(conflict())
                    }
                    Err(e) => Err(to_store_error(e)),
                }
            }
            Some(version) => {
                let row: Option<(i64,)> = sqlx::query_as(
                    r#"
                    UPDATE escalation_states
                    SET strike_count = $3, level = $4, last_strike_at = $5,
                        suppressed_until = $6, last_decision = $7,
                        last_decided_at = $8, last_sent_at = $9,
                        updated_at = $10, version = version + 1
                    WHERE user_id = $1 AND schedule_id = $2 AND version = $11
                    RETURNING version
                    "#,
                )
                .bind(state.user_id.to_string())
                .bind(state.schedule_id.to_string())
                .bind(state.strike_count as i32)
                .bind(state.level as i32)
                .bind(state.last_strike_at)
                .bind(state.suppressed_until)
                .bind(state.last_decision.map(|d| d.as_str()))
                .bind(state.last_decided_at)
                .bind(state.last_sent_at)
                .bind(state.updated_at)
                .bind(version)
                .fetch_optional(&self.pool)
                .await
                .map_err(to_store_error)?;

                row.map(|(v,)| v).ok_or_else(conflict)
            }
        }
    }
}
