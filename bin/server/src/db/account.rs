//! Account repository.

use super::invalid_column;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiet_sentinel_core::UserId;
use quiet_sentinel_schedule::{
    Account, AccountStore, AccountStoreError, SubscriptionTier,
};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for account queries.
#[derive(FromRow)]
struct AccountRow {
    user_id: String,
    tier: String,
    timezone: Option<String>,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn try_into_account(self) -> Result<Account, sqlx::Error> {
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| invalid_column(format!("invalid user id '{}': {}", self.user_id, e)))?;
        let tier = SubscriptionTier::from_str(&self.tier)
            .map_err(|e| invalid_column(format!("invalid tier: {e}")))?;

        Ok(Account {
            user_id,
            tier,
            capabilities: tier.into(),
            timezone: self.timezone,
            created_at: self.created_at,
        })
    }
}

/// Repository for account reads.
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_store_error(e: sqlx::Error) -> AccountStoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AccountStoreError::Unavailable {
                reason: e.to_string(),
            }
        }
        other => AccountStoreError::QueryFailed {
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Account>, AccountStoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT user_id, tier, timezone, created_at
            FROM accounts
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_store_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_account().map_err(to_store_error)?)),
            None => Ok(None),
        }
    }
}
