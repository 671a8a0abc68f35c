//! Storage seams for schedules and accounts.
//!
//! The notification core reads schedules and accounts from a persisted
//! store owned by the rest of the assistant backend. These traits keep
//! the core testable without a database.

use crate::account::Account;
use crate::error::{AccountStoreError, ScheduleStoreError};
use crate::schedule::ScheduleRecord;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use quiet_sentinel_core::{ScheduleId, UserId};

/// Trait for read-only schedule storage.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Lists raw schedule records starting within `horizon` of `now`.
    ///
    /// Records are returned unvalidated; callers convert them with
    /// [`ScheduleRecord::try_into_schedule`] and surface malformed rows.
    async fn upcoming_within(
        &self,
        now: DateTime<Utc>,
        horizon: Duration,
    ) -> Result<Vec<ScheduleRecord>, ScheduleStoreError>;

    /// Finds a raw schedule record by ID.
    async fn find_by_id(
        &self,
        id: ScheduleId,
    ) -> Result<Option<ScheduleRecord>, ScheduleStoreError>;
}

/// Trait for read-only account storage.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Finds the account for a user.
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Account>, AccountStoreError>;
}
