//! Schedule entries and their raw storage form.
//!
//! Schedules are created by the assistant's conversation layer and are
//! read-only to the notification core. The raw [`ScheduleRecord`] mirrors
//! what storage can actually guarantee; conversion into a validated
//! [`Schedule`] surfaces malformed rows instead of defaulting them.

use crate::category::ScheduleCategory;
use crate::error::InvalidScheduleData;
use chrono::{DateTime, Duration, Utc};
use quiet_sentinel_core::{ScheduleId, UserId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A validated schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Unique identifier.
    pub id: ScheduleId,
    /// The user this schedule belongs to.
    pub owner_id: UserId,
    /// Human-readable title.
    pub title: String,
    /// Event category.
    pub category: ScheduleCategory,
    /// When the event starts.
    pub start_time: DateTime<Utc>,
    /// Explicit critical flag set by the user.
    pub critical: bool,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    /// Creates a new schedule entry.
    #[must_use]
    pub fn new(
        owner_id: UserId,
        title: impl Into<String>,
        category: ScheduleCategory,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ScheduleId::new(),
            owner_id,
            title: title.into(),
            category,
            start_time,
            critical: false,
            created_at: Utc::now(),
        }
    }

    /// Marks the schedule as critical.
    #[must_use]
    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Signed duration from `now` until the event starts.
    ///
    /// Negative once the event has started.
    #[must_use]
    pub fn time_until_start(&self, now: DateTime<Utc>) -> Duration {
        self.start_time - now
    }

    /// Returns true once the event has started.
    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time
    }
}

/// The raw storage form of a schedule.
///
/// Start time and category are optional here because storage cannot
/// guarantee them; [`ScheduleRecord::try_into_schedule`] is the single
/// place where malformed rows are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Unique identifier.
    pub id: ScheduleId,
    /// The user this schedule belongs to.
    pub owner_id: UserId,
    /// Human-readable title.
    pub title: String,
    /// Event category, as stored.
    pub category: Option<String>,
    /// When the event starts, if known.
    pub start_time: Option<DateTime<Utc>>,
    /// Explicit critical flag.
    pub critical: bool,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl ScheduleRecord {
    /// Validates the record into a [`Schedule`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidScheduleData`] if the start time or category is
    /// missing, or the category is not a recognized value. Callers must
    /// surface this error rather than treating the record as a valid,
    /// unimportant schedule.
    pub fn try_into_schedule(self) -> Result<Schedule, InvalidScheduleData> {
        let id = self.id;

        let start_time = self
            .start_time
            .ok_or(InvalidScheduleData::MissingStartTime { id })?;

        let raw_category = self
            .category
            .ok_or(InvalidScheduleData::MissingCategory { id })?;

        let category = ScheduleCategory::from_str(&raw_category).map_err(|e| {
            InvalidScheduleData::UnknownCategory {
                id,
                value: e.value,
            }
        })?;

        Ok(Schedule {
            id,
            owner_id: self.owner_id,
            title: self.title,
            category,
            start_time,
            critical: self.critical,
            created_at: self.created_at,
        })
    }
}

impl From<Schedule> for ScheduleRecord {
    fn from(schedule: Schedule) -> Self {
        Self {
            id: schedule.id,
            owner_id: schedule.owner_id,
            title: schedule.title,
            category: Some(schedule.category.as_str().to_string()),
            start_time: Some(schedule.start_time),
            critical: schedule.critical,
            created_at: schedule.created_at,
        }
    }
}
