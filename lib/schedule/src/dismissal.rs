//! Notification dismissal events.
//!
//! Each time a user dismisses a notification, one event is appended to
//! the dismissal log. The log is append-only and drives the escalation
//! engine's strike counting.

use crate::error::DismissalLogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiet_sentinel_core::{DismissalEventId, ScheduleId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The channel a notification was delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Mobile/desktop push notification.
    Push,
    /// Email.
    Email,
    /// In-app assistant chat.
    InApp,
}

impl NotificationChannel {
    /// Returns the canonical string form, as stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::InApp => "in_app",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown channel string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel {
    /// The unrecognized value.
    pub value: String,
}

impl fmt::Display for UnknownChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown notification channel '{}'", self.value)
    }
}

impl std::error::Error for UnknownChannel {}

impl FromStr for NotificationChannel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Self::Push),
            "email" => Ok(Self::Email),
            "in_app" => Ok(Self::InApp),
            _ => Err(UnknownChannel {
                value: s.to_string(),
            }),
        }
    }
}

/// One recorded dismissal of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissalEvent {
    /// Unique identifier.
    pub id: DismissalEventId,
    /// The schedule whose notification was dismissed.
    pub schedule_id: ScheduleId,
    /// The user who dismissed it.
    pub user_id: UserId,
    /// The channel the dismissed notification was delivered on.
    pub channel: NotificationChannel,
    /// When the dismissal happened.
    pub occurred_at: DateTime<Utc>,
}

impl DismissalEvent {
    /// Creates a new dismissal event.
    #[must_use]
    pub fn new(
        schedule_id: ScheduleId,
        user_id: UserId,
        channel: NotificationChannel,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DismissalEventId::new(),
            schedule_id,
            user_id,
            channel,
            occurred_at,
        }
    }
}

/// Trait for the append-only dismissal log.
#[async_trait]
pub trait DismissalLog: Send + Sync {
    /// Appends a dismissal event.
    async fn append(&self, event: DismissalEvent) -> Result<(), DismissalLogError>;

    /// Counts dismissals for a (user, schedule) pair.
    async fn count_for(
        &self,
        user_id: UserId,
        schedule_id: ScheduleId,
    ) -> Result<u32, DismissalLogError>;

    /// Returns the most recent dismissal for a (user, schedule) pair.
    async fn last_for(
        &self,
        user_id: UserId,
        schedule_id: ScheduleId,
    ) -> Result<Option<DismissalEvent>, DismissalLogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_parse_roundtrip() {
        for channel in [
            NotificationChannel::Push,
            NotificationChannel::Email,
            NotificationChannel::InApp,
        ] {
            let parsed: NotificationChannel = channel.as_str().parse().expect("should parse");
            assert_eq!(channel, parsed);
        }
    }

    #[test]
    fn channel_parse_unknown() {
        let result: Result<NotificationChannel, _> = "carrier_pigeon".parse();
        assert!(result.is_err());
    }

    #[test]
    fn dismissal_event_creation() {
        let schedule_id = ScheduleId::new();
        let user_id = UserId::new();
        let now = Utc::now();

        let event = DismissalEvent::new(schedule_id, user_id, NotificationChannel::Push, now);
        assert_eq!(event.schedule_id, schedule_id);
        assert_eq!(event.user_id, user_id);
        assert_eq!(event.occurred_at, now);
    }

    #[test]
    fn dismissal_event_serde_roundtrip() {
        let event = DismissalEvent::new(
            ScheduleId::new(),
            UserId::new(),
            NotificationChannel::Email,
            Utc::now(),
        );

        let json = serde_json::to_string(&event).expect("serialize");
        let parsed: DismissalEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(event, parsed);
    }
}
