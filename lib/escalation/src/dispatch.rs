//! Notification dispatch seam.
//!
//! The engine decides *whether and when* a notification goes out; the
//! dispatcher owns *how*. The production implementation publishes to
//! NATS (see [`crate::nats`]); tests use in-memory recorders.

use crate::error::DispatchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiet_sentinel_core::{NotificationId, ScheduleId, UserId};
use quiet_sentinel_schedule::{NotificationChannel, Schedule};
use serde::{Deserialize, Serialize};

/// A notification handed to the dispatch service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Unique identifier for this dispatch.
    pub id: NotificationId,
    /// The user to notify.
    pub user_id: UserId,
    /// The schedule the notification concerns.
    pub schedule_id: ScheduleId,
    /// Rendered message text.
    pub message: String,
    /// Delivery channel.
    pub channel: NotificationChannel,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

impl NotificationRequest {
    /// Creates a dispatch request for an upcoming schedule.
    #[must_use]
    pub fn for_schedule(
        schedule: &Schedule,
        channel: NotificationChannel,
        now: DateTime<Utc>,
    ) -> Self {
        let minutes = schedule.time_until_start(now).num_minutes();
        let message = if minutes >= 120 {
            format!(
                "Upcoming {}: {} in about {} hours",
                schedule.category,
                schedule.title,
                minutes / 60
            )
        } else {
            format!(
                "Upcoming {}: {} in {} minutes",
                schedule.category, schedule.title, minutes
            )
        };

        Self {
            id: NotificationId::new(),
            user_id: schedule.owner_id,
            schedule_id: schedule.id,
            message,
            channel,
            created_at: now,
        }
    }
}

/// Trait for the notification dispatch service.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Delivers a notification request.
    ///
    /// Returning `Ok` means the dispatch backend accepted the request;
    /// only then may the caller confirm the send against the escalation
    /// state.
    async fn dispatch(&self, request: &NotificationRequest) -> Result<(), DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiet_sentinel_schedule::ScheduleCategory;

    #[test]
    fn request_message_mentions_title_and_lead_time() {
        let now = Utc::now();
        let schedule = Schedule::new(
            UserId::new(),
            "Systems design interview",
            ScheduleCategory::Interview,
            now + Duration::minutes(30),
        );

        let request =
            NotificationRequest::for_schedule(&schedule, NotificationChannel::Push, now);

        assert!(request.message.contains("Systems design interview"));
        assert!(request.message.contains("30 minutes"));
        assert_eq!(request.user_id, schedule.owner_id);
    }

    #[test]
    fn request_message_uses_hours_for_long_lead_times() {
        let now = Utc::now();
        let schedule = Schedule::new(
            UserId::new(),
            "Final exam",
            ScheduleCategory::Exam,
            now + Duration::hours(5),
        );

        let request =
            NotificationRequest::for_schedule(&schedule, NotificationChannel::Email, now);
        assert!(request.message.contains("hours"));
    }

    #[test]
    fn request_serde_roundtrip() {
        let now = Utc::now();
        let schedule = Schedule::new(
            UserId::new(),
            "Standup",
            ScheduleCategory::Meeting,
            now + Duration::minutes(10),
        );
        let request =
            NotificationRequest::for_schedule(&schedule, NotificationChannel::InApp, now);

        let json = serde_json::to_string(&request).expect("serialize");
        let parsed: NotificationRequest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(request, parsed);
    }
}
