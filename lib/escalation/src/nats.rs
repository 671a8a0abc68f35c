//! NATS-backed notification dispatch.
//!
//! Notifications are published to NATS JetStream, one subject per user,
//! where delivery workers (push, email, in-app) consume them. The
//! JetStream publish ack is the delivery confirmation the escalation
//! engine waits for before recording a send as confirmed.

use crate::dispatch::{NotificationDispatcher, NotificationRequest};
use crate::error::DispatchError;
use async_nats::jetstream;
use async_trait::async_trait;
use quiet_sentinel_core::UserId;
use std::sync::Arc;

/// Subject prefix for per-user notification delivery.
const NOTIFY_SUBJECT_PREFIX: &str = "notify.user";

/// Stream name for notifications.
const NOTIFY_STREAM_NAME: &str = "NOTIFICATIONS";

/// Configuration for NATS-based notification dispatch.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URL.
    pub url: String,
    /// Stream name for notifications (defaults to NOTIFICATIONS).
    pub stream_name: Option<String>,
}

impl NatsConfig {
    /// Creates a new config with the given NATS URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream_name: None,
        }
    }

    fn stream(&self) -> &str {
        self.stream_name.as_deref().unwrap_or(NOTIFY_STREAM_NAME)
    }
}

/// NATS JetStream-based notification dispatcher.
///
/// Requests are published to subjects like `notify.user.<user_id>` so
/// each user's notifications replay independently.
pub struct NatsDispatcher {
    jetstream: Arc<jetstream::Context>,
    config: NatsConfig,
}

impl NatsDispatcher {
    /// Creates a new NATS dispatcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or stream setup fails.
    pub async fn new(config: NatsConfig) -> Result<Self, DispatchError> {
        let client = async_nats::connect(&config.url).await.map_err(|e| {
            DispatchError::ConnectionFailed {
                message: e.to_string(),
            }
        })?;

        let jetstream = async_nats::jetstream::new(client);

        Self::ensure_stream(&jetstream, &config).await?;

        Ok(Self {
            jetstream: Arc::new(jetstream),
            config,
        })
    }

    /// Ensures the notification stream exists.
    async fn ensure_stream(
        jetstream: &jetstream::Context,
        config: &NatsConfig,
    ) -> Result<(), DispatchError> {
        let stream_config = jetstream::stream::Config {
            name: config.stream().to_string(),
            subjects: vec![format!("{NOTIFY_SUBJECT_PREFIX}.>")],
            storage: jetstream::stream::StorageType::File,
            retention: jetstream::stream::RetentionPolicy::WorkQueue,
            ..Default::default()
        };

        jetstream
            .get_or_create_stream(stream_config)
            .await
            .map_err(|e| DispatchError::ConnectionFailed {
                message: format!("failed to create notification stream: {e}"),
            })?;

        Ok(())
    }

    /// Returns the subject for a user's notifications.
    fn user_subject(user_id: UserId) -> String {
        format!("{NOTIFY_SUBJECT_PREFIX}.{user_id}")
    }
}

#[async_trait]
impl NotificationDispatcher for NatsDispatcher {
    async fn dispatch(&self, request: &NotificationRequest) -> Result<(), DispatchError> {
        let subject = Self::user_subject(request.user_id);
        let bytes = serde_json::to_vec(request).map_err(|e| DispatchError::PublishFailed {
            message: format!("failed to serialize notification: {e}"),
        })?;

        self.jetstream
            .publish(subject, bytes.into())
            .await
            .map_err(|e| DispatchError::PublishFailed {
                message: e.to_string(),
            })?
            .await
            .map_err(|e| DispatchError::PublishFailed {
                message: e.to_string(),
            })?;

        tracing::debug!(
            notification_id = %request.id,
            user_id = %request.user_id,
            channel = %request.channel,
            "published notification"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nats_config_defaults() {
        let config = NatsConfig::new("nats://localhost:4222");
        assert_eq!(config.stream(), NOTIFY_STREAM_NAME);
    }

    #[test]
    fn nats_config_custom_stream() {
        let config = NatsConfig {
            url: "nats://localhost:4222".to_string(),
            stream_name: Some("CUSTOM_NOTIFICATIONS".to_string()),
        };
        assert_eq!(config.stream(), "CUSTOM_NOTIFICATIONS");
    }

    #[test]
    fn user_subject_format() {
        let user_id = UserId::new();
        let subject = NatsDispatcher::user_subject(user_id);
        assert!(subject.starts_with("notify.user.usr_"));
    }
}
