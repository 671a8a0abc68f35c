//! API error mapping.
//!
//! Domain errors carry internal detail (IDs, store reasons); responses
//! expose only user-safe messages with the right status code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quiet_sentinel_escalation::DecideError;
use quiet_sentinel_prep::PrepError;
use quiet_sentinel_schedule::{
    AccountStoreError, DismissalLogError, InvalidScheduleData, ScheduleStoreError,
};
use serde_json::json;
use std::fmt;

/// Errors surfaced by API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The requested resource does not exist.
    NotFound { resource: String },
    /// The request itself is malformed.
    InvalidRequest { reason: String },
    /// A stored schedule record is malformed.
    InvalidSchedule(InvalidScheduleData),
    /// A backing store could not be reached.
    Unavailable { reason: String },
    /// Concurrent writers collided beyond the retry budget.
    Conflict { reason: String },
    /// Anything else.
    Internal { reason: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { resource } => write!(f, "{resource} not found"),
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::InvalidSchedule(e) => write!(f, "invalid schedule data: {e}"),
            Self::Unavailable { reason } => write!(f, "store unavailable: {reason}"),
            Self::Conflict { reason } => write!(f, "conflict: {reason}"),
            Self::Internal { reason } => write!(f, "internal error: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound { resource } => {
                (StatusCode::NOT_FOUND, format!("{resource} not found"))
            }
            Self::InvalidRequest { reason } => {
                (StatusCode::BAD_REQUEST, format!("invalid request: {reason}"))
            }
            Self::InvalidSchedule(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "schedule record is invalid".to_string(),
            ),
            Self::Unavailable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service temporarily unavailable".to_string(),
            ),
            Self::Conflict { .. } => (
                StatusCode::CONFLICT,
                "concurrent update, retry".to_string(),
            ),
            Self::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<InvalidScheduleData> for ApiError {
    fn from(e: InvalidScheduleData) -> Self {
        Self::InvalidSchedule(e)
    }
}

impl From<DecideError> for ApiError {
    fn from(e: DecideError) -> Self {
        match e {
            DecideError::StateUnavailable { reason } => Self::Unavailable { reason },
            DecideError::Conflict { .. } | DecideError::MissingState { .. } => Self::Conflict {
                reason: e.to_string(),
            },
        }
    }
}

impl From<PrepError> for ApiError {
    fn from(e: PrepError) -> Self {
        Self::Unavailable {
            reason: e.to_string(),
        }
    }
}

impl From<ScheduleStoreError> for ApiError {
    fn from(e: ScheduleStoreError) -> Self {
        match e {
            ScheduleStoreError::InvalidRecord(inner) => Self::InvalidSchedule(inner),
            other => Self::Unavailable {
                reason: other.to_string(),
            },
        }
    }
}

impl From<AccountStoreError> for ApiError {
    fn from(e: AccountStoreError) -> Self {
        Self::Unavailable {
            reason: e.to_string(),
        }
    }
}

impl From<DismissalLogError> for ApiError {
    fn from(e: DismissalLogError) -> Self {
        Self::Unavailable {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiet_sentinel_core::ScheduleId;

    #[test]
    fn invalid_schedule_maps_to_unprocessable() {
        let err = ApiError::InvalidSchedule(InvalidScheduleData::MissingStartTime {
            id: ScheduleId::new(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn decide_unavailable_maps_to_service_unavailable() {
        let err: ApiError = DecideError::StateUnavailable {
            reason: "pool exhausted".to_string(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn not_found_message_is_user_safe() {
        let err = ApiError::NotFound {
            resource: "schedule".to_string(),
        };
        assert_eq!(
            err.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
