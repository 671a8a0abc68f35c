//! Error types for the escalation crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `StateStoreError`: Errors from escalation state storage
//! - `DecideError`: Errors from engine operations
//! - `DispatchError`: Errors from notification dispatch

use quiet_sentinel_core::{ScheduleId, UserId};
use std::fmt;

/// Errors from escalation state storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateStoreError {
    /// The store could not be reached.
    Unavailable { reason: String },
    /// A concurrent writer changed the state first.
    Conflict {
        user_id: UserId,
        schedule_id: ScheduleId,
    },
    /// A query failed.
    QueryFailed { reason: String },
}

impl fmt::Display for StateStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "escalation state store unavailable: {reason}")
            }
            Self::Conflict {
                user_id,
                schedule_id,
            } => {
                write!(
                    f,
                    "concurrent escalation state write for {user_id}/{schedule_id}"
                )
            }
            Self::QueryFailed { reason } => {
                write!(f, "escalation state query failed: {reason}")
            }
        }
    }
}

impl std::error::Error for StateStoreError {}

/// Errors from engine operations.
///
/// A failed `decide` is a hard failure: the caller must not fall back to
/// either sending or suppressing, since guessing could spam the user or
/// silently drop a critical alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecideError {
    /// The escalation state store could not be reached.
    StateUnavailable { reason: String },
    /// Concurrent writers exhausted the check-and-set retry budget.
    Conflict {
        user_id: UserId,
        schedule_id: ScheduleId,
    },
    /// No escalation state exists where one was required.
    MissingState {
        user_id: UserId,
        schedule_id: ScheduleId,
    },
}

impl fmt::Display for DecideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateUnavailable { reason } => {
                write!(f, "escalation state unavailable: {reason}")
            }
            Self::Conflict {
                user_id,
                schedule_id,
            } => {
                write!(
                    f,
                    "escalation decision conflict for {user_id}/{schedule_id}"
                )
            }
            Self::MissingState {
                user_id,
                schedule_id,
            } => {
                write!(f, "no escalation state for {user_id}/{schedule_id}")
            }
        }
    }
}

impl std::error::Error for DecideError {}

impl From<StateStoreError> for DecideError {
    fn from(e: StateStoreError) -> Self {
        match e {
            StateStoreError::Unavailable { reason } | StateStoreError::QueryFailed { reason } => {
                Self::StateUnavailable { reason }
            }
            StateStoreError::Conflict {
                user_id,
                schedule_id,
            } => Self::Conflict {
                user_id,
                schedule_id,
            },
        }
    }
}

/// Errors from notification dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Failed to connect to the dispatch backend.
    ConnectionFailed { message: String },
    /// Failed to publish the notification.
    PublishFailed { message: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { message } => {
                write!(f, "dispatch connection failed: {message}")
            }
            Self::PublishFailed { message } => {
                write!(f, "notification publish failed: {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_store_error_display() {
        let err = StateStoreError::Unavailable {
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("unavailable"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn store_unavailable_maps_to_state_unavailable() {
        let err: DecideError = StateStoreError::Unavailable {
            reason: "timeout".to_string(),
        }
        .into();
        assert!(matches!(err, DecideError::StateUnavailable { .. }));
    }

    #[test]
    fn store_conflict_maps_to_conflict() {
        let err: DecideError = StateStoreError::Conflict {
            user_id: UserId::new(),
            schedule_id: ScheduleId::new(),
        }
        .into();
        assert!(matches!(err, DecideError::Conflict { .. }));
    }

    #[test]
    fn dispatch_error_display() {
        let err = DispatchError::PublishFailed {
            message: "stream gone".to_string(),
        };
        assert!(err.to_string().contains("publish failed"));
    }
}
