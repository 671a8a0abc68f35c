//! Error types for the schedule crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `InvalidScheduleData`: Malformed schedule records
//! - `ScheduleStoreError`: Errors from schedule storage
//! - `AccountStoreError`: Errors from account storage
//! - `DismissalLogError`: Errors from the dismissal log

use quiet_sentinel_core::{ScheduleId, UserId};
use std::fmt;

/// A schedule record that cannot be interpreted as a valid schedule.
///
/// These fail the whole enclosing operation: a schedule with no start
/// time or category must never be silently classified as unimportant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidScheduleData {
    /// The record has no start time.
    MissingStartTime { id: ScheduleId },
    /// The record has no category.
    MissingCategory { id: ScheduleId },
    /// The record's category is not a recognized value.
    UnknownCategory { id: ScheduleId, value: String },
}

impl fmt::Display for InvalidScheduleData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartTime { id } => {
                write!(f, "schedule {id} has no start time")
            }
            Self::MissingCategory { id } => {
                write!(f, "schedule {id} has no category")
            }
            Self::UnknownCategory { id, value } => {
                write!(f, "schedule {id} has unknown category '{value}'")
            }
        }
    }
}

impl std::error::Error for InvalidScheduleData {}

/// Errors from schedule storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleStoreError {
    /// The store could not be reached.
    Unavailable { reason: String },
    /// A query failed.
    QueryFailed { reason: String },
    /// A stored record is malformed.
    InvalidRecord(InvalidScheduleData),
}

impl fmt::Display for ScheduleStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "schedule store unavailable: {reason}")
            }
            Self::QueryFailed { reason } => {
                write!(f, "schedule query failed: {reason}")
            }
            Self::InvalidRecord(e) => write!(f, "invalid schedule record: {e}"),
        }
    }
}

impl std::error::Error for ScheduleStoreError {}

impl From<InvalidScheduleData> for ScheduleStoreError {
    fn from(e: InvalidScheduleData) -> Self {
        Self::InvalidRecord(e)
    }
}

/// Errors from account storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStoreError {
    /// No account exists for the user.
    NotFound { user_id: UserId },
    /// The store could not be reached.
    Unavailable { reason: String },
    /// A query failed.
    QueryFailed { reason: String },
}

impl fmt::Display for AccountStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { user_id } => {
                write!(f, "account not found for {user_id}")
            }
            Self::Unavailable { reason } => {
                write!(f, "account store unavailable: {reason}")
            }
            Self::QueryFailed { reason } => {
                write!(f, "account query failed: {reason}")
            }
        }
    }
}

impl std::error::Error for AccountStoreError {}

/// Errors from the dismissal log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DismissalLogError {
    /// Appending an event failed.
    AppendFailed { reason: String },
    /// A query failed.
    QueryFailed { reason: String },
}

impl fmt::Display for DismissalLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppendFailed { reason } => {
                write!(f, "dismissal append failed: {reason}")
            }
            Self::QueryFailed { reason } => {
                write!(f, "dismissal query failed: {reason}")
            }
        }
    }
}

impl std::error::Error for DismissalLogError {}
