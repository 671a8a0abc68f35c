//! Core domain types and utilities for the quiet-sentinel platform.
//!
//! This crate provides the foundational ID types and error handling
//! shared by the notification core of the quiet-sentinel assistant
//! backend.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{
    DismissalEventId, EscalationStateId, MemoryNoteId, NotificationId, PrepArtifactId, ScheduleId,
    UserId,
};
