//! Notification escalation for quiet-sentinel.
//!
//! This crate provides:
//!
//! - **Escalation policy**: Configurable strike-to-level step table
//! - **Escalation state**: Per-(user, schedule) state machine
//! - **Escalation engine**: `decide` / `record_dismissal` / `confirm_sent`
//! - **Dispatch**: Notification dispatcher seam and its NATS implementation
//!
//! The engine replaces a fixed "three strikes, week-long block" policy
//! with a graduated strategy: each dismissal raises the escalation level,
//! and higher levels suppress for longer. Important schedules are always
//! sent, regardless of level.

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod nats;
pub mod policy;
pub mod state;
pub mod store;

pub use dispatch::{NotificationDispatcher, NotificationRequest};
pub use engine::{Decision, EscalationEngine, NotifyAction};
pub use error::{DecideError, DispatchError, StateStoreError};
pub use nats::{NatsConfig, NatsDispatcher};
pub use policy::{EscalationLevel, EscalationPolicy};
pub use state::{DecisionKind, EscalationPhase, EscalationState};
pub use store::{EscalationStateStore, StateVersion, VersionedState};
