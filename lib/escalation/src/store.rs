//! Storage seam for escalation state.
//!
//! The same (user, schedule) key may be written by the periodic sweep
//! and a manual trigger at once, so every write is an optimistic
//! check-and-set against the version read. The engine retries a bounded
//! number of times; the store never merges.

use crate::error::StateStoreError;
use crate::state::EscalationState;
use async_trait::async_trait;
use quiet_sentinel_core::{ScheduleId, UserId};

/// Monotonically increasing version of a persisted state row.
pub type StateVersion = i64;

/// An escalation state together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedState {
    /// The persisted state.
    pub state: EscalationState,
    /// The version to pass back on save.
    pub version: StateVersion,
}

/// Trait for escalation state storage with check-and-set semantics.
#[async_trait]
pub trait EscalationStateStore: Send + Sync {
    /// Loads the state for a (user, schedule) pair, with its version.
    async fn load(
        &self,
        user_id: UserId,
        schedule_id: ScheduleId,
    ) -> Result<Option<VersionedState>, StateStoreError>;

    /// Saves a state transition.
    ///
    /// With `expected_version` of `None` the state must not exist yet;
    /// otherwise the persisted version must still match. Either mismatch
    /// fails with [`StateStoreError::Conflict`] and writes nothing.
    async fn save(
        &self,
        state: &EscalationState,
        expected_version: Option<StateVersion>,
    ) -> Result<StateVersion, StateStoreError>;
}
