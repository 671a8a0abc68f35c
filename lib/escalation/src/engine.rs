//! The escalation engine.
//!
//! One public operation per concern:
//!
//! - [`EscalationEngine::record_dismissal`]: fold a dismissal into the
//!   persisted state (strike counting).
//! - [`EscalationEngine::decide`]: compute the next notification action
//!   for a (user, schedule) pair and persist the intent.
//! - [`EscalationEngine::confirm_sent`]: mark a dispatched send as
//!   delivered, closing the intent/confirmation loop.
//!
//! Every operation is a read-modify-write through the state store's
//! check-and-set, retried a bounded number of times on conflict. Store
//! failures are hard failures: the engine never guesses an action.

use crate::error::{DecideError, StateStoreError};
use crate::policy::EscalationPolicy;
use crate::state::{DecisionKind, EscalationPhase, EscalationState};
use crate::store::{EscalationStateStore, StateVersion};
use chrono::{DateTime, Utc};
use quiet_sentinel_core::{ScheduleId, UserId};
use quiet_sentinel_schedule::{DismissalEvent, ImportanceThresholds, Schedule, is_important};

/// Bounded retries for check-and-set races against concurrent triggers.
const MAX_CAS_ATTEMPTS: u32 = 3;

/// The action the engine decided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    /// Deliver the notification now.
    Send,
    /// Hold until the resend interval elapses.
    Delay { until: DateTime<Utc> },
    /// Do not deliver until the suppression deadline.
    Suppress { until: DateTime<Utc> },
}

impl NotifyAction {
    /// The persisted kind of this action.
    #[must_use]
    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::Send => DecisionKind::Send,
            Self::Delay { .. } => DecisionKind::Delay,
            Self::Suppress { .. } => DecisionKind::Suppress,
        }
    }

    /// Returns true if the action delivers a notification.
    #[must_use]
    pub fn is_send(&self) -> bool {
        matches!(self, Self::Send)
    }
}

/// The outcome of a `decide` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// What to do with the pending notification.
    pub action: NotifyAction,
    /// The state as persisted by this decision.
    pub state: EscalationState,
}

/// The escalation engine.
pub struct EscalationEngine<S> {
    store: S,
    policy: EscalationPolicy,
    thresholds: ImportanceThresholds,
}

impl<S: EscalationStateStore> EscalationEngine<S> {
    /// Creates an engine over the given store and configuration.
    pub fn new(store: S, policy: EscalationPolicy, thresholds: ImportanceThresholds) -> Self {
        Self {
            store,
            policy,
            thresholds,
        }
    }

    /// Returns the configured policy.
    #[must_use]
    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    /// Folds a dismissal event into the persisted escalation state.
    ///
    /// Creates the state on the first dismissal. Retries the
    /// check-and-set a bounded number of times so a racing sweep cannot
    /// double-count the strike.
    ///
    /// # Errors
    ///
    /// Fails with [`DecideError::StateUnavailable`] if the store cannot
    /// be reached, or [`DecideError::Conflict`] if the retry budget is
    /// exhausted.
    pub async fn record_dismissal(
        &self,
        event: &DismissalEvent,
    ) -> Result<EscalationState, DecideError> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            let loaded = self.store.load(event.user_id, event.schedule_id).await?;
            let (mut state, version) = match loaded {
                Some(v) => (v.state, Some(v.version)),
                None => (
                    EscalationState::new(event.user_id, event.schedule_id, event.occurred_at),
                    None,
                ),
            };

            state.record_strike(&self.policy, event.occurred_at);

            match self.store.save(&state, version).await {
                Ok(_) => {
                    tracing::debug!(
                        user_id = %event.user_id,
                        schedule_id = %event.schedule_id,
                        strikes = state.strike_count,
                        level = state.level,
                        "recorded dismissal strike"
                    );
                    return Ok(state);
                }
                Err(StateStoreError::Conflict { .. }) if attempts < MAX_CAS_ATTEMPTS => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Computes the next notification action for a (user, schedule) pair.
    ///
    /// The intent is persisted before the caller acts on it, so a crash
    /// between decision and dispatch is recovered on the next cycle.
    /// Calling `decide` twice with the same `now` and no intervening
    /// dismissal returns the same action and leaves the strike count
    /// untouched.
    ///
    /// # Errors
    ///
    /// Fails with [`DecideError::StateUnavailable`] if the store cannot
    /// be reached; the caller must not assume either send or suppress.
    pub async fn decide(
        &self,
        schedule: &Schedule,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Decision, DecideError> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            let loaded = self.store.load(user_id, schedule.id).await?;
            let (mut state, version) = match loaded {
                Some(v) => (v.state, Some(v.version)),
                None => (EscalationState::new(user_id, schedule.id, now), None),
            };

            let action = self.action_for(schedule, &state, now);
            state.record_decision(action.kind(), now);

            match self.store.save(&state, version).await {
                Ok(_) => return Ok(Decision { action, state }),
                Err(StateStoreError::Conflict { .. }) if attempts < MAX_CAS_ATTEMPTS => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Marks a dispatched send as delivered.
    ///
    /// # Errors
    ///
    /// Fails with [`DecideError::MissingState`] if no state exists for
    /// the pair, which indicates a send was dispatched without a
    /// decision.
    pub async fn confirm_sent(
        &self,
        user_id: UserId,
        schedule_id: ScheduleId,
        now: DateTime<Utc>,
    ) -> Result<EscalationState, DecideError> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            let Some(loaded) = self.store.load(user_id, schedule_id).await? else {
                return Err(DecideError::MissingState {
                    user_id,
                    schedule_id,
                });
            };

            let mut state = loaded.state;
            state.record_sent(now);

            match self.store.save(&state, Some(loaded.version)).await {
                Ok(_) => return Ok(state),
                Err(StateStoreError::Conflict { .. }) if attempts < MAX_CAS_ATTEMPTS => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Maps (schedule, state, now) to an action.
    ///
    /// The importance override dominates: an important schedule is sent
    /// no matter how many strikes have accumulated.
    fn action_for(
        &self,
        schedule: &Schedule,
        state: &EscalationState,
        now: DateTime<Utc>,
    ) -> NotifyAction {
        if is_important(schedule, now, &self.thresholds) {
            return NotifyAction::Send;
        }

        if state.has_unconfirmed_send() {
            // A previous send intent was never confirmed delivered;
            // re-emit it rather than losing the notification.
            return NotifyAction::Send;
        }

        match state.phase(now) {
            EscalationPhase::Active => self.resend_gate(state, 0, now),
            EscalationPhase::Suppressed { until } => NotifyAction::Suppress { until },
            EscalationPhase::Throttled { level } => self.resend_gate(state, level, now),
        }
    }

    /// Sends unless the level's resend interval has not yet elapsed
    /// since the last confirmed send or strike.
    fn resend_gate(&self, state: &EscalationState, level: u32, now: DateTime<Utc>) -> NotifyAction {
        let entry = self.policy.level(level);
        let base = state.last_sent_at.max(state.last_strike_at);
        match base {
            Some(base) if now < base + entry.resend_interval() => NotifyAction::Delay {
                until: base + entry.resend_interval(),
            },
            _ => NotifyAction::Send,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VersionedState;
    use async_trait::async_trait;
    use chrono::Duration;
    use quiet_sentinel_schedule::{NotificationChannel, ScheduleCategory};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory state store with check-and-set semantics for testing.
    #[derive(Default, Clone)]
    struct InMemoryStateStore {
        states: Arc<Mutex<HashMap<(UserId, ScheduleId), VersionedState>>>,
    }

    #[async_trait]
    impl EscalationStateStore for InMemoryStateStore {
        async fn load(
            &self,
            user_id: UserId,
            schedule_id: ScheduleId,
        ) -> Result<Option<VersionedState>, StateStoreError> {
            Ok(self
                .states
                .lock()
                .unwrap()
                .get(&(user_id, schedule_id))
                .cloned())
        }

        async fn save(
            &self,
            state: &EscalationState,
            expected_version: Option<StateVersion>,
        ) -> Result<StateVersion, StateStoreError> {
            let mut states = self.states.lock().unwrap();
            let key = (state.user_id, state.schedule_id);
            let current = states.get(&key).map(|v| v.version);

            if current != expected_version {
                return Err(StateStoreError::Conflict {
                    user_id: state.user_id,
                    schedule_id: state.schedule_id,
                });
            }

            let next = current.unwrap_or(0) + 1;
            states.insert(
                key,
                VersionedState {
                    state: state.clone(),
                    version: next,
                },
            );
            Ok(next)
        }
    }

    /// Store that always fails, for hard-failure tests.
    struct UnavailableStore;

    #[async_trait]
    impl EscalationStateStore for UnavailableStore {
        async fn load(
            &self,
            _user_id: UserId,
            _schedule_id: ScheduleId,
        ) -> Result<Option<VersionedState>, StateStoreError> {
            Err(StateStoreError::Unavailable {
                reason: "connection refused".to_string(),
            })
        }

        async fn save(
            &self,
            _state: &EscalationState,
            _expected_version: Option<StateVersion>,
        ) -> Result<StateVersion, StateStoreError> {
            Err(StateStoreError::Unavailable {
                reason: "connection refused".to_string(),
            })
        }
    }

    /// Store that injects save conflicts before delegating.
    struct ConflictingStore {
        inner: InMemoryStateStore,
        conflicts_remaining: AtomicU32,
    }

    impl ConflictingStore {
        fn new(conflicts: u32) -> Self {
            Self {
                inner: InMemoryStateStore::default(),
                conflicts_remaining: AtomicU32::new(conflicts),
            }
        }
    }

    #[async_trait]
    impl EscalationStateStore for ConflictingStore {
        async fn load(
            &self,
            user_id: UserId,
            schedule_id: ScheduleId,
        ) -> Result<Option<VersionedState>, StateStoreError> {
            self.inner.load(user_id, schedule_id).await
        }

        async fn save(
            &self,
            state: &EscalationState,
            expected_version: Option<StateVersion>,
        ) -> Result<StateVersion, StateStoreError> {
            if self
                .conflicts_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StateStoreError::Conflict {
                    user_id: state.user_id,
                    schedule_id: state.schedule_id,
                });
            }
            self.inner.save(state, expected_version).await
        }
    }

    fn engine_with(store: impl EscalationStateStore) -> EscalationEngine<impl EscalationStateStore> {
        EscalationEngine::new(
            store,
            EscalationPolicy::default(),
            ImportanceThresholds::default(),
        )
    }

    fn schedule_starting_in(
        category: ScheduleCategory,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> Schedule {
        Schedule::new(
            UserId::new(),
            "Event",
            category,
            now + Duration::minutes(minutes),
        )
    }

    fn dismissal_at(
        user_id: UserId,
        schedule_id: ScheduleId,
        at: DateTime<Utc>,
    ) -> DismissalEvent {
        DismissalEvent::new(schedule_id, user_id, NotificationChannel::Push, at)
    }

    #[tokio::test]
    async fn first_decide_creates_state_and_sends() {
        let engine = engine_with(InMemoryStateStore::default());
        let now = Utc::now();
        // Ten days out: not important, no strikes yet.
        let schedule = schedule_starting_in(ScheduleCategory::Meeting, 10 * 24 * 60, now);
        let user_id = UserId::new();

        let decision = engine.decide(&schedule, user_id, now).await.unwrap();

        assert!(decision.action.is_send());
        assert_eq!(decision.state.strike_count, 0);
        assert_eq!(decision.state.last_decision, Some(DecisionKind::Send));
    }

    #[tokio::test]
    async fn important_schedule_is_never_suppressed() {
        let engine = engine_with(InMemoryStateStore::default());
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Interview, 30, now);
        let user_id = UserId::new();

        // Pile on strikes; the override must hold at every count.
        for strikes in 0..8 {
            let decision = engine.decide(&schedule, user_id, now).await.unwrap();
            assert!(
                decision.action.is_send(),
                "suppressed an important schedule at {strikes} strikes"
            );

            engine
                .record_dismissal(&dismissal_at(user_id, schedule.id, now))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn important_decide_leaves_strikes_untouched() {
        let engine = engine_with(InMemoryStateStore::default());
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Exam, 60, now);
        let user_id = UserId::new();

        for _ in 0..3 {
            engine
                .record_dismissal(&dismissal_at(user_id, schedule.id, now))
                .await
                .unwrap();
        }

        let decision = engine.decide(&schedule, user_id, now).await.unwrap();
        assert!(decision.action.is_send());
        assert_eq!(decision.state.strike_count, 3);
    }

    #[tokio::test]
    async fn decide_is_idempotent() {
        let engine = engine_with(InMemoryStateStore::default());
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Meeting, 10 * 24 * 60, now);
        let user_id = UserId::new();

        engine
            .record_dismissal(&dismissal_at(user_id, schedule.id, now))
            .await
            .unwrap();

        let first = engine.decide(&schedule, user_id, now).await.unwrap();
        let second = engine.decide(&schedule, user_id, now).await.unwrap();

        assert_eq!(first.action, second.action);
        assert_eq!(first.state.strike_count, second.state.strike_count);
    }

    #[tokio::test]
    async fn suppression_grows_with_strikes() {
        let engine = engine_with(InMemoryStateStore::default());
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Meeting, 10 * 24 * 60, now);
        let user_id = UserId::new();

        let mut previous = Duration::zero();
        for _ in 1..=8 {
            let state = engine
                .record_dismissal(&dismissal_at(user_id, schedule.id, now))
                .await
                .unwrap();

            let suppression = state
                .suppressed_until
                .map_or(Duration::zero(), |until| until - now);
            assert!(
                suppression >= previous,
                "suppression shrank at {} strikes",
                state.strike_count
            );
            previous = suppression;
        }
    }

    #[tokio::test]
    async fn interview_in_30_minutes_with_three_dismissals_sends() {
        let engine = engine_with(InMemoryStateStore::default());
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Interview, 30, now);
        let user_id = UserId::new();

        for _ in 0..3 {
            engine
                .record_dismissal(&dismissal_at(user_id, schedule.id, now))
                .await
                .unwrap();
        }

        let decision = engine.decide(&schedule, user_id, now).await.unwrap();
        assert!(decision.action.is_send());
    }

    #[tokio::test]
    async fn distant_meeting_with_four_dismissals_suppresses_until_future() {
        let engine = engine_with(InMemoryStateStore::default());
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Meeting, 10 * 24 * 60, now);
        let user_id = UserId::new();

        for _ in 0..4 {
            engine
                .record_dismissal(&dismissal_at(user_id, schedule.id, now))
                .await
                .unwrap();
        }

        let decision = engine.decide(&schedule, user_id, now).await.unwrap();
        match decision.action {
            NotifyAction::Suppress { until } => assert!(until > now),
            other => panic!("expected Suppress, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn throttled_schedule_delays_then_sends() {
        let engine = engine_with(InMemoryStateStore::default());
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Meeting, 10 * 24 * 60, now);
        let user_id = UserId::new();

        // One strike: level 1, 30 minute resend interval.
        engine
            .record_dismissal(&dismissal_at(user_id, schedule.id, now))
            .await
            .unwrap();

        let decision = engine.decide(&schedule, user_id, now).await.unwrap();
        match decision.action {
            NotifyAction::Delay { until } => {
                assert_eq!(until, now + Duration::minutes(30));
            }
            other => panic!("expected Delay, got {other:?}"),
        }

        let later = now + Duration::minutes(31);
        let decision = engine.decide(&schedule, user_id, later).await.unwrap();
        assert!(decision.action.is_send());
    }

    #[tokio::test]
    async fn unconfirmed_send_is_reemitted() {
        let engine = engine_with(InMemoryStateStore::default());
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Meeting, 10 * 24 * 60, now);
        let user_id = UserId::new();

        engine
            .record_dismissal(&dismissal_at(user_id, schedule.id, now))
            .await
            .unwrap();

        // First send intent after the resend interval; never confirmed.
        let t1 = now + Duration::minutes(31);
        let decision = engine.decide(&schedule, user_id, t1).await.unwrap();
        assert!(decision.action.is_send());

        // Next sweep re-emits rather than delaying.
        let t2 = t1 + Duration::minutes(1);
        let decision = engine.decide(&schedule, user_id, t2).await.unwrap();
        assert!(decision.action.is_send());

        // After confirmation the resend interval applies again.
        engine.confirm_sent(user_id, schedule.id, t2).await.unwrap();
        let t3 = t2 + Duration::minutes(1);
        let decision = engine.decide(&schedule, user_id, t3).await.unwrap();
        assert!(matches!(decision.action, NotifyAction::Delay { .. }));
    }

    #[tokio::test]
    async fn store_unavailable_is_a_hard_failure() {
        let engine = engine_with(UnavailableStore);
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Meeting, 60 * 24, now);

        let err = engine
            .decide(&schedule, UserId::new(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, DecideError::StateUnavailable { .. }));
    }

    #[tokio::test]
    async fn cas_conflict_retries_then_succeeds() {
        let engine = engine_with(ConflictingStore::new(1));
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Meeting, 10 * 24 * 60, now);
        let user_id = UserId::new();

        let state = engine
            .record_dismissal(&dismissal_at(user_id, schedule.id, now))
            .await
            .unwrap();
        assert_eq!(state.strike_count, 1);
    }

    #[tokio::test]
    async fn cas_conflict_exhaustion_fails() {
        let engine = engine_with(ConflictingStore::new(u32::MAX));
        let now = Utc::now();
        let schedule = schedule_starting_in(ScheduleCategory::Meeting, 10 * 24 * 60, now);
        let user_id = UserId::new();

        let err = engine
            .record_dismissal(&dismissal_at(user_id, schedule.id, now))
            .await
            .unwrap_err();
        assert!(matches!(err, DecideError::Conflict { .. }));
    }

    #[tokio::test]
    async fn confirm_without_state_is_an_error() {
        let engine = engine_with(InMemoryStateStore::default());
        let err = engine
            .confirm_sent(UserId::new(), ScheduleId::new(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DecideError::MissingState { .. }));
    }
}
