//! Per-(user, schedule) escalation state.
//!
//! The state is the engine's single source of truth: strike count,
//! current level, suppression deadline, and the intent/confirmation
//! timestamps used to keep the send audit trail honest. The phase is
//! always derived from the persisted fields and `now`, never stored.

use crate::policy::EscalationPolicy;
use chrono::{DateTime, Utc};
use quiet_sentinel_core::{EscalationStateId, ScheduleId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The derived phase of an escalation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationPhase {
    /// Notifications sent normally.
    Active,
    /// Resends slowed to the level's interval.
    Throttled { level: u32 },
    /// No notifications until the deadline (unless importance overrides).
    Suppressed { until: DateTime<Utc> },
}

/// The kind of decision the engine last recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Deliver the notification.
    Send,
    /// Hold until the resend interval elapses.
    Delay,
    /// Do not deliver until the suppression deadline.
    Suppress,
}

impl DecisionKind {
    /// Returns the canonical string form, as stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Delay => "delay",
            Self::Suppress => "suppress",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown decision kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDecisionKind {
    /// The unrecognized value.
    pub value: String,
}

impl fmt::Display for UnknownDecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown decision kind '{}'", self.value)
    }
}

impl std::error::Error for UnknownDecisionKind {}

impl FromStr for DecisionKind {
    type Err = UnknownDecisionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send" => Ok(Self::Send),
            "delay" => Ok(Self::Delay),
            "suppress" => Ok(Self::Suppress),
            _ => Err(UnknownDecisionKind {
                value: s.to_string(),
            }),
        }
    }
}

/// Escalation state for one (user, schedule) pair.
///
/// Created on the first relevant event; mutated only by the engine;
/// never hard-deleted. Once the schedule has started the state simply
/// stops being consulted (soft expiry) but remains for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationState {
    /// Unique identifier of the persisted row.
    pub id: EscalationStateId,
    /// The user being notified.
    pub user_id: UserId,
    /// The schedule the notifications concern.
    pub schedule_id: ScheduleId,
    /// Cumulative dismissal count.
    pub strike_count: u32,
    /// Current escalation level index.
    pub level: u32,
    /// When the most recent strike was recorded.
    pub last_strike_at: Option<DateTime<Utc>>,
    /// Suppression deadline, if the current level suppresses.
    pub suppressed_until: Option<DateTime<Utc>>,
    /// The last decision the engine recorded (intent).
    pub last_decision: Option<DecisionKind>,
    /// When the last decision was recorded.
    pub last_decided_at: Option<DateTime<Utc>>,
    /// When a send was last confirmed delivered.
    pub last_sent_at: Option<DateTime<Utc>>,
    /// When the state was created.
    pub created_at: DateTime<Utc>,
    /// When the state was last updated.
    pub updated_at: DateTime<Utc>,
}

impl EscalationState {
    /// Creates a fresh state for a (user, schedule) pair.
    #[must_use]
    pub fn new(user_id: UserId, schedule_id: ScheduleId, now: DateTime<Utc>) -> Self {
        Self {
            id: EscalationStateId::new(),
            user_id,
            schedule_id,
            strike_count: 0,
            level: 0,
            last_strike_at: None,
            suppressed_until: None,
            last_decision: None,
            last_decided_at: None,
            last_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derives the current phase from the persisted fields and `now`.
    #[must_use]
    pub fn phase(&self, now: DateTime<Utc>) -> EscalationPhase {
        if let Some(until) = self.suppressed_until
            && now < until
        {
            return EscalationPhase::Suppressed { until };
        }
        if self.strike_count == 0 {
            EscalationPhase::Active
        } else {
            EscalationPhase::Throttled { level: self.level }
        }
    }

    /// Records one dismissal strike and re-derives level and suppression.
    ///
    /// A dismissal proves the notification reached the user, so any
    /// outstanding send intent is treated as confirmed.
    pub fn record_strike(&mut self, policy: &EscalationPolicy, now: DateTime<Utc>) {
        if self.has_unconfirmed_send() {
            self.last_sent_at = Some(now);
        }
        self.strike_count += 1;
        let (level, entry) = policy.level_for(self.strike_count);
        self.level = level;
        self.last_strike_at = Some(now);
        self.suppressed_until = entry.suppression().map(|window| now + window);
        self.updated_at = now;
    }

    /// Records the engine's decision (intent), without touching strikes.
    pub fn record_decision(&mut self, kind: DecisionKind, now: DateTime<Utc>) {
        self.last_decision = Some(kind);
        self.last_decided_at = Some(now);
        self.updated_at = now;
    }

    /// Records that a send was confirmed delivered.
    pub fn record_sent(&mut self, now: DateTime<Utc>) {
        self.last_sent_at = Some(now);
        self.updated_at = now;
    }

    /// True if the last recorded intent was a send that was never confirmed.
    ///
    /// The sweep re-emits such sends on its next cycle, so a crash
    /// between intent and delivery cannot lose a notification.
    #[must_use]
    pub fn has_unconfirmed_send(&self) -> bool {
        self.last_decision == Some(DecisionKind::Send)
            && match (self.last_decided_at, self.last_sent_at) {
                (Some(decided), Some(sent)) => sent < decided,
                (Some(_), None) => true,
                _ => false,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fresh_state(now: DateTime<Utc>) -> EscalationState {
        EscalationState::new(UserId::new(), ScheduleId::new(), now)
    }

    #[test]
    fn fresh_state_is_active() {
        let now = Utc::now();
        let state = fresh_state(now);
        assert_eq!(state.phase(now), EscalationPhase::Active);
        assert_eq!(state.strike_count, 0);
    }

    #[test]
    fn strikes_raise_the_level() {
        let policy = EscalationPolicy::default();
        let now = Utc::now();
        let mut state = fresh_state(now);

        state.record_strike(&policy, now);
        assert_eq!(state.strike_count, 1);
        assert_eq!(state.phase(now), EscalationPhase::Throttled { level: 1 });

        state.record_strike(&policy, now);
        assert_eq!(state.phase(now), EscalationPhase::Throttled { level: 2 });
    }

    #[test]
    fn enough_strikes_suppress() {
        let policy = EscalationPolicy::default();
        let now = Utc::now();
        let mut state = fresh_state(now);

        for _ in 0..4 {
            state.record_strike(&policy, now);
        }

        let until = state.suppressed_until.expect("should be suppressed");
        assert!(until > now);
        assert_eq!(state.phase(now), EscalationPhase::Suppressed { until });
    }

    #[test]
    fn suppression_expires_into_throttled() {
        let policy = EscalationPolicy::default();
        let now = Utc::now();
        let mut state = fresh_state(now);

        for _ in 0..4 {
            state.record_strike(&policy, now);
        }

        let after = state.suppressed_until.expect("suppressed") + Duration::minutes(1);
        assert!(matches!(
            state.phase(after),
            EscalationPhase::Throttled { level: 3 }
        ));
    }

    #[test]
    fn decision_does_not_touch_strikes() {
        let now = Utc::now();
        let mut state = fresh_state(now);

        state.record_decision(DecisionKind::Send, now);
        assert_eq!(state.strike_count, 0);
        assert_eq!(state.last_decision, Some(DecisionKind::Send));
    }

    #[test]
    fn unconfirmed_send_detection() {
        let now = Utc::now();
        let mut state = fresh_state(now);
        assert!(!state.has_unconfirmed_send());

        state.record_decision(DecisionKind::Send, now);
        assert!(state.has_unconfirmed_send());

        state.record_sent(now + Duration::seconds(1));
        assert!(!state.has_unconfirmed_send());

        state.record_decision(DecisionKind::Send, now + Duration::minutes(5));
        assert!(state.has_unconfirmed_send());
    }

    #[test]
    fn strike_confirms_outstanding_send() {
        let now = Utc::now();
        let mut state = fresh_state(now);

        state.record_decision(DecisionKind::Send, now);
        assert!(state.has_unconfirmed_send());

        // The user dismissed it, so it was delivered.
        state.record_strike(&EscalationPolicy::default(), now + Duration::minutes(1));
        assert!(!state.has_unconfirmed_send());
    }

    #[test]
    fn decision_kind_parse_roundtrip() {
        for kind in [DecisionKind::Send, DecisionKind::Delay, DecisionKind::Suppress] {
            let parsed: DecisionKind = kind.as_str().parse().expect("should parse");
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn state_serde_roundtrip() {
        let now = Utc::now();
        let mut state = fresh_state(now);
        state.record_strike(&EscalationPolicy::default(), now);

        let json = serde_json::to_string(&state).expect("serialize");
        let parsed: EscalationState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(state, parsed);
    }
}
