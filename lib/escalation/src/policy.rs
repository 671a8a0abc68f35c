//! Escalation policy configuration.
//!
//! The policy is a monotonic step table mapping cumulative strike counts
//! to escalation levels. Exact thresholds and durations are product
//! policy supplied through configuration; the engine only enforces the
//! shape: more strikes never map to a shorter suppression.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One level of the escalation step table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationLevel {
    /// The smallest strike count at which this level applies.
    pub min_strikes: u32,
    /// How long notifications are suppressed after a strike at this level.
    /// Zero means no suppression.
    pub suppress_minutes: i64,
    /// Minimum interval between resends while at this level.
    pub resend_interval_minutes: i64,
}

impl EscalationLevel {
    /// The suppression window, if this level suppresses at all.
    #[must_use]
    pub fn suppression(&self) -> Option<Duration> {
        (self.suppress_minutes > 0).then(|| Duration::minutes(self.suppress_minutes))
    }

    /// The resend interval as a duration.
    #[must_use]
    pub fn resend_interval(&self) -> Duration {
        Duration::minutes(self.resend_interval_minutes)
    }
}

/// The full escalation step table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationPolicy {
    /// Levels ordered by `min_strikes`, starting at zero.
    pub levels: Vec<EscalationLevel>,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            levels: vec![
                EscalationLevel {
                    min_strikes: 0,
                    suppress_minutes: 0,
                    resend_interval_minutes: 0,
                },
                EscalationLevel {
                    min_strikes: 1,
                    suppress_minutes: 0,
                    resend_interval_minutes: 30,
                },
                EscalationLevel {
                    min_strikes: 2,
                    suppress_minutes: 0,
                    resend_interval_minutes: 120,
                },
                EscalationLevel {
                    min_strikes: 4,
                    suppress_minutes: 24 * 60,
                    resend_interval_minutes: 4 * 60,
                },
                EscalationLevel {
                    min_strikes: 6,
                    suppress_minutes: 7 * 24 * 60,
                    resend_interval_minutes: 24 * 60,
                },
            ],
        }
    }
}

impl EscalationPolicy {
    /// Validates the step table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is empty, does not start at zero
    /// strikes, has non-increasing strike thresholds, or maps more
    /// strikes to a shorter suppression.
    pub fn validate(&self) -> Result<(), InvalidPolicy> {
        let Some(first) = self.levels.first() else {
            return Err(InvalidPolicy::Empty);
        };
        if first.min_strikes != 0 {
            return Err(InvalidPolicy::FirstLevelNotZero {
                min_strikes: first.min_strikes,
            });
        }

        for (index, pair) in self.levels.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.min_strikes <= prev.min_strikes {
                return Err(InvalidPolicy::StrikesNotIncreasing { level: index + 1 });
            }
            if next.suppress_minutes < prev.suppress_minutes {
                return Err(InvalidPolicy::SuppressionNotMonotonic { level: index + 1 });
            }
        }

        Ok(())
    }

    /// Maps a strike count to its level index and entry.
    ///
    /// Returns the highest level whose `min_strikes` does not exceed the
    /// count. Monotonic: a larger count never maps to a lower level.
    #[must_use]
    pub fn level_for(&self, strike_count: u32) -> (u32, &EscalationLevel) {
        let mut selected = 0;
        for (index, level) in self.levels.iter().enumerate() {
            if level.min_strikes <= strike_count {
                selected = index;
            } else {
                break;
            }
        }
        (selected as u32, &self.levels[selected])
    }

    /// Returns the entry for a level index, clamped to the table.
    #[must_use]
    pub fn level(&self, index: u32) -> &EscalationLevel {
        let clamped = (index as usize).min(self.levels.len() - 1);
        &self.levels[clamped]
    }
}

/// Invalid escalation policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidPolicy {
    /// The level table is empty.
    Empty,
    /// The first level does not start at zero strikes.
    FirstLevelNotZero { min_strikes: u32 },
    /// Strike thresholds are not strictly increasing.
    StrikesNotIncreasing { level: usize },
    /// A higher level suppresses for less time than a lower one.
    SuppressionNotMonotonic { level: usize },
}

impl fmt::Display for InvalidPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "escalation policy has no levels"),
            Self::FirstLevelNotZero { min_strikes } => {
                write!(f, "first escalation level starts at {min_strikes} strikes, expected 0")
            }
            Self::StrikesNotIncreasing { level } => {
                write!(f, "strike threshold at level {level} does not increase")
            }
            Self::SuppressionNotMonotonic { level } => {
                write!(f, "suppression at level {level} is shorter than the level below")
            }
        }
    }
}

impl std::error::Error for InvalidPolicy {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        assert!(EscalationPolicy::default().validate().is_ok());
    }

    #[test]
    fn level_mapping_is_monotonic() {
        let policy = EscalationPolicy::default();

        let mut previous_level = 0;
        let mut previous_suppression = 0;
        for strikes in 0..20 {
            let (level, entry) = policy.level_for(strikes);
            assert!(level >= previous_level, "level dropped at {strikes} strikes");
            assert!(
                entry.suppress_minutes >= previous_suppression,
                "suppression dropped at {strikes} strikes"
            );
            previous_level = level;
            previous_suppression = entry.suppress_minutes;
        }
    }

    #[test]
    fn level_for_selects_highest_applicable() {
        let policy = EscalationPolicy::default();

        assert_eq!(policy.level_for(0).0, 0);
        assert_eq!(policy.level_for(1).0, 1);
        assert_eq!(policy.level_for(3).0, 2);
        assert_eq!(policy.level_for(4).0, 3);
        assert_eq!(policy.level_for(100).0, 4);
    }

    #[test]
    fn empty_policy_is_rejected() {
        let policy = EscalationPolicy { levels: Vec::new() };
        assert_eq!(policy.validate(), Err(InvalidPolicy::Empty));
    }

    #[test]
    fn non_zero_first_level_is_rejected() {
        let policy = EscalationPolicy {
            levels: vec![EscalationLevel {
                min_strikes: 2,
                suppress_minutes: 0,
                resend_interval_minutes: 0,
            }],
        };
        assert!(matches!(
            policy.validate(),
            Err(InvalidPolicy::FirstLevelNotZero { .. })
        ));
    }

    #[test]
    fn shrinking_suppression_is_rejected() {
        let policy = EscalationPolicy {
            levels: vec![
                EscalationLevel {
                    min_strikes: 0,
                    suppress_minutes: 60,
                    resend_interval_minutes: 0,
                },
                EscalationLevel {
                    min_strikes: 3,
                    suppress_minutes: 30,
                    resend_interval_minutes: 0,
                },
            ],
        };
        assert!(matches!(
            policy.validate(),
            Err(InvalidPolicy::SuppressionNotMonotonic { .. })
        ));
    }

    #[test]
    fn duplicate_strike_threshold_is_rejected() {
        let policy = EscalationPolicy {
            levels: vec![
                EscalationLevel {
                    min_strikes: 0,
                    suppress_minutes: 0,
                    resend_interval_minutes: 0,
                },
                EscalationLevel {
                    min_strikes: 0,
                    suppress_minutes: 10,
                    resend_interval_minutes: 0,
                },
            ],
        };
        assert!(matches!(
            policy.validate(),
            Err(InvalidPolicy::StrikesNotIncreasing { .. })
        ));
    }

    #[test]
    fn policy_serde_roundtrip() {
        let policy = EscalationPolicy::default();
        let json = serde_json::to_string(&policy).expect("serialize");
        let parsed: EscalationPolicy = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(policy, parsed);
    }
}
