//! Importance classification for schedules.
//!
//! A pure predicate over (schedule, now, thresholds). Importance is
//! derived, never stored: the same schedule flips to important as its
//! start time approaches. The escalation engine uses this to override
//! suppression, so the classifier must never silently downgrade a
//! malformed record — validation happens before a schedule reaches it
//! (see [`crate::ScheduleRecord::try_into_schedule`]).

use crate::schedule::Schedule;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time thresholds for the importance classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceThresholds {
    /// High-stakes categories become important this many minutes before start.
    #[serde(default = "default_urgency_minutes")]
    pub urgency_minutes: i64,

    /// Any category becomes important this many minutes before start.
    #[serde(default = "default_imminent_minutes")]
    pub imminent_minutes: i64,
}

fn default_urgency_minutes() -> i64 {
    24 * 60
}

fn default_imminent_minutes() -> i64 {
    15
}

impl Default for ImportanceThresholds {
    fn default() -> Self {
        Self {
            urgency_minutes: default_urgency_minutes(),
            imminent_minutes: default_imminent_minutes(),
        }
    }
}

impl ImportanceThresholds {
    /// Validates the threshold configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either window is non-positive or the imminent
    /// window exceeds the urgency window.
    pub fn validate(&self) -> Result<(), InvalidThresholds> {
        if self.urgency_minutes <= 0 || self.imminent_minutes <= 0 {
            return Err(InvalidThresholds::NonPositiveWindow {
                urgency_minutes: self.urgency_minutes,
                imminent_minutes: self.imminent_minutes,
            });
        }
        if self.imminent_minutes > self.urgency_minutes {
            return Err(InvalidThresholds::ImminentExceedsUrgency {
                urgency_minutes: self.urgency_minutes,
                imminent_minutes: self.imminent_minutes,
            });
        }
        Ok(())
    }

    /// The urgency window as a duration.
    #[must_use]
    pub fn urgency_window(&self) -> Duration {
        Duration::minutes(self.urgency_minutes)
    }

    /// The imminent window as a duration.
    #[must_use]
    pub fn imminent_window(&self) -> Duration {
        Duration::minutes(self.imminent_minutes)
    }
}

/// Invalid threshold configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidThresholds {
    /// A window was zero or negative.
    NonPositiveWindow {
        urgency_minutes: i64,
        imminent_minutes: i64,
    },
    /// The imminent window was longer than the urgency window.
    ImminentExceedsUrgency {
        urgency_minutes: i64,
        imminent_minutes: i64,
    },
}

impl fmt::Display for InvalidThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveWindow {
                urgency_minutes,
                imminent_minutes,
            } => write!(
                f,
                "importance windows must be positive (urgency={urgency_minutes}m, imminent={imminent_minutes}m)"
            ),
            Self::ImminentExceedsUrgency {
                urgency_minutes,
                imminent_minutes,
            } => write!(
                f,
                "imminent window ({imminent_minutes}m) exceeds urgency window ({urgency_minutes}m)"
            ),
        }
    }
}

impl std::error::Error for InvalidThresholds {}

/// Decides whether a schedule is important at `now`.
///
/// A schedule is important if any of the following holds:
///
/// 1. It starts within the urgency window and its category is
///    high-stakes (exam, interview, presentation).
/// 2. Its explicit critical flag is set.
/// 3. It starts within the imminent window, regardless of category.
///
/// Pure function of its arguments; deterministic and side-effect free.
#[must_use]
pub fn is_important(
    schedule: &Schedule,
    now: DateTime<Utc>,
    thresholds: &ImportanceThresholds,
) -> bool {
    if schedule.critical {
        return true;
    }

    let until_start = schedule.time_until_start(now);
    if until_start <= Duration::zero() {
        // Already started; the remaining rules only apply to upcoming events.
        return false;
    }

    if schedule.category.is_high_stakes() && until_start <= thresholds.urgency_window() {
        return true;
    }

    until_start <= thresholds.imminent_window()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::ScheduleCategory;
    use quiet_sentinel_core::UserId;

    fn schedule_starting_in(category: ScheduleCategory, minutes: i64) -> (Schedule, DateTime<Utc>) {
        let now = Utc::now();
        let schedule = Schedule::new(
            UserId::new(),
            "Event",
            category,
            now + Duration::minutes(minutes),
        );
        (schedule, now)
    }

    #[test]
    fn high_stakes_within_urgency_window_is_important() {
        let thresholds = ImportanceThresholds::default();

        for category in [
            ScheduleCategory::Exam,
            ScheduleCategory::Interview,
            ScheduleCategory::Presentation,
        ] {
            // Sweep the urgency window, not just one point.
            for minutes in [1, 30, 60, 12 * 60, 24 * 60] {
                let (schedule, now) = schedule_starting_in(category, minutes);
                assert!(
                    is_important(&schedule, now, &thresholds),
                    "{category} starting in {minutes}m should be important"
                );
            }
        }
    }

    #[test]
    fn high_stakes_outside_urgency_window_is_not_important() {
        let thresholds = ImportanceThresholds::default();
        let (schedule, now) = schedule_starting_in(ScheduleCategory::Exam, 3 * 24 * 60);
        assert!(!is_important(&schedule, now, &thresholds));
    }

    #[test]
    fn low_stakes_within_imminent_window_is_important() {
        let thresholds = ImportanceThresholds::default();
        let (schedule, now) = schedule_starting_in(ScheduleCategory::Meeting, 10);
        assert!(is_important(&schedule, now, &thresholds));
    }

    #[test]
    fn low_stakes_outside_imminent_window_is_not_important() {
        let thresholds = ImportanceThresholds::default();
        let (schedule, now) = schedule_starting_in(ScheduleCategory::Meeting, 60);
        assert!(!is_important(&schedule, now, &thresholds));
    }

    #[test]
    fn critical_flag_always_wins() {
        let thresholds = ImportanceThresholds::default();
        let (schedule, now) = schedule_starting_in(ScheduleCategory::Other, 10 * 24 * 60);
        let schedule = schedule.with_critical(true);
        assert!(is_important(&schedule, now, &thresholds));
    }

    #[test]
    fn started_event_is_not_important() {
        let thresholds = ImportanceThresholds::default();
        let now = Utc::now();
        let schedule = Schedule::new(
            UserId::new(),
            "Exam",
            ScheduleCategory::Exam,
            now - Duration::minutes(5),
        );
        assert!(!is_important(&schedule, now, &thresholds));
    }

    #[test]
    fn interview_in_30_minutes_is_important() {
        let thresholds = ImportanceThresholds::default();
        let (schedule, now) = schedule_starting_in(ScheduleCategory::Interview, 30);
        assert!(is_important(&schedule, now, &thresholds));
    }

    #[test]
    fn classifier_is_deterministic() {
        let thresholds = ImportanceThresholds::default();
        let (schedule, now) = schedule_starting_in(ScheduleCategory::Exam, 45);

        let first = is_important(&schedule, now, &thresholds);
        let second = is_important(&schedule, now, &thresholds);
        assert_eq!(first, second);
    }

    #[test]
    fn threshold_validation() {
        assert!(ImportanceThresholds::default().validate().is_ok());

        let inverted = ImportanceThresholds {
            urgency_minutes: 10,
            imminent_minutes: 60,
        };
        assert!(matches!(
            inverted.validate(),
            Err(InvalidThresholds::ImminentExceedsUrgency { .. })
        ));

        let zero = ImportanceThresholds {
            urgency_minutes: 0,
            imminent_minutes: 0,
        };
        assert!(matches!(
            zero.validate(),
            Err(InvalidThresholds::NonPositiveWindow { .. })
        ));
    }
}
