//! The pre-event preparation window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The time interval before a schedule's start during which preparatory
/// material may be generated.
///
/// With the defaults, prep for a 15:00 event is generated between 12:00
/// and 13:00: early enough to be useful, late enough that the context
/// (attendees, materials, related notes) is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepWindow {
    /// The window opens this many minutes before start.
    #[serde(default = "default_opens_minutes_before")]
    pub opens_minutes_before: i64,

    /// The window closes this many minutes before start.
    #[serde(default = "default_closes_minutes_before")]
    pub closes_minutes_before: i64,
}

fn default_opens_minutes_before() -> i64 {
    180
}

fn default_closes_minutes_before() -> i64 {
    120
}

impl Default for PrepWindow {
    fn default() -> Self {
        Self {
            opens_minutes_before: default_opens_minutes_before(),
            closes_minutes_before: default_closes_minutes_before(),
        }
    }
}

impl PrepWindow {
    /// Validates the window bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the close bound is negative or the window
    /// opens at or after it closes.
    pub fn validate(&self) -> Result<(), InvalidPrepWindow> {
        if self.closes_minutes_before < 0 {
            return Err(InvalidPrepWindow::NegativeClose {
                closes_minutes_before: self.closes_minutes_before,
            });
        }
        if self.opens_minutes_before <= self.closes_minutes_before {
            return Err(InvalidPrepWindow::OpensAfterClose {
                opens_minutes_before: self.opens_minutes_before,
                closes_minutes_before: self.closes_minutes_before,
            });
        }
        Ok(())
    }

    /// Returns true while `now` falls inside the window for an event
    /// starting at `start_time`. Both bounds are inclusive.
    #[must_use]
    pub fn contains(&self, start_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let lead = start_time - now;
        lead >= Duration::minutes(self.closes_minutes_before)
            && lead <= Duration::minutes(self.opens_minutes_before)
    }
}

/// Invalid prep window configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidPrepWindow {
    /// The close bound is negative.
    NegativeClose { closes_minutes_before: i64 },
    /// The window opens at or after it closes.
    OpensAfterClose {
        opens_minutes_before: i64,
        closes_minutes_before: i64,
    },
}

impl fmt::Display for InvalidPrepWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeClose {
                closes_minutes_before,
            } => {
                write!(f, "prep window close bound is negative ({closes_minutes_before}m)")
            }
            Self::OpensAfterClose {
                opens_minutes_before,
                closes_minutes_before,
            } => write!(
                f,
                "prep window opens ({opens_minutes_before}m) at or after it closes ({closes_minutes_before}m)"
            ),
        }
    }
}

impl std::error::Error for InvalidPrepWindow {}
