//! Schedule categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of event a schedule entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleCategory {
    /// A meeting with other attendees.
    Meeting,
    /// A job or admissions interview.
    Interview,
    /// A presentation or talk given by the user.
    Presentation,
    /// An exam or test.
    Exam,
    /// A restaurant, travel, or venue reservation.
    Reservation,
    /// Anything else.
    Other,
}

impl ScheduleCategory {
    /// Returns true for categories where a missed event is costly.
    ///
    /// High-stakes categories qualify for the urgency rule of the
    /// importance classifier.
    #[must_use]
    pub fn is_high_stakes(&self) -> bool {
        matches!(self, Self::Exam | Self::Interview | Self::Presentation)
    }

    /// Returns the canonical string form, as stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meeting => "meeting",
            Self::Interview => "interview",
            Self::Presentation => "presentation",
            Self::Exam => "exam",
            Self::Reservation => "reservation",
            Self::Other => "other",
        }
    }

    /// All known categories.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::Meeting,
            Self::Interview,
            Self::Presentation,
            Self::Exam,
            Self::Reservation,
            Self::Other,
        ]
    }
}

impl fmt::Display for ScheduleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory {
    /// The unrecognized value.
    pub value: String,
}

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown schedule category '{}'", self.value)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for ScheduleCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meeting" => Ok(Self::Meeting),
            "interview" => Ok(Self::Interview),
            "presentation" => Ok(Self::Presentation),
            "exam" => Ok(Self::Exam),
            "reservation" => Ok(Self::Reservation),
            "other" => Ok(Self::Other),
            _ => Err(UnknownCategory {
                value: s.to_string(),
            }),
        }
    }
}
