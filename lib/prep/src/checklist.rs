//! Checklist templates per schedule category.
//!
//! Templates are configuration: deployments override individual lists
//! without touching code. The catalog always answers; categories without
//! a tailored template fall back to the generic list.

use quiet_sentinel_schedule::ScheduleCategory;
use serde::{Deserialize, Serialize};

/// An ordered checklist template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    /// Checklist items, in presentation order.
    pub items: Vec<String>,
}

impl ChecklistTemplate {
    /// Creates a template from item strings.
    #[must_use]
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

/// The full per-category checklist catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistCatalog {
    /// Checklist for meetings.
    #[serde(default = "default_meeting")]
    pub meeting: ChecklistTemplate,
    /// Checklist for interviews.
    #[serde(default = "default_interview")]
    pub interview: ChecklistTemplate,
    /// Checklist for presentations.
    #[serde(default = "default_presentation")]
    pub presentation: ChecklistTemplate,
    /// Checklist for exams.
    #[serde(default = "default_exam")]
    pub exam: ChecklistTemplate,
    /// Checklist for reservations.
    #[serde(default = "default_reservation")]
    pub reservation: ChecklistTemplate,
    /// Fallback checklist for everything else.
    #[serde(default = "default_generic")]
    pub generic: ChecklistTemplate,
}

fn default_meeting() -> ChecklistTemplate {
    ChecklistTemplate::new([
        "Review the agenda",
        "Scan the attendee list and recent threads",
        "Collect open action items",
        "Prepare talking points",
    ])
}

fn default_interview() -> ChecklistTemplate {
    ChecklistTemplate::new([
        "Research the company and interviewers",
        "Re-read the role description",
        "Prepare answers for likely questions",
        "Plan the route with an arrival buffer",
        "Lay out documents and portfolio",
    ])
}

fn default_presentation() -> ChecklistTemplate {
    ChecklistTemplate::new([
        "Final pass over the slides",
        "Check the screen-share or projector setup",
        "Rehearse the opening",
        "Export a backup copy of the materials",
    ])
}

fn default_exam() -> ChecklistTemplate {
    ChecklistTemplate::new([
        "Review summary notes",
        "Pack required materials and ID",
        "Confirm the room and seat",
        "Plan travel with slack time",
    ])
}

fn default_reservation() -> ChecklistTemplate {
    ChecklistTemplate::new([
        "Confirm the booking",
        "Double-check party size and time",
        "Save the venue contact",
        "Plan travel time",
    ])
}

fn default_generic() -> ChecklistTemplate {
    ChecklistTemplate::new([
        "Review the event details",
        "Check the location and time",
        "Set aside anything you need to bring",
    ])
}

impl Default for ChecklistCatalog {
    fn default() -> Self {
        Self {
            meeting: default_meeting(),
            interview: default_interview(),
            presentation: default_presentation(),
            exam: default_exam(),
            reservation: default_reservation(),
            generic: default_generic(),
        }
    }
}

impl ChecklistCatalog {
    /// Returns the template for a category, falling back to the generic
    /// checklist.
    #[must_use]
    pub fn template_for(&self, category: ScheduleCategory) -> &ChecklistTemplate {
        match category {
            ScheduleCategory::Meeting => &self.meeting,
            ScheduleCategory::Interview => &self.interview,
            ScheduleCategory::Presentation => &self.presentation,
            ScheduleCategory::Exam => &self.exam,
            ScheduleCategory::Reservation => &self.reservation,
            ScheduleCategory::Other => &self.generic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_nonempty_template() {
        let catalog = ChecklistCatalog::default();
        for category in ScheduleCategory::all() {
            assert!(
                !catalog.template_for(*category).items.is_empty(),
                "empty checklist for {category}"
            );
        }
    }

    #[test]
    fn other_falls_back_to_generic() {
        let catalog = ChecklistCatalog::default();
        assert_eq!(
            catalog.template_for(ScheduleCategory::Other),
            &catalog.generic
        );
    }

    #[test]
    fn interview_template_covers_logistics() {
        let catalog = ChecklistCatalog::default();
        let items = &catalog.template_for(ScheduleCategory::Interview).items;
        assert!(items.iter().any(|item| item.contains("route")));
    }

    #[test]
    fn catalog_serde_roundtrip() {
        let catalog = ChecklistCatalog::default();
        let json = serde_json::to_string(&catalog).expect("serialize");
        let parsed: ChecklistCatalog = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(catalog, parsed);
    }

    #[test]
    fn catalog_deserializes_partial_overrides() {
        let json = r#"{"meeting": {"items": ["Only item"]}}"#;
        let catalog: ChecklistCatalog = serde_json::from_str(json).expect("deserialize");

        assert_eq!(catalog.meeting.items, vec!["Only item".to_string()]);
        assert!(!catalog.exam.items.is_empty());
    }
}
