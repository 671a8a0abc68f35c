//! Preparation artifacts.

use chrono::{DateTime, Utc};
use quiet_sentinel_core::{MemoryNoteId, PrepArtifactId, ScheduleId};
use serde::{Deserialize, Serialize};

/// Preparatory material generated for one schedule.
///
/// Artifacts are immutable after creation: regeneration inside the prep
/// window returns the stored artifact rather than a fresh one, so the
/// checklist a user saw never silently changes underneath them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepArtifact {
    /// Unique identifier.
    pub id: PrepArtifactId,
    /// The schedule this artifact prepares for.
    pub schedule_id: ScheduleId,
    /// When the artifact was generated.
    pub generated_at: DateTime<Utc>,
    /// Ordered checklist items.
    pub checklist_items: Vec<String>,
    /// Related memory notes, when tier-gated enrichment ran.
    pub memory_note_ids: Vec<MemoryNoteId>,
}

impl PrepArtifact {
    /// Creates a new artifact.
    #[must_use]
    pub fn new(
        schedule_id: ScheduleId,
        checklist_items: Vec<String>,
        memory_note_ids: Vec<MemoryNoteId>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PrepArtifactId::new(),
            schedule_id,
            generated_at,
            checklist_items,
            memory_note_ids,
        }
    }

    /// Returns true if enrichment attached any notes.
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        !self.memory_note_ids.is_empty()
    }
}
