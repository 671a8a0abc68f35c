//! Storage seam for prep artifacts.

use crate::artifact::PrepArtifact;
use crate::error::PrepStoreError;
use async_trait::async_trait;
use quiet_sentinel_core::ScheduleId;

/// Trait for prep artifact storage.
///
/// Artifacts are keyed uniquely by schedule; the insert is conditional
/// so two concurrent generators cannot both win.
#[async_trait]
pub trait PrepArtifactStore: Send + Sync {
    /// Finds the artifact for a schedule, if one exists.
    async fn find_by_schedule(
        &self,
        schedule_id: ScheduleId,
    ) -> Result<Option<PrepArtifact>, PrepStoreError>;

    /// Inserts an artifact unless one already exists for the schedule.
    ///
    /// Returns the stored artifact: the given one if this writer won the
    /// race, or the existing artifact if another writer got there first.
    /// The loser's artifact is discarded, never duplicated.
    async fn insert_if_absent(
        &self,
        artifact: PrepArtifact,
    ) -> Result<PrepArtifact, PrepStoreError>;
}
