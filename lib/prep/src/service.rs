//! The prep service.
//!
//! One public operation: [`PrepService::maybe_generate_prep`]. It fires
//! only inside the configured window, is idempotent per schedule, and
//! degrades gracefully when the memory service is down.

use crate::artifact::PrepArtifact;
use crate::checklist::ChecklistCatalog;
use crate::error::PrepError;
use crate::memory::{MemoryQuery, MemoryRetriever};
use crate::store::PrepArtifactStore;
use crate::window::PrepWindow;
use chrono::{DateTime, Duration, Utc};
use quiet_sentinel_schedule::{Account, Schedule};

/// How far back enrichment searches for related notes.
const MEMORY_LOOKBACK_DAYS: i64 = 90;

/// Generates prep artifacts for upcoming schedules.
pub struct PrepService<S, M> {
    store: S,
    retriever: Option<M>,
    catalog: ChecklistCatalog,
    window: PrepWindow,
}

impl<S, M> PrepService<S, M>
where
    S: PrepArtifactStore,
    M: MemoryRetriever,
{
    /// Creates a prep service without memory enrichment.
    pub fn new(store: S, catalog: ChecklistCatalog, window: PrepWindow) -> Self {
        Self {
            store,
            retriever: None,
            catalog,
            window,
        }
    }

    /// Attaches the memory-retrieval collaborator.
    #[must_use]
    pub fn with_retriever(mut self, retriever: M) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Returns the configured window.
    #[must_use]
    pub fn window(&self) -> &PrepWindow {
        &self.window
    }

    /// Generates the prep artifact for a schedule if the window is open.
    ///
    /// Returns `None` outside the window. Inside the window the call is
    /// idempotent: an existing artifact is returned unchanged, and a
    /// concurrent generation race resolves to the first writer's
    /// artifact via the store's conditional insert.
    ///
    /// Enrichment runs only for accounts with the memory capability and
    /// never blocks generation: on retrieval failure the artifact is
    /// produced with an empty enrichment field and the degradation is
    /// logged.
    ///
    /// # Errors
    ///
    /// Fails only on artifact storage errors.
    pub async fn maybe_generate_prep(
        &self,
        schedule: &Schedule,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<Option<PrepArtifact>, PrepError> {
        if !self.window.contains(schedule.start_time, now) {
            return Ok(None);
        }

        if let Some(existing) = self.store.find_by_schedule(schedule.id).await? {
            return Ok(Some(existing));
        }

        let template = self.catalog.template_for(schedule.category);
        let memory_note_ids = self.enrich(schedule, account, now).await;

        let artifact = PrepArtifact::new(
            schedule.id,
            template.items.clone(),
            memory_note_ids,
            now,
        );
        let stored = self.store.insert_if_absent(artifact).await?;

        tracing::info!(
            schedule_id = %schedule.id,
            artifact_id = %stored.id,
            items = stored.checklist_items.len(),
            enriched = stored.is_enriched(),
            "prep artifact ready"
        );

        Ok(Some(stored))
    }

    /// Queries the memory service for related notes, if allowed and able.
    async fn enrich(
        &self,
        schedule: &Schedule,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Vec<quiet_sentinel_core::MemoryNoteId> {
        if !account.capabilities.memory_enrichment {
            return Vec::new();
        }

        let Some(retriever) = &self.retriever else {
            tracing::debug!(
                schedule_id = %schedule.id,
                "no memory retriever configured, skipping enrichment"
            );
            return Vec::new();
        };

        let query = MemoryQuery {
            user_id: account.user_id,
            category: schedule.category,
            since: now - Duration::days(MEMORY_LOOKBACK_DAYS),
            until: now,
        };

        match retriever.related_notes(&query).await {
            Ok(notes) => notes,
            Err(e) => {
                tracing::warn!(
                    schedule_id = %schedule.id,
                    error = %e,
                    "memory enrichment degraded, generating without notes"
                );
                Vec::new()
            }
        }
    }
}
