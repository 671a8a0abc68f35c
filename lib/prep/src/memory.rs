//! Memory-retrieval collaborator.
//!
//! The assistant's memory service indexes past notes and conversations.
//! Prep enrichment asks it for notes related to an upcoming event by
//! (user, category, time range). The service is optional and tier-gated;
//! failures here never block base checklist generation.

use crate::error::MemoryRetrievalError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiet_sentinel_core::{MemoryNoteId, UserId};
use quiet_sentinel_schedule::ScheduleCategory;
use serde::Deserialize;

/// A query against the memory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryQuery {
    /// The user whose notes to search.
    pub user_id: UserId,
    /// The category of the upcoming event.
    pub category: ScheduleCategory,
    /// Start of the time range to search.
    pub since: DateTime<Utc>,
    /// End of the time range to search.
    pub until: DateTime<Utc>,
}

/// Trait for the memory-retrieval service.
#[async_trait]
pub trait MemoryRetriever: Send + Sync {
    /// Returns identifiers of notes related to the query.
    async fn related_notes(
        &self,
        query: &MemoryQuery,
    ) -> Result<Vec<MemoryNoteId>, MemoryRetrievalError>;
}

/// HTTP client for the memory service.
pub struct HttpMemoryRetriever {
    client: reqwest::Client,
    base_url: String,
}

/// Response body of the notes endpoint.
#[derive(Debug, Deserialize)]
struct NotesResponse {
    notes: Vec<NoteRef>,
}

#[derive(Debug, Deserialize)]
struct NoteRef {
    id: MemoryNoteId,
}

impl HttpMemoryRetriever {
    /// Creates a retriever for the memory service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, MemoryRetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MemoryRetrievalError::Unavailable {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MemoryRetriever for HttpMemoryRetriever {
    async fn related_notes(
        &self,
        query: &MemoryQuery,
    ) -> Result<Vec<MemoryNoteId>, MemoryRetrievalError> {
        let url = format!("{}/v1/notes", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("user_id", query.user_id.to_string()),
                ("category", query.category.to_string()),
                ("since", query.since.to_rfc3339()),
                ("until", query.until.to_rfc3339()),
            ])
            .send()
            .await
            .map_err(|e| MemoryRetrievalError::Unavailable {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(MemoryRetrievalError::QueryFailed {
                reason: format!("memory service returned {}", response.status()),
            });
        }

        let body: NotesResponse =
            response
                .json()
                .await
                .map_err(|e| MemoryRetrievalError::QueryFailed {
                    reason: format!("unreadable response: {e}"),
                })?;

        Ok(body.notes.into_iter().map(|note| note.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn retriever_construction() {
        let retriever =
            HttpMemoryRetriever::new("http://localhost:8100", std::time::Duration::from_secs(2));
        assert!(retriever.is_ok());
    }

    #[test]
    fn notes_response_parses() {
        let note_id = MemoryNoteId::new();
        let json = format!(r#"{{"notes": [{{"id": "{}"}}]}}"#, note_id.as_ulid());
        let parsed: NotesResponse = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.notes.len(), 1);
        assert_eq!(parsed.notes[0].id, note_id);
    }

    #[test]
    fn query_carries_range() {
        let now = Utc::now();
        let query = MemoryQuery {
            user_id: UserId::new(),
            category: ScheduleCategory::Meeting,
            since: now - Duration::days(90),
            until: now,
        };
        assert!(query.since < query.until);
    }
}
