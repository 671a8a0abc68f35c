//! Error types for the prep crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `PrepStoreError`: Errors from artifact storage
//! - `MemoryRetrievalError`: Errors from the memory-retrieval collaborator
//! - `PrepError`: Errors from the prep service

use std::fmt;

/// Errors from prep artifact storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepStoreError {
    /// The store could not be reached.
    Unavailable { reason: String },
    /// A query failed.
    QueryFailed { reason: String },
}

impl fmt::Display for PrepStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "prep artifact store unavailable: {reason}")
            }
            Self::QueryFailed { reason } => {
                write!(f, "prep artifact query failed: {reason}")
            }
        }
    }
}

impl std::error::Error for PrepStoreError {}

/// Errors from the memory-retrieval collaborator.
///
/// These are recovered locally by the prep service: artifact generation
/// proceeds without enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryRetrievalError {
    /// The service could not be reached.
    Unavailable { reason: String },
    /// The query failed or returned an unreadable response.
    QueryFailed { reason: String },
}

impl fmt::Display for MemoryRetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "memory service unavailable: {reason}")
            }
            Self::QueryFailed { reason } => {
                write!(f, "memory query failed: {reason}")
            }
        }
    }
}

impl std::error::Error for MemoryRetrievalError {}

/// Errors from the prep service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepError {
    /// Artifact storage failed.
    Store(PrepStoreError),
}

impl fmt::Display for PrepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "prep store error: {e}"),
        }
    }
}

impl std::error::Error for PrepError {}

impl From<PrepStoreError> for PrepError {
    fn from(e: PrepStoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prep_store_error_display() {
        let err = PrepStoreError::Unavailable {
            reason: "pool exhausted".to_string(),
        };
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn memory_error_display() {
        let err = MemoryRetrievalError::QueryFailed {
            reason: "500".to_string(),
        };
        assert!(err.to_string().contains("memory query failed"));
    }

    #[test]
    fn prep_error_wraps_store_error() {
        let err: PrepError = PrepStoreError::QueryFailed {
            reason: "syntax".to_string(),
        }
        .into();
        assert!(err.to_string().contains("prep store error"));
    }
}
