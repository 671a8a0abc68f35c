//! Schedule preparation for quiet-sentinel.
//!
//! This crate provides:
//!
//! - **Prep window**: When preparatory material may be generated
//! - **Checklist catalog**: Per-category templates with a generic fallback
//! - **Prep artifacts**: Immutable, generated once per schedule
//! - **Memory retrieval**: Tier-gated enrichment from the memory service
//! - **Prep service**: The idempotent `maybe_generate_prep` operation

pub mod artifact;
pub mod checklist;
pub mod error;
pub mod memory;
pub mod service;
pub mod store;
pub mod window;

pub use artifact::PrepArtifact;
pub use checklist::{ChecklistCatalog, ChecklistTemplate};
pub use error::{MemoryRetrievalError, PrepError, PrepStoreError};
pub use memory::{HttpMemoryRetriever, MemoryQuery, MemoryRetriever};
pub use service::PrepService;
pub use store::PrepArtifactStore;
pub use window::PrepWindow;
