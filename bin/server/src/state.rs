//! Shared application state.

use crate::db::{
    AccountRepository, DismissalRepository, EscalationStateRepository, PrepArtifactRepository,
    ScheduleRepository,
};
use quiet_sentinel_escalation::EscalationEngine;
use quiet_sentinel_prep::{HttpMemoryRetriever, PrepService};
use quiet_sentinel_runtime::SweepDriver;
use sqlx::PgPool;
use std::sync::Arc;

/// The escalation engine as wired in this server.
pub type Engine = EscalationEngine<EscalationStateRepository>;

/// The prep service as wired in this server.
pub type Prep = PrepService<PrepArtifactRepository, HttpMemoryRetriever>;

/// The sweep driver as wired in this server.
pub type Driver =
    SweepDriver<EscalationStateRepository, PrepArtifactRepository, HttpMemoryRetriever>;

/// State shared across request handlers.
pub struct AppState {
    /// Database connection pool.
    pub db_pool: PgPool,
    /// The escalation engine.
    pub engine: Arc<Engine>,
    /// The prep service.
    pub prep: Arc<Prep>,
    /// Schedule reads.
    pub schedules: Arc<ScheduleRepository>,
    /// Account reads.
    pub accounts: Arc<AccountRepository>,
    /// The dismissal log.
    pub dismissals: Arc<DismissalRepository>,
    /// Prep artifact reads (the service owns its own writer handle).
    pub prep_artifacts: Arc<PrepArtifactRepository>,
    /// The background sweep driver, for manual triggers.
    pub driver: Arc<Driver>,
}
