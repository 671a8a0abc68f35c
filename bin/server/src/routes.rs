//! API routes.
//!
//! Thin glue over the library operations: parse, call, map errors.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use quiet_sentinel_core::{ScheduleId, UserId};
use quiet_sentinel_escalation::{DecisionKind, NotifyAction};
use quiet_sentinel_prep::PrepArtifact;
use quiet_sentinel_runtime::CycleStats;
use quiet_sentinel_schedule::{
    Account, AccountStore, DismissalEvent, DismissalLog, NotificationChannel, Schedule,
    ScheduleStore, SubscriptionTier,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Builds the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/schedules/{id}/dismissals", post(record_dismissal))
        .route("/api/schedules/{id}/decision", get(decision))
        .route("/api/schedules/{id}/prep", post(trigger_prep).get(get_prep))
        .route("/api/sweep", post(run_sweep))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn parse_schedule_id(raw: &str) -> Result<ScheduleId, ApiError> {
    ScheduleId::from_str(raw).map_err(|e| ApiError::InvalidRequest {
        reason: e.to_string(),
    })
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::from_str(raw).map_err(|e| ApiError::InvalidRequest {
        reason: e.to_string(),
    })
}

/// Loads and validates the schedule, or fails the request.
async fn load_schedule(state: &AppState, id: ScheduleId) -> Result<Schedule, ApiError> {
    let record = state
        .schedules
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "schedule".to_string(),
        })?;

    Ok(record.try_into_schedule()?)
}

/// Loads the owner's account, defaulting to the free tier.
async fn load_account(state: &AppState, user_id: UserId) -> Result<Account, ApiError> {
    Ok(state
        .accounts
        .find_by_user(user_id)
        .await?
        .unwrap_or_else(|| Account::new(user_id, SubscriptionTier::Free)))
}

#[derive(Debug, Deserialize)]
struct DismissalBody {
    user_id: String,
    channel: NotificationChannel,
}

#[derive(Debug, Serialize)]
struct EscalationSummary {
    strike_count: u32,
    level: u32,
    suppressed_until: Option<DateTime<Utc>>,
}

/// POST /api/schedules/{id}/dismissals
///
/// Appends a dismissal to the log and folds it into the escalation
/// state.
async fn record_dismissal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<DismissalBody>,
) -> Result<(StatusCode, Json<EscalationSummary>), ApiError> {
    let schedule_id = parse_schedule_id(&id)?;
    let user_id = parse_user_id(&body.user_id)?;

    // Reject dismissals for schedules that do not exist.
    load_schedule(&state, schedule_id).await?;

    let event = DismissalEvent::new(schedule_id, user_id, body.channel, Utc::now());
    state.dismissals.append(event.clone()).await?;
    let escalation = state.engine.record_dismissal(&event).await?;

    Ok((
        StatusCode::CREATED,
        Json(EscalationSummary {
            strike_count: escalation.strike_count,
            level: escalation.level,
            suppressed_until: escalation.suppressed_until,
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct DecisionParams {
    user_id: String,
}

#[derive(Debug, Serialize)]
struct DecisionResponse {
    action: DecisionKind,
    until: Option<DateTime<Utc>>,
    strike_count: u32,
    level: u32,
}

/// GET /api/schedules/{id}/decision?user_id=
///
/// Runs `decide` for the pair. Like the sweep, this persists the
/// decision intent; it is not a dry run.
async fn decision(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DecisionParams>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let schedule_id = parse_schedule_id(&id)?;
    let user_id = parse_user_id(&params.user_id)?;
    let schedule = load_schedule(&state, schedule_id).await?;

    let decision = state.engine.decide(&schedule, user_id, Utc::now()).await?;

    let until = match decision.action {
        NotifyAction::Send => None,
        NotifyAction::Delay { until } | NotifyAction::Suppress { until } => Some(until),
    };

    Ok(Json(DecisionResponse {
        action: decision.action.kind(),
        until,
        strike_count: decision.state.strike_count,
        level: decision.state.level,
    }))
}

#[derive(Debug, Serialize)]
struct PrepResponse {
    artifact: Option<PrepArtifact>,
}

/// POST /api/schedules/{id}/prep
///
/// Manual prep trigger. Idempotent, and returns `null` outside the
/// window.
async fn trigger_prep(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PrepResponse>, ApiError> {
    let schedule_id = parse_schedule_id(&id)?;
    let schedule = load_schedule(&state, schedule_id).await?;
    let account = load_account(&state, schedule.owner_id).await?;

    let artifact = state
        .prep
        .maybe_generate_prep(&schedule, &account, Utc::now())
        .await?;

    Ok(Json(PrepResponse { artifact }))
}

/// GET /api/schedules/{id}/prep
async fn get_prep(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PrepArtifact>, ApiError> {
    use quiet_sentinel_prep::PrepArtifactStore;

    let schedule_id = parse_schedule_id(&id)?;
    let artifact = state
        .prep_artifacts
        .find_by_schedule(schedule_id)
        .await
        .map_err(|e| ApiError::Unavailable {
            reason: e.to_string(),
        })?
        .ok_or_else(|| ApiError::NotFound {
            resource: "prep artifact".to_string(),
        })?;

    Ok(Json(artifact))
}

/// POST /api/sweep
///
/// Runs one sweep cycle immediately. Skips itself if the periodic
/// sweep is mid-cycle.
async fn run_sweep(State(state): State<Arc<AppState>>) -> Json<CycleStats> {
    Json(state.driver.run_cycle(Utc::now()).await)
}
