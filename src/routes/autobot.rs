//! # Autobot Routes
//!
//! Run control for the sequencer plus the activity log feed.

use axum::{
    Router,
    extract::{Json, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::autobot::activity_log::ActivityLogEntry;
use crate::autobot::executor::SwapExecution;
use crate::autobot::types::{Mode, RunPlan, RunState, SessionStats};
use crate::routes::{ApiResult, api_error};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: RunState,
    pub stats: SessionStats,
    pub wallet: Option<String>,
    pub log_entries: usize,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub run_id: Uuid,
    pub mode: Mode,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    /// First sequence number to return
    #[serde(default)]
    pub since: u64,
}

pub async fn get_status(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    Ok(Json(StatusResponse {
        state: state.sequencer.controller().snapshot(),
        stats: state.executor.stats(),
        wallet: state.executor.wallet_pubkey().map(|pubkey| pubkey.to_string()),
        log_entries: state.log.len(),
    }))
}

/// Start a run in the background; the response returns as soon as it is registered
pub async fn start_run(
    State(state): State<AppState>,
    Json(plan): Json<RunPlan>,
) -> ApiResult<StartResponse> {
    let mode = plan.mode();
    info!("Start requested in {:?} mode", mode);

    let (run_id, _handle) = state.sequencer.start(plan).map_err(api_error)?;

    Ok(Json(StartResponse {
        run_id,
        mode,
        message: format!("Autobot started in {:?} mode", mode),
    }))
}

pub async fn pause_run(State(state): State<AppState>) -> ApiResult<RunState> {
    let snapshot = state.sequencer.controller().pause().map_err(api_error)?;
    state.log.info("⏸️ Autobot paused");
    Ok(Json(snapshot))
}

pub async fn resume_run(State(state): State<AppState>) -> ApiResult<RunState> {
    let snapshot = state.sequencer.controller().resume().map_err(api_error)?;
    state.log.info("▶️ Autobot resumed");
    Ok(Json(snapshot))
}

/// Idempotent; answers 200 with the idle state when nothing is running
pub async fn stop_run(State(state): State<AppState>) -> ApiResult<RunState> {
    let snapshot = state.sequencer.controller().stop();
    if snapshot.stopping {
        state.log.info("Stop requested, finishing current step");
    }
    Ok(Json(snapshot))
}

pub async fn get_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Vec<ActivityLogEntry>> {
    Ok(Json(state.log.since(query.since)))
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/autobot/status", get(get_status))
        .route("/api/v1/autobot/start", post(start_run))
        .route("/api/v1/autobot/pause", post(pause_run))
        .route("/api/v1/autobot/resume", post(resume_run))
        .route("/api/v1/autobot/stop", post(stop_run))
        .route("/api/v1/autobot/log", get(get_log))
}
