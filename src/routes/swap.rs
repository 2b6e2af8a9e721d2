//! # Swap Routes
//!
//! One-off swaps outside any run. A request over the balance cap comes back
//! as 409; resending it with `"confirmed": true` goes through. Manual swaps
//! are refused while a run is active, since the run measures balance deltas
//! between its own swaps.

use axum::{
    Router,
    extract::{Json, State},
    routing::post,
};
use tracing::info;

use crate::autobot::executor::SwapExecution;
use crate::autobot::format::short;
use crate::autobot::types::{AutobotError, SwapOutcome, SwapRequest};
use crate::routes::{ApiResult, api_error};
use crate::server::AppState;

pub async fn execute_swap(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> ApiResult<SwapOutcome> {
    if state.sequencer.controller().snapshot().running {
        return Err(api_error(AutobotError::AlreadyRunning));
    }

    info!(
        "Manual swap requested: {} {} -> {}",
        request.amount,
        short(&request.input_mint, 4),
        short(&request.output_mint, 4)
    );

    let outcome = state.executor.execute(request).await.map_err(api_error)?;
    Ok(Json(outcome))
}

pub fn create_routes() -> Router<AppState> {
    Router::new().route("/api/v1/swap", post(execute_swap))
}
