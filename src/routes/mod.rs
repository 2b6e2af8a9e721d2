// # Routes Module
//
// - HTTP route handlers for the autobot control API, one submodule per area.
// - Each submodule exposes `create_routes()`; `server.rs` merges them.

use axum::{Json, http::StatusCode};
use serde::Serialize;

use crate::autobot::types::AutobotError;

/// Health check endpoint
pub mod health;

/// Run control and activity log
pub mod autobot;

/// One-off swaps
pub mod swap;

/// Wallet connection and balances
pub mod wallet;

/// Error body returned by every handler
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn api_error(err: AutobotError) -> ApiError {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::debug!("Request rejected: {}", err);
    }
    (status, Json(ErrorResponse { error: err.to_string() }))
}
