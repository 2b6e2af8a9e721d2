//! # Wallet Routes
//!
//! This module handles wallet-related API endpoints including:
//! - Connecting and disconnecting the signing wallet
//! - Live balance lookups through the balance oracle
//! - The balance watcher's latest snapshot

use axum::{
    Router,
    extract::{Json, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::autobot::executor::SwapExecution;
use crate::autobot::types::AutobotError;
use crate::routes::{ApiResult, api_error};
use crate::server::AppState;
use crate::services::balance_watcher::BalanceSnapshot;
use crate::services::wallet::{SubmitMode, capability_from_keypair, load_keypair};

/// Body of a connect request. With no private key the configured wallet is used.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectWalletRequest {
    /// Base58-encoded secret key
    #[serde(default)]
    pub private_key: Option<String>,
    /// `sign_and_send` or `sign_only`
    #[serde(default)]
    pub submit_mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectWalletResponse {
    pub public_key: String,
    pub capability: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub disconnected: bool,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub mint: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub public_key: String,
    pub mint: String,
    pub balance: f64,
}

pub async fn connect_wallet(
    State(state): State<AppState>,
    body: Option<Json<ConnectWalletRequest>>,
) -> ApiResult<ConnectWalletResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let wallet_config = &state.config.wallet;

    let submit_mode = match request.submit_mode.as_deref() {
        Some(mode) => mode
            .parse::<SubmitMode>()
            .map_err(|e| api_error(AutobotError::Configuration(e)))?,
        None => wallet_config.submit_mode,
    };

    let keypair = match request.private_key.as_deref() {
        Some(private_key) => load_keypair(None, Some(private_key)),
        None if wallet_config.is_configured() => load_keypair(
            wallet_config.keypair_path.as_deref(),
            wallet_config.private_key.as_deref(),
        ),
        None => {
            return Err(api_error(AutobotError::Configuration(
                "no private key supplied and no wallet configured".to_string(),
            )));
        }
    }
    .map_err(|e| {
        warn!("Wallet connect failed: {:#}", e);
        api_error(AutobotError::Configuration(format!("{:#}", e)))
    })?;

    let capability = capability_from_keypair(keypair, submit_mode, state.rpc.clone());
    let kind = capability.kind();
    let pubkey = state.executor.connect(capability);
    info!("Wallet {} connected via API", pubkey);

    Ok(Json(ConnectWalletResponse {
        public_key: pubkey.to_string(),
        capability: kind,
    }))
}

pub async fn disconnect_wallet(State(state): State<AppState>) -> ApiResult<DisconnectResponse> {
    Ok(Json(DisconnectResponse {
        disconnected: state.executor.disconnect(),
    }))
}

/// Live balance of one mint for the connected wallet, spendable SOL for the native mint
pub async fn get_wallet_balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> ApiResult<BalanceResponse> {
    let owner = state
        .executor
        .wallet_pubkey()
        .ok_or_else(|| api_error(AutobotError::WalletNotConnected))?;

    let balance = state
        .balances
        .balance(&owner, &query.mint)
        .await
        .map_err(api_error)?;

    Ok(Json(BalanceResponse {
        public_key: owner.to_string(),
        mint: query.mint,
        balance,
    }))
}

pub async fn get_watched_balances(State(state): State<AppState>) -> ApiResult<BalanceSnapshot> {
    Ok(Json(state.watcher.snapshot()))
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/wallet/connect", post(connect_wallet))
        .route("/api/v1/wallet/disconnect", post(disconnect_wallet))
        .route("/api/v1/wallet/balance", get(get_wallet_balance))
        .route("/api/v1/wallet/balances", get(get_watched_balances))
}
