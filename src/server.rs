//! # Server Module
//!
//! Wires the autobot components together and serves the control API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::get,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::middleware::{ApiToken, AuthMiddleware};
use crate::autobot::activity_log::ActivityLog;
use crate::autobot::executor::SwapExecutor;
use crate::autobot::run_state::RunController;
use crate::autobot::sequencer::Sequencer;
use crate::autobot::types::RunState;
use crate::config::Config;
use crate::routes;
use crate::routes::health::ping;
use crate::services::balance::{BalanceOracle, BalanceSource};
use crate::services::balance_watcher::BalanceWatcher;
use crate::services::chain::RpcChainClient;
use crate::services::jupiter::JupiterClient;
use crate::services::tokens::TokenRegistry;

/// Longest wait for an in-flight swap after shutdown; covers one confirmation timeout
const RUN_DRAIN_TIMEOUT: Duration = Duration::from_secs(35);

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rpc: Arc<RpcClient>,
    pub executor: Arc<SwapExecutor>,
    pub sequencer: Arc<Sequencer>,
    pub balances: Arc<dyn BalanceSource>,
    pub watcher: Arc<BalanceWatcher>,
    pub log: Arc<ActivityLog>,
}

impl AppState {
    /// Build every component from configuration; no network calls are made here
    pub fn from_config(config: Config) -> Result<Self> {
        let rpc = Arc::new(RpcClient::new_with_commitment(
            config.solana_rpc_url.clone(),
            CommitmentConfig::confirmed(),
        ));
        let log = Arc::new(ActivityLog::new());

        let aggregator = Arc::new(
            JupiterClient::new(config.jupiter_api_url.clone())
                .context("Failed to build Jupiter client")?,
        );
        let tokens = Arc::new(
            TokenRegistry::new(config.token_list_url.clone())
                .context("Failed to build token registry")?,
        );
        let balances: Arc<dyn BalanceSource> =
            Arc::new(BalanceOracle::new(rpc.clone(), config.swap.sol_reserve));
        let chain = Arc::new(RpcChainClient::new(rpc.clone()));

        let executor = Arc::new(SwapExecutor::new(
            aggregator,
            chain,
            balances.clone(),
            tokens,
            config.executor_settings(),
            log.clone(),
        ));

        Ok(Self::assemble(config, rpc, executor, balances, log))
    }

    /// Build the state around an already constructed executor
    pub fn assemble(
        config: Config,
        rpc: Arc<RpcClient>,
        executor: Arc<SwapExecutor>,
        balances: Arc<dyn BalanceSource>,
        log: Arc<ActivityLog>,
    ) -> Self {
        let sequencer = Arc::new(Sequencer::new(
            executor.clone(),
            balances.clone(),
            Arc::new(RunController::new()),
            log.clone(),
        ));
        let watcher = Arc::new(BalanceWatcher::new(
            balances.clone(),
            executor.clone(),
            config.watcher.mints.clone(),
            config.watcher.poll_interval,
        ));

        Self {
            config: Arc::new(config),
            rpc,
            executor,
            sequencer,
            balances,
            watcher,
            log,
        }
    }
}

/// Full router: public health check plus the guarded control API
pub fn router(state: AppState) -> Router {
    let token = Arc::new(ApiToken(state.config.server.api_token.clone()));

    let api = Router::new()
        .merge(routes::autobot::create_routes())
        .merge(routes::swap::create_routes())
        .merge(routes::wallet::create_routes())
        .layer(middleware::from_fn_with_state(token, AuthMiddleware::validate_token));

    Router::new()
        .route("/ping", get(ping))
        .merge(api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::ORIGIN,
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::AUTHORIZATION,
                ]),
        )
        .with_state(state)
}

/// Serve until `shutdown` is cancelled, then stop any active run and wait for it
pub async fn start(state: AppState, shutdown: CancellationToken) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} - port may already be in use", addr))?;

    tracing::info!("🚀 Autobot control API starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("🤖 Autobot endpoints available at http://{}/api/v1/autobot/*", addr);
    if state.config.server.api_token.is_none() {
        tracing::warn!("🔓 CONTROL_API_TOKEN not set, control API is unauthenticated");
    }

    let controller = state.sequencer.controller().clone();
    let app = router(state);

    let stopper = controller.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            stopper.stop();
        })
        .await
        .context("HTTP server error")?;

    let mut state_rx = controller.subscribe();
    if tokio::time::timeout(RUN_DRAIN_TIMEOUT, state_rx.wait_for(RunState::is_idle))
        .await
        .is_err()
    {
        tracing::warn!("Active run did not finish within {:?}", RUN_DRAIN_TIMEOUT);
    }

    Ok(())
}
