//! # Pond Autobot
//!
//! Swap automation for Solana through the Jupiter aggregator, driven over a
//! small HTTP control API.
//!
//! ## Features
//! - Single swaps with balance-cap confirmation and transaction validation
//! - Boost mode: randomized forward swaps with a return swap per round
//! - Rewards mode: fixed forward swap, then return the full balance
//! - Pause, resume and stop between any two swaps
//! - Background balance polling for the connected wallet
//!
//! ## Architecture
//! - `autobot`: executor, sequencer, run controller, activity log
//! - `services`: Jupiter, RPC, balances, token metadata, wallets
//! - `routes`: HTTP handlers, merged in `server`
//! - `config`: environment configuration
//!
//! ## Running the Server
//! ```bash
//! cp .env.example .env
//! cargo run
//! curl http://localhost:3000/ping
//! ```

mod auth;
mod autobot;
mod config;
mod routes;
mod server;
mod services;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::server::AppState;
use crate::services::wallet::{capability_from_keypair, load_keypair};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();

    tracing::info!("🏁 Starting Pond Autobot...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let profile = if cfg!(debug_assertions) { "debug" } else { "release" };
    tracing::info!("🏗️  Build profile: {}", profile);

    let config = Config::from_env().context("Failed to load configuration from environment")?;
    tracing::info!("🌐 RPC: {}", config.solana_rpc_url);
    tracing::info!("🪐 Jupiter: {}", config.jupiter_api_url);

    let state = AppState::from_config(config)?;

    if state.config.wallet.is_configured() {
        let keypair = load_keypair(
            state.config.wallet.keypair_path.as_deref(),
            state.config.wallet.private_key.as_deref(),
        )?;
        let capability =
            capability_from_keypair(keypair, state.config.wallet.submit_mode, state.rpc.clone());
        state.executor.connect(capability);
    } else {
        tracing::info!("No wallet configured; connect one via POST /api/v1/wallet/connect");
    }

    let shutdown = CancellationToken::new();
    let watcher_task = state.watcher.clone().spawn(shutdown.clone());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("🛑 Shutdown signal received");
        }
        signal_token.cancel();
    });

    let served = server::start(state, shutdown.clone()).await;
    shutdown.cancel();
    if let Err(e) = watcher_task.await {
        tracing::warn!("Balance watcher task ended abnormally: {}", e);
    }
    served
}
