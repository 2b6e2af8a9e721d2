//! Configuration module for environment variables and application settings

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use solana_sdk::pubkey::Pubkey;
use url::Url;

use crate::autobot::executor::ExecutorSettings;
use crate::services::tokens::{SOL_MINT, USDC_MINT};
use crate::services::wallet::SubmitMode;

#[derive(Debug, Clone)]
pub struct Config {
    /// Solana JSON-RPC endpoint
    pub solana_rpc_url: String,

    /// Jupiter API base URL
    pub jupiter_api_url: String,

    /// Token metadata endpoint, queried as `{url}/{mint}`
    pub token_list_url: String,

    pub swap: SwapConfig,

    pub wallet: WalletConfig,

    pub watcher: WatcherConfig,

    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct SwapConfig {
    pub slippage_bps: u16,
    pub platform_fee_bps: u16,
    pub vault: Option<Pubkey>,
    pub balance_cap_pct: u8,
    /// SOL kept back for fees when reporting spendable balance
    pub sol_reserve: f64,
    pub confirm_timeout: Duration,
    pub confirm_poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub keypair_path: Option<String>,
    pub private_key: Option<String>,
    pub submit_mode: SubmitMode,
}

impl WalletConfig {
    pub fn is_configured(&self) -> bool {
        self.keypair_path.is_some() || self.private_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub poll_interval: Duration,
    pub mints: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token required on `/api/v1/*` when set
    pub api_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let solana_rpc_url = validated_url(
            "SOLANA_RPC_URL",
            get("SOLANA_RPC_URL")
                .unwrap_or_else(|| "https://api.mainnet-beta.solana.com".to_string()),
        )?;
        let jupiter_api_url = validated_url(
            "JUPITER_API_URL",
            get("JUPITER_API_URL").unwrap_or_else(|| "https://quote-api.jup.ag/v6".to_string()),
        )?;
        let token_list_url = validated_url(
            "TOKEN_LIST_URL",
            get("TOKEN_LIST_URL").unwrap_or_else(|| "https://tokens.jup.ag/token".to_string()),
        )?;

        let vault = get("VAULT_ADDRESS")
            .map(|v| {
                Pubkey::from_str(&v)
                    .with_context(|| format!("VAULT_ADDRESS {} is not a valid pubkey", v))
            })
            .transpose()?;

        let balance_cap_pct: u8 = parse_or("BALANCE_CAP_PCT", get("BALANCE_CAP_PCT"), 90)?;
        if balance_cap_pct == 0 || balance_cap_pct > 100 {
            return Err(anyhow!(
                "BALANCE_CAP_PCT must be between 1 and 100, got {}",
                balance_cap_pct
            ));
        }

        let submit_mode = match get("WALLET_SUBMIT_MODE") {
            Some(mode) => mode.parse::<SubmitMode>().map_err(|e| anyhow!(e))?,
            None => SubmitMode::SignAndSend,
        };

        let mints = match get("WATCH_MINTS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect(),
            None => vec![SOL_MINT.to_string(), USDC_MINT.to_string()],
        };

        let port = match get("SERVER_PORT").or_else(|| get("PORT")) {
            Some(port) => port
                .parse()
                .with_context(|| format!("SERVER_PORT {} is not a valid port", port))?,
            None => 3000,
        };

        Ok(Self {
            solana_rpc_url,
            jupiter_api_url,
            token_list_url,
            swap: SwapConfig {
                slippage_bps: parse_or("SLIPPAGE_BPS", get("SLIPPAGE_BPS"), 50)?,
                platform_fee_bps: parse_or("PLATFORM_FEE_BPS", get("PLATFORM_FEE_BPS"), 0)?,
                vault,
                balance_cap_pct,
                sol_reserve: parse_or("SOL_RESERVE", get("SOL_RESERVE"), 0.01)?,
                confirm_timeout: Duration::from_secs(parse_or(
                    "CONFIRM_TIMEOUT_SECS",
                    get("CONFIRM_TIMEOUT_SECS"),
                    30,
                )?),
                confirm_poll_interval: Duration::from_millis(parse_or(
                    "CONFIRM_POLL_MS",
                    get("CONFIRM_POLL_MS"),
                    500,
                )?),
            },
            wallet: WalletConfig {
                keypair_path: get("WALLET_KEYPAIR_PATH"),
                private_key: get("WALLET_PRIVATE_KEY"),
                submit_mode,
            },
            watcher: WatcherConfig {
                poll_interval: Duration::from_secs(
                    parse_or(
                        "BALANCE_POLL_INTERVAL_SECS",
                        get("BALANCE_POLL_INTERVAL_SECS"),
                        15u64,
                    )?
                    .max(1),
                ),
                mints,
            },
            server: ServerConfig {
                host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                api_token: get("CONTROL_API_TOKEN"),
            },
        })
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            slippage_bps: self.swap.slippage_bps,
            platform_fee_bps: self.swap.platform_fee_bps,
            vault: self.swap.vault,
            balance_cap_pct: self.swap.balance_cap_pct,
            confirm_timeout: self.swap.confirm_timeout,
            confirm_poll_interval: self.swap.confirm_poll_interval,
        }
    }
}

fn validated_url(key: &str, value: String) -> Result<String> {
    let url = Url::parse(&value).with_context(|| format!("{} is not a valid URL: {}", key, value))?;
    match url.scheme() {
        "http" | "https" => Ok(value.trim_end_matches('/').to_string()),
        other => Err(anyhow!("{} must use http or https, got {}", key, other)),
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{} has invalid value {}: {}", key, raw, e)),
        None => Ok(default),
    }
}
