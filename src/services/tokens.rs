//! Token metadata: mint decimals and UI-to-raw amount conversion.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use reqwest::Client;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tracing::debug;

use crate::autobot::types::AutobotError;

pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";
pub const BONK_MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
pub const JUP_MINT: &str = "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN";

/// Used when a mint is unknown and the token list lookup fails
pub const DEFAULT_DECIMALS: u8 = 6;

static KNOWN_DECIMALS: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    HashMap::from([
        (SOL_MINT, 9),
        (USDC_MINT, 6),
        (USDT_MINT, 6),
        (BONK_MINT, 5),
        (JUP_MINT, 6),
    ])
});

#[derive(Debug, Deserialize)]
struct TokenListEntry {
    decimals: u8,
}

/// Resolves mint decimals from the static table, then the remote token list
#[derive(Debug)]
pub struct TokenRegistry {
    client: Client,
    token_list_url: String,
    cache: DashMap<String, u8>,
}

impl TokenRegistry {
    pub fn new(token_list_url: impl Into<String>) -> Result<Self, AutobotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            token_list_url: token_list_url.into().trim_end_matches('/').to_string(),
            cache: DashMap::new(),
        })
    }

    /// Decimals for `mint`. Never fails; unknown mints fall back to 6.
    pub async fn decimals(&self, mint: &str) -> u8 {
        if let Some(decimals) = KNOWN_DECIMALS.get(mint) {
            return *decimals;
        }
        if let Some(decimals) = self.cache.get(mint) {
            return *decimals;
        }

        match self.fetch_decimals(mint).await {
            Ok(decimals) => {
                self.cache.insert(mint.to_string(), decimals);
                decimals
            }
            Err(e) => {
                debug!(
                    "Token list lookup failed for {}: {}, using {} decimals",
                    mint, e, DEFAULT_DECIMALS
                );
                DEFAULT_DECIMALS
            }
        }
    }

    async fn fetch_decimals(&self, mint: &str) -> Result<u8, AutobotError> {
        let url = format!("{}/{}", self.token_list_url, mint);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AutobotError::Aggregator(format!(
                "token list HTTP {} for {}",
                response.status(),
                mint
            )));
        }

        let entry: TokenListEntry = response.json().await?;
        Ok(entry.decimals)
    }
}

/// Parse a human-readable amount. Rejects anything that is not a positive number.
pub fn parse_ui_amount(amount: &str) -> Result<Decimal, AutobotError> {
    let trimmed = amount.trim();
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| AutobotError::InvalidAmount(format!("'{}' is not a number", amount)))?;

    if value <= Decimal::ZERO {
        return Err(AutobotError::InvalidAmount(format!(
            "'{}' must be greater than zero",
            amount
        )));
    }
    Ok(value)
}

/// Convert a UI amount into raw integer units, truncating extra precision
pub fn to_raw_amount(amount: Decimal, decimals: u8) -> Result<u64, AutobotError> {
    let scale = 10u64
        .checked_pow(decimals as u32)
        .map(Decimal::from)
        .ok_or_else(|| AutobotError::InvalidAmount(format!("unsupported decimals {}", decimals)))?;
    amount
        .checked_mul(scale)
        .and_then(|raw| raw.trunc().to_u64())
        .ok_or_else(|| {
            AutobotError::InvalidAmount(format!(
                "{} does not fit in raw units with {} decimals",
                amount, decimals
            ))
        })
}

/// Format a float amount for a swap request, truncated to `decimals` places
pub fn format_ui_amount(amount: f64, decimals: u8) -> String {
    match Decimal::from_f64(amount) {
        Some(value) => value
            .round_dp_with_strategy(decimals as u32, RoundingStrategy::ToZero)
            .normalize()
            .to_string(),
        None => amount.to_string(),
    }
}
