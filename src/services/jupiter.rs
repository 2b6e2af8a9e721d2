//! Jupiter Aggregator Client
//!
//! Wraps the two Jupiter v6 endpoints the swap executor needs: `/quote` to
//! price a swap and `/swap` to build a signable versioned transaction. The
//! full quote JSON is kept alongside the parsed fields because `/swap` wants
//! it echoed back verbatim.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::autobot::types::AutobotError;

/// Parameters for a quote request; `amount` is in raw units of the input mint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteParams {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
    pub slippage_bps: u16,
    pub platform_fee_bps: u16,
}

/// Parsed quote plus the raw response body
#[derive(Debug, Clone)]
pub struct QuoteResponse {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    pub other_amount_threshold: u64,
    pub price_impact_pct: f64,
    pub route_labels: Vec<String>,
    pub raw: Value,
}

impl QuoteResponse {
    /// Parse a Jupiter `/quote` body
    pub fn from_json(json: Value) -> Result<Self, AutobotError> {
        let parse_amount = |field: &str| -> Result<u64, AutobotError> {
            json[field]
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| AutobotError::Aggregator(format!("quote missing {}", field)))
        };

        let in_amount = parse_amount("inAmount")?;
        let out_amount = parse_amount("outAmount")?;
        let other_amount_threshold = json["otherAmountThreshold"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let route_labels = json["routePlan"]
            .as_array()
            .map(|routes| {
                routes
                    .iter()
                    .filter_map(|route| route["swapInfo"]["label"].as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            input_mint: json["inputMint"].as_str().unwrap_or_default().to_string(),
            output_mint: json["outputMint"].as_str().unwrap_or_default().to_string(),
            in_amount,
            out_amount,
            other_amount_threshold,
            price_impact_pct: json["priceImpactPct"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0),
            route_labels,
            raw: json,
        })
    }
}

/// Body of a `/swap` request
#[derive(Debug, Clone, Serialize)]
pub struct SwapBuildRequest {
    #[serde(rename = "quoteResponse")]
    pub quote_response: Value,
    #[serde(rename = "userPublicKey")]
    pub user_public_key: String,
    #[serde(rename = "wrapAndUnwrapSol")]
    pub wrap_and_unwrap_sol: bool,
    #[serde(rename = "dynamicComputeUnitLimit")]
    pub dynamic_compute_unit_limit: bool,
    #[serde(rename = "prioritizationFeeLamports")]
    pub prioritization_fee_lamports: String,
    #[serde(rename = "feeAccount", skip_serializing_if = "Option::is_none")]
    pub fee_account: Option<String>,
}

impl SwapBuildRequest {
    pub fn new(quote: &QuoteResponse, user: &Pubkey, fee_account: Option<&Pubkey>) -> Self {
        Self {
            quote_response: quote.raw.clone(),
            user_public_key: user.to_string(),
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: "auto".to_string(),
            fee_account: fee_account.map(|pk| pk.to_string()),
        }
    }
}

/// Jupiter `/swap` response
#[derive(Debug, Clone, Deserialize)]
pub struct SwapTransaction {
    /// Base64-encoded versioned transaction
    #[serde(rename = "swapTransaction")]
    pub swap_transaction: String,
    #[serde(rename = "lastValidBlockHeight")]
    pub last_valid_block_height: Option<u64>,
}

/// Source of quotes and signable swap transactions
#[async_trait]
pub trait Aggregator: Send + Sync {
    async fn quote(&self, params: &QuoteParams) -> Result<QuoteResponse, AutobotError>;

    async fn build_swap(
        &self,
        quote: &QuoteResponse,
        user: &Pubkey,
        fee_account: Option<&Pubkey>,
    ) -> Result<SwapTransaction, AutobotError>;
}

#[derive(Debug, Clone)]
pub struct JupiterClient {
    client: Client,
    base_url: String,
}

impl JupiterClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AutobotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn error_body(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("HTTP {}: {}", status, body)
    }
}

#[async_trait]
impl Aggregator for JupiterClient {
    async fn quote(&self, params: &QuoteParams) -> Result<QuoteResponse, AutobotError> {
        let query = [
            ("inputMint", params.input_mint.clone()),
            ("outputMint", params.output_mint.clone()),
            ("amount", params.amount.to_string()),
            ("slippageBps", params.slippage_bps.to_string()),
            ("platformFeeBps", params.platform_fee_bps.to_string()),
        ];

        let response = self
            .client
            .get(format!("{}/quote", self.base_url))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AutobotError::Aggregator(format!(
                "quote failed: {}",
                Self::error_body(response).await
            )));
        }

        let json: Value = response.json().await?;
        let quote = QuoteResponse::from_json(json)?;
        debug!(
            "Quote {} -> {}: in={} out={} via {:?}",
            params.input_mint,
            params.output_mint,
            quote.in_amount,
            quote.out_amount,
            quote.route_labels
        );
        Ok(quote)
    }

    async fn build_swap(
        &self,
        quote: &QuoteResponse,
        user: &Pubkey,
        fee_account: Option<&Pubkey>,
    ) -> Result<SwapTransaction, AutobotError> {
        let request = SwapBuildRequest::new(quote, user, fee_account);

        let response = self
            .client
            .post(format!("{}/swap", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AutobotError::Aggregator(format!(
                "swap build failed: {}",
                Self::error_body(response).await
            )));
        }

        let swap: SwapTransaction = response.json().await?;
        Ok(swap)
    }
}
