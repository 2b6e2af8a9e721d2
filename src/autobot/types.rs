use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors raised by the swap engine and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum AutobotError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error(
        "Amount {amount} exceeds {cap_pct}% of balance {balance}; resend with confirmation to proceed"
    )]
    RequiresConfirmation {
        amount: Decimal,
        balance: f64,
        cap_pct: u8,
    },

    #[error("Wallet not connected: connect a wallet before swapping")]
    WalletNotConnected,

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Jupiter API error: {0}")]
    Aggregator(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transaction validation failed: {0}")]
    ValidationFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Autobot is already running")]
    AlreadyRunning,

    #[error("Autobot is not running")]
    NotRunning,

    #[error("Run stopped")]
    Stopped,
}

impl AutobotError {
    /// HTTP status used when the error crosses the control API
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidAmount(_) | Self::InvalidAddress { .. } | Self::Configuration(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::RequiresConfirmation { .. } | Self::AlreadyRunning | Self::NotRunning => {
                StatusCode::CONFLICT
            }
            Self::WalletNotConnected => StatusCode::PRECONDITION_FAILED,
            Self::Aggregator(_) | Self::Network(_) | Self::Rpc(_) => StatusCode::BAD_GATEWAY,
            Self::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Wallet(_) | Self::TransactionFailed(_) | Self::Stopped => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Operating mode of the autobot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Normal,
    Boost,
    Rewards,
}

/// Snapshot of the run controller, handed out to callers read-only
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunState {
    pub mode: Mode,
    pub running: bool,
    pub paused: bool,
    pub stopping: bool,
    pub current_index: u32,
    pub current_round: u32,
    pub run_id: Option<Uuid>,
}

impl RunState {
    pub fn is_idle(&self) -> bool {
        !self.running && !self.paused && !self.stopping
    }
}

/// One swap as requested by a caller; amounts are human-readable strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: String,
    #[serde(default)]
    pub referral: Option<String>,
    /// Caller acknowledged the balance-cap warning
    #[serde(default)]
    pub confirmed: bool,
}

impl SwapRequest {
    pub fn new(input_mint: &str, output_mint: &str, amount: impl Into<String>) -> Self {
        Self {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount: amount.into(),
            referral: None,
            confirmed: false,
        }
    }

    pub fn with_referral(mut self, referral: Option<String>) -> Self {
        self.referral = referral;
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.confirmed = true;
        self
    }
}

/// Result of a completed swap
#[derive(Debug, Clone, Serialize)]
pub struct SwapOutcome {
    pub signature: String,
    pub solscan_url: String,
    pub in_amount_raw: u64,
    pub out_amount_raw: u64,
    /// False when confirmation timed out; the transaction may still land
    pub confirmed: bool,
    pub warnings: Vec<String>,
}

/// Boost mode: randomized forward swaps followed by one return swap per round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostConfig {
    pub input_mint: String,
    pub output_mint: String,
    pub min_amount: f64,
    pub max_amount: f64,
    pub swaps_per_round: u32,
    /// 0 runs until stopped
    #[serde(default)]
    pub number_of_rounds: u32,
    #[serde(default)]
    pub delay_ms: u64,
    /// Manual return amount; takes precedence over the measured delta
    #[serde(default)]
    pub return_amount: Option<f64>,
    #[serde(default)]
    pub referral: Option<String>,
}

/// Rewards mode: fixed forward swap, then return the full destination balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: f64,
    /// 0 runs until stopped
    #[serde(default)]
    pub number_of_swaps: u32,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub referral: Option<String>,
}

/// Plan handed to the sequencer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RunPlan {
    Normal(SwapRequest),
    Boost(BoostConfig),
    Rewards(RewardsConfig),
}

impl RunPlan {
    pub fn mode(&self) -> Mode {
        match self {
            RunPlan::Normal(_) => Mode::Normal,
            RunPlan::Boost(_) => Mode::Boost,
            RunPlan::Rewards(_) => Mode::Rewards,
        }
    }

    /// Reject plans that can never make progress
    pub fn validate(&self) -> Result<(), AutobotError> {
        match self {
            RunPlan::Normal(req) => {
                if req.input_mint == req.output_mint {
                    return Err(AutobotError::Configuration(
                        "input and output mint must differ".to_string(),
                    ));
                }
            }
            RunPlan::Boost(cfg) => {
                if cfg.input_mint == cfg.output_mint {
                    return Err(AutobotError::Configuration(
                        "input and output mint must differ".to_string(),
                    ));
                }
                if cfg.swaps_per_round == 0 {
                    return Err(AutobotError::Configuration(
                        "swaps_per_round must be at least 1".to_string(),
                    ));
                }
                if !(cfg.min_amount > 0.0 && cfg.max_amount > 0.0) {
                    return Err(AutobotError::InvalidAmount(format!(
                        "boost range [{}, {}] must be positive",
                        cfg.min_amount, cfg.max_amount
                    )));
                }
                if cfg.min_amount > cfg.max_amount {
                    return Err(AutobotError::InvalidAmount(format!(
                        "min_amount {} exceeds max_amount {}",
                        cfg.min_amount, cfg.max_amount
                    )));
                }
            }
            RunPlan::Rewards(cfg) => {
                if cfg.input_mint == cfg.output_mint {
                    return Err(AutobotError::Configuration(
                        "input and output mint must differ".to_string(),
                    ));
                }
                if !(cfg.amount > 0.0) {
                    return Err(AutobotError::InvalidAmount(format!(
                        "rewards amount {} must be positive",
                        cfg.amount
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Counters for the current session
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub swaps_attempted: u64,
    pub swaps_succeeded: u64,
    pub swaps_failed: u64,
    /// Mining rig boosts earned, one per confirmed or submitted swap
    pub boosts: u64,
}

/// Summary returned when a run finishes
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub mode: Mode,
    pub rounds_completed: u32,
    pub forward_swaps: u32,
    pub return_swaps: u32,
    pub failed_swaps: u32,
    pub stopped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_deserializes_by_mode_tag() {
        let json = r#"{
            "mode": "boost",
            "input_mint": "A",
            "output_mint": "B",
            "min_amount": 0.1,
            "max_amount": 0.2,
            "swaps_per_round": 3
        }"#;
        let plan: RunPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.mode(), Mode::Boost);
        match plan {
            RunPlan::Boost(cfg) => {
                assert_eq!(cfg.number_of_rounds, 0);
                assert!(cfg.return_amount.is_none());
            }
            _ => panic!("expected boost plan"),
        }
    }

    #[test]
    fn test_plan_validation() {
        let bad_range = RunPlan::Boost(BoostConfig {
            input_mint: "A".into(),
            output_mint: "B".into(),
            min_amount: 2.0,
            max_amount: 1.0,
            swaps_per_round: 1,
            number_of_rounds: 1,
            delay_ms: 0,
            return_amount: None,
            referral: None,
        });
        assert!(matches!(bad_range.validate(), Err(AutobotError::InvalidAmount(_))));

        let same_mint = RunPlan::Normal(SwapRequest::new("A", "A", "1"));
        assert!(matches!(same_mint.validate(), Err(AutobotError::Configuration(_))));

        let rewards = RunPlan::Rewards(RewardsConfig {
            input_mint: "A".into(),
            output_mint: "B".into(),
            amount: 0.5,
            number_of_swaps: 0,
            delay_ms: 0,
            referral: None,
        });
        assert!(rewards.validate().is_ok());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AutobotError::InvalidAmount("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AutobotError::AlreadyRunning.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AutobotError::WalletNotConnected.status_code(),
            StatusCode::PRECONDITION_FAILED
        );
    }
}
