//! # Balance Oracle
//!
//! Reads SOL and SPL token balances for a wallet from the configured RPC
//! endpoint. Native SOL balances have a safety reserve subtracted so swaps
//! never spend the lamports needed for fees.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::autobot::types::AutobotError;
use crate::services::tokens::SOL_MINT;

/// Anything that can report a wallet's balance of a mint in UI units
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn balance(&self, owner: &Pubkey, mint: &str) -> Result<f64, AutobotError>;
}

pub struct BalanceOracle {
    rpc: Arc<RpcClient>,
    sol_reserve: f64,
}

impl BalanceOracle {
    pub fn new(rpc: Arc<RpcClient>, sol_reserve: f64) -> Self {
        Self { rpc, sol_reserve }
    }

    /// Spendable SOL: lamports converted to SOL minus the reserve, never negative
    pub fn spendable_sol(lamports: u64, reserve: f64) -> f64 {
        (lamports as f64 / LAMPORTS_PER_SOL as f64 - reserve).max(0.0)
    }

    async fn sol_balance(&self, owner: &Pubkey) -> Result<f64, AutobotError> {
        let lamports = self
            .rpc
            .get_balance(owner)
            .await
            .map_err(|e| AutobotError::Rpc(format!("get_balance {}: {}", owner, e)))?;
        debug!("SOL balance for {}: {} lamports", owner, lamports);
        Ok(Self::spendable_sol(lamports, self.sol_reserve))
    }

    async fn token_balance(&self, owner: &Pubkey, mint: &str) -> Result<f64, AutobotError> {
        let mint_pubkey = Pubkey::from_str(mint).map_err(|e| AutobotError::InvalidAddress {
            address: mint.to_string(),
            reason: e.to_string(),
        })?;

        let accounts = self
            .rpc
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::Mint(mint_pubkey))
            .await
            .map_err(|e| AutobotError::Rpc(format!("get_token_accounts_by_owner: {}", e)))?;

        if accounts.is_empty() {
            debug!("No token account for mint {} and wallet {}", mint, owner);
            return Ok(0.0);
        }

        let mut total = 0.0;
        for account in accounts {
            let account_pubkey = Pubkey::from_str(&account.pubkey).map_err(|e| {
                AutobotError::InvalidAddress {
                    address: account.pubkey.clone(),
                    reason: e.to_string(),
                }
            })?;
            let amount = self
                .rpc
                .get_token_account_balance(&account_pubkey)
                .await
                .map_err(|e| AutobotError::Rpc(format!("get_token_account_balance: {}", e)))?;
            total += amount.ui_amount.unwrap_or(0.0);
        }

        debug!("Token balance for mint {} and wallet {}: {}", mint, owner, total);
        Ok(total)
    }
}

#[async_trait]
impl BalanceSource for BalanceOracle {
    async fn balance(&self, owner: &Pubkey, mint: &str) -> Result<f64, AutobotError> {
        if mint == SOL_MINT {
            self.sol_balance(owner).await
        } else {
            self.token_balance(owner, mint).await
        }
    }
}
