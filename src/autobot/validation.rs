//! Checks on aggregator-built transactions before they reach the wallet.

use base64::{Engine, engine::general_purpose::STANDARD};
use once_cell::sync::Lazy;
use solana_sdk::{pubkey, pubkey::Pubkey, transaction::VersionedTransaction};

use crate::autobot::types::AutobotError;

pub const JUPITER_V6_PROGRAM: Pubkey = pubkey!("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4");
pub const JUPITER_REFERRAL_PROGRAM: Pubkey = pubkey!("REFER4ZgmyYx9c6He5XfaTMiGfdLwRnkV4RPp9t9iF3");
pub const MEMO_PROGRAM: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TuFmWeBRnXbLv8yT6Dm4Ls");
pub const SYSTEM_PROGRAM: Pubkey = pubkey!("11111111111111111111111111111111");
pub const COMPUTE_BUDGET_PROGRAM: Pubkey = pubkey!("ComputeBudget111111111111111111111111111111");

static ALLOWED_PROGRAMS: Lazy<Vec<Pubkey>> = Lazy::new(|| {
    vec![
        JUPITER_V6_PROGRAM,
        JUPITER_REFERRAL_PROGRAM,
        MEMO_PROGRAM,
        SYSTEM_PROGRAM,
        COMPUTE_BUDGET_PROGRAM,
        spl_token::ID,
        spl_token_2022::ID,
        spl_associated_token_account::ID,
    ]
});

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub instruction_count: usize,
    pub unknown_programs: Vec<Pubkey>,
}

impl ValidationReport {
    pub fn warnings(&self) -> Vec<String> {
        self.unknown_programs
            .iter()
            .map(|program| format!("Unknown program in swap transaction: {}", program))
            .collect()
    }
}

/// Decode a base64 `swapTransaction` into a versioned transaction
pub fn decode_transaction(encoded: &str) -> Result<VersionedTransaction, AutobotError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AutobotError::ValidationFailed(format!("invalid base64 transaction: {}", e)))?;
    bincode::deserialize(&bytes).map_err(|e| {
        AutobotError::ValidationFailed(format!("failed to deserialize transaction: {}", e))
    })
}

/// Fee payer and empty instruction sets are fatal; unknown programs are reported.
pub fn validate_transaction(
    tx: &VersionedTransaction,
    expected_payer: &Pubkey,
) -> Result<ValidationReport, AutobotError> {
    let keys = tx.message.static_account_keys();

    let fee_payer = keys
        .first()
        .ok_or_else(|| AutobotError::ValidationFailed("transaction has no accounts".to_string()))?;
    if fee_payer != expected_payer {
        return Err(AutobotError::ValidationFailed(format!(
            "fee payer {} does not match wallet {}",
            fee_payer, expected_payer
        )));
    }

    let instructions = tx.message.instructions();
    if instructions.is_empty() {
        return Err(AutobotError::ValidationFailed(
            "transaction has no instructions".to_string(),
        ));
    }

    let mut unknown_programs = Vec::new();
    for ix in instructions {
        let program = keys.get(ix.program_id_index as usize).ok_or_else(|| {
            AutobotError::ValidationFailed(format!(
                "program index {} outside static account keys",
                ix.program_id_index
            ))
        })?;
        if !ALLOWED_PROGRAMS.contains(program) && !unknown_programs.contains(program) {
            unknown_programs.push(*program);
        }
    }

    Ok(ValidationReport {
        instruction_count: instructions.len(),
        unknown_programs,
    })
}
