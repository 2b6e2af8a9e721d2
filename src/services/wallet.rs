//! # Wallet Capability
//!
//! A wallet is something that can sign a versioned transaction, and
//! optionally submit it. The two cases are explicit variants of
//! [`WalletCapability`]; the executor matches on them instead of probing for
//! methods at call time.
//!
//! Both implementations here are backed by a local [`Keypair`], loaded from a
//! JSON keypair file or a base58 private key.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer, read_keypair_file},
    transaction::VersionedTransaction,
};

use crate::autobot::types::AutobotError;

/// Signs a transaction and hands it back for someone else to submit
#[async_trait]
pub trait SignOnly: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    async fn sign_transaction(
        &self,
        tx: VersionedTransaction,
    ) -> Result<VersionedTransaction, AutobotError>;
}

/// Signs and submits a transaction, returning its signature
#[async_trait]
pub trait SignAndSend: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    async fn sign_and_send_transaction(
        &self,
        tx: VersionedTransaction,
    ) -> Result<Signature, AutobotError>;
}

#[derive(Clone)]
pub enum WalletCapability {
    CanSignAndSend(Arc<dyn SignAndSend>),
    CanSignOnly(Arc<dyn SignOnly>),
}

impl WalletCapability {
    pub fn pubkey(&self) -> Pubkey {
        match self {
            WalletCapability::CanSignAndSend(wallet) => wallet.pubkey(),
            WalletCapability::CanSignOnly(wallet) => wallet.pubkey(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WalletCapability::CanSignAndSend(_) => "sign_and_send",
            WalletCapability::CanSignOnly(_) => "sign_only",
        }
    }
}

impl std::fmt::Debug for WalletCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletCapability")
            .field("kind", &self.kind())
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

/// How a keypair-backed wallet gets its transactions onto the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    SignAndSend,
    SignOnly,
}

impl FromStr for SubmitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sign_and_send" | "sign-and-send" => Ok(SubmitMode::SignAndSend),
            "sign_only" | "sign-only" => Ok(SubmitMode::SignOnly),
            other => Err(format!("unknown wallet submit mode '{}'", other)),
        }
    }
}

/// Place the keypair's signature at its index among the message signers
fn sign_with_keypair(
    keypair: &Keypair,
    mut tx: VersionedTransaction,
) -> Result<VersionedTransaction, AutobotError> {
    let pubkey = keypair.pubkey();
    let required = tx.message.header().num_required_signatures as usize;
    let idx = tx
        .message
        .static_account_keys()
        .iter()
        .take(required)
        .position(|key| key == &pubkey)
        .ok_or_else(|| {
            AutobotError::Wallet(format!("{} is not a signer of this transaction", pubkey))
        })?;

    if tx.signatures.len() < required {
        tx.signatures.resize(required, Signature::default());
    }

    let message_data = tx.message.serialize();
    tx.signatures[idx] = keypair.sign_message(&message_data);
    Ok(tx)
}

pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl SignOnly for KeypairWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        tx: VersionedTransaction,
    ) -> Result<VersionedTransaction, AutobotError> {
        sign_with_keypair(&self.keypair, tx)
    }
}

/// Keypair wallet that submits through its own RPC connection
pub struct RpcKeypairWallet {
    keypair: Keypair,
    rpc: Arc<RpcClient>,
}

impl RpcKeypairWallet {
    pub fn new(keypair: Keypair, rpc: Arc<RpcClient>) -> Self {
        Self { keypair, rpc }
    }
}

#[async_trait]
impl SignAndSend for RpcKeypairWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_and_send_transaction(
        &self,
        tx: VersionedTransaction,
    ) -> Result<Signature, AutobotError> {
        let signed = sign_with_keypair(&self.keypair, tx)?;
        self.rpc
            .send_transaction(&signed)
            .await
            .map_err(|e| AutobotError::Rpc(format!("send_transaction: {}", e)))
    }
}

/// Load a keypair from a JSON keypair file or a base58 private key
pub fn load_keypair(path: Option<&str>, private_key: Option<&str>) -> Result<Keypair> {
    if let Some(path) = path {
        return read_keypair_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to read keypair file {}: {}", path, e));
    }

    let private_key = private_key
        .context("No wallet configured: set WALLET_KEYPAIR_PATH or WALLET_PRIVATE_KEY")?;
    let keypair_bytes = bs58::decode(private_key.trim())
        .into_vec()
        .context("Failed to decode private key")?;
    Keypair::try_from(&keypair_bytes[..]).context("Failed to create keypair from bytes")
}

/// Wrap a keypair in the capability matching `mode`
pub fn capability_from_keypair(
    keypair: Keypair,
    mode: SubmitMode,
    rpc: Arc<RpcClient>,
) -> WalletCapability {
    match mode {
        SubmitMode::SignAndSend => {
            WalletCapability::CanSignAndSend(Arc::new(RpcKeypairWallet::new(keypair, rpc)))
        }
        SubmitMode::SignOnly => {
            WalletCapability::CanSignOnly(Arc::new(KeypairWallet::new(keypair)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::instruction::{AccountMeta, Instruction};
    use solana_sdk::message::{Message, VersionedMessage};

    fn unsigned_transfer(payer: &Pubkey) -> VersionedTransaction {
        let ix = Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[2, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0],
            vec![
                AccountMeta::new(*payer, true),
                AccountMeta::new(Pubkey::new_unique(), false),
            ],
        );
        let message = Message::new_with_blockhash(&[ix], Some(payer), &Hash::new_unique());
        VersionedTransaction {
            signatures: vec![Signature::default(); message.header.num_required_signatures as usize],
            message: VersionedMessage::Legacy(message),
        }
    }

    #[tokio::test]
    async fn test_keypair_wallet_signs_in_place() {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        let wallet = KeypairWallet::new(keypair);

        let tx = unsigned_transfer(&pubkey);
        let signed = wallet.sign_transaction(tx).await.unwrap();

        assert_ne!(signed.signatures[0], Signature::default());
        assert!(signed.verify_with_results().iter().all(|ok| *ok));
    }

    #[tokio::test]
    async fn test_keypair_wallet_rejects_foreign_transaction() {
        let wallet = KeypairWallet::new(Keypair::new());
        let tx = unsigned_transfer(&Pubkey::new_unique());
        assert!(matches!(
            wallet.sign_transaction(tx).await,
            Err(AutobotError::Wallet(_))
        ));
    }

    #[test]
    fn test_load_keypair_from_base58() {
        let keypair = Keypair::new();
        let encoded = bs58::encode(keypair.to_bytes()).into_string();
        let loaded = load_keypair(None, Some(&encoded)).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());

        assert!(load_keypair(None, None).is_err());
        assert!(load_keypair(None, Some("not-base58-0OIl")).is_err());
    }

    #[test]
    fn test_submit_mode_parse() {
        assert_eq!("sign_only".parse::<SubmitMode>().unwrap(), SubmitMode::SignOnly);
        assert_eq!("Sign-And-Send".parse::<SubmitMode>().unwrap(), SubmitMode::SignAndSend);
        assert!("both".parse::<SubmitMode>().is_err());
    }
}
