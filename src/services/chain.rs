//! Transaction submission and confirmation status over Solana JSON-RPC.

use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, signature::Signature,
    transaction::VersionedTransaction,
};

use crate::autobot::types::AutobotError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    Pending,
    Confirmed,
    Failed(String),
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, AutobotError>;

    async fn signature_state(&self, signature: &Signature) -> Result<SignatureState, AutobotError>;
}

pub struct RpcChainClient {
    rpc: Arc<RpcClient>,
}

impl RpcChainClient {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, AutobotError> {
        self.rpc
            .send_transaction(tx)
            .await
            .map_err(|e| AutobotError::Rpc(format!("send_transaction: {}", e)))
    }

    async fn signature_state(&self, signature: &Signature) -> Result<SignatureState, AutobotError> {
        let response = self
            .rpc
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| AutobotError::Rpc(format!("get_signature_statuses: {}", e)))?;

        let state = match response.value.into_iter().next().flatten() {
            None => SignatureState::Pending,
            Some(status) => match status.err {
                Some(err) => SignatureState::Failed(err.to_string()),
                None if status.satisfies_commitment(CommitmentConfig::confirmed()) => {
                    SignatureState::Confirmed
                }
                None => SignatureState::Pending,
            },
        };
        Ok(state)
    }
}
