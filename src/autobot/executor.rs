use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use solana_sdk::pubkey::Pubkey;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::autobot::activity_log::ActivityLog;
use crate::autobot::format::{short, solscan_tx};
use crate::autobot::types::{AutobotError, SessionStats, SwapOutcome, SwapRequest};
use crate::autobot::validation::{decode_transaction, validate_transaction};
use crate::services::balance::BalanceSource;
use crate::services::chain::{ChainClient, SignatureState};
use crate::services::jupiter::{Aggregator, QuoteParams};
use crate::services::tokens::{TokenRegistry, parse_ui_amount, to_raw_amount};
use crate::services::wallet::WalletCapability;

/// Anything that can perform a swap end-to-end; the sequencer drives this
#[async_trait]
pub trait SwapExecution: Send + Sync {
    async fn execute(&self, request: SwapRequest) -> Result<SwapOutcome, AutobotError>;

    fn wallet_pubkey(&self) -> Option<Pubkey>;
}

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub slippage_bps: u16,
    pub platform_fee_bps: u16,
    /// Fee-collection address used when no referral is supplied
    pub vault: Option<Pubkey>,
    /// Largest share of the input balance a single unconfirmed swap may spend
    pub balance_cap_pct: u8,
    pub confirm_timeout: Duration,
    pub confirm_poll_interval: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            slippage_bps: 50,
            platform_fee_bps: 0,
            vault: None,
            balance_cap_pct: 90,
            confirm_timeout: Duration::from_secs(30),
            confirm_poll_interval: Duration::from_millis(500),
        }
    }
}

/// Executes single swaps: quote, build, validate, sign, submit, confirm
pub struct SwapExecutor {
    aggregator: Arc<dyn Aggregator>,
    chain: Arc<dyn ChainClient>,
    balances: Arc<dyn BalanceSource>,
    tokens: Arc<TokenRegistry>,
    wallet: RwLock<Option<WalletCapability>>,
    settings: ExecutorSettings,
    stats: RwLock<SessionStats>,
    log: Arc<ActivityLog>,
}

impl SwapExecutor {
    pub fn new(
        aggregator: Arc<dyn Aggregator>,
        chain: Arc<dyn ChainClient>,
        balances: Arc<dyn BalanceSource>,
        tokens: Arc<TokenRegistry>,
        settings: ExecutorSettings,
        log: Arc<ActivityLog>,
    ) -> Self {
        Self {
            aggregator,
            chain,
            balances,
            tokens,
            wallet: RwLock::new(None),
            settings,
            stats: RwLock::new(SessionStats::default()),
            log,
        }
    }

    pub fn connect(&self, wallet: WalletCapability) -> Pubkey {
        let pubkey = wallet.pubkey();
        self.log.info(format!(
            "🔌 Wallet connected: {} ({})",
            short(&pubkey.to_string(), 4),
            wallet.kind()
        ));
        *self.wallet.write() = Some(wallet);
        pubkey
    }

    pub fn disconnect(&self) -> bool {
        let previous = self.wallet.write().take();
        if let Some(wallet) = &previous {
            self.log
                .info(format!("Wallet disconnected: {}", short(&wallet.pubkey().to_string(), 4)));
        }
        previous.is_some()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.read().clone()
    }

    /// Referral wins over the vault; no fee account means no platform fee
    pub fn resolve_fee_account(
        &self,
        referral: Option<&str>,
    ) -> Result<Option<Pubkey>, AutobotError> {
        match referral.map(str::trim).filter(|r| !r.is_empty()) {
            Some(referral) => Pubkey::from_str(referral)
                .map(Some)
                .map_err(|e| AutobotError::InvalidAddress {
                    address: referral.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(self.settings.vault),
        }
    }

    fn check_balance_cap(&self, amount: Decimal, balance: f64) -> Result<(), AutobotError> {
        let cap = balance * self.settings.balance_cap_pct as f64 / 100.0;
        let requested = amount.to_f64().unwrap_or(f64::MAX);
        if requested > cap {
            return Err(AutobotError::RequiresConfirmation {
                amount,
                balance,
                cap_pct: self.settings.balance_cap_pct,
            });
        }
        Ok(())
    }

    async fn swap(
        &self,
        request: &SwapRequest,
        wallet: WalletCapability,
    ) -> Result<SwapOutcome, AutobotError> {
        let owner = wallet.pubkey();
        let amount = parse_ui_amount(&request.amount)?;
        let fee_account = self.resolve_fee_account(request.referral.as_deref())?;

        if !request.confirmed {
            let balance = self.balances.balance(&owner, &request.input_mint).await?;
            self.check_balance_cap(amount, balance)?;
        }

        let decimals = self.tokens.decimals(&request.input_mint).await;
        let raw_amount = to_raw_amount(amount, decimals)?;
        if raw_amount == 0 {
            return Err(AutobotError::InvalidAmount(format!(
                "{} is below the smallest unit of a {}-decimal token",
                amount, decimals
            )));
        }

        let params = QuoteParams {
            input_mint: request.input_mint.clone(),
            output_mint: request.output_mint.clone(),
            amount: raw_amount,
            slippage_bps: self.settings.slippage_bps,
            platform_fee_bps: if fee_account.is_some() {
                self.settings.platform_fee_bps
            } else {
                0
            },
        };

        self.log.info(format!(
            "🔄 Swapping {} {} -> {}",
            amount,
            short(&request.input_mint, 4),
            short(&request.output_mint, 4)
        ));

        let quote = self.aggregator.quote(&params).await?;
        if quote.input_mint != params.input_mint || quote.output_mint != params.output_mint {
            return Err(AutobotError::Aggregator(format!(
                "quote is for {} -> {}, requested {} -> {}",
                short(&quote.input_mint, 4),
                short(&quote.output_mint, 4),
                short(&params.input_mint, 4),
                short(&params.output_mint, 4)
            )));
        }
        debug!("Quote out_amount={} impact={}%", quote.out_amount, quote.price_impact_pct);

        let built = self
            .aggregator
            .build_swap(&quote, &owner, fee_account.as_ref())
            .await?;

        if let Some(height) = built.last_valid_block_height {
            debug!("Swap transaction valid until block height {}", height);
        }

        let tx = decode_transaction(&built.swap_transaction)?;
        let report = validate_transaction(&tx, &owner)?;
        let mut warnings = report.warnings();
        for warning in &warnings {
            self.log.warn(format!("⚠️ {}", warning));
        }

        let signature = match wallet {
            WalletCapability::CanSignAndSend(wallet) => {
                wallet.sign_and_send_transaction(tx).await?
            }
            WalletCapability::CanSignOnly(wallet) => {
                let signed = wallet.sign_transaction(tx).await?;
                self.chain.send_transaction(&signed).await?
            }
        };
        let signature_str = signature.to_string();
        info!("Submitted swap transaction {}", signature_str);

        let confirmed = self.await_confirmation(&signature).await?;
        if !confirmed {
            let warning = format!(
                "Confirmation timed out after {:?}; transaction may still land: {}",
                self.settings.confirm_timeout,
                solscan_tx(&signature_str)
            );
            self.log.warn(format!("⏳ {}", warning));
            warnings.push(warning);
        }

        Ok(SwapOutcome {
            solscan_url: solscan_tx(&signature_str),
            signature: signature_str,
            in_amount_raw: quote.in_amount,
            out_amount_raw: quote.out_amount,
            confirmed,
            warnings,
        })
    }

    /// Poll until confirmed. `Ok(false)` on timeout, `Err` if the transaction failed on-chain.
    async fn await_confirmation(
        &self,
        signature: &solana_sdk::signature::Signature,
    ) -> Result<bool, AutobotError> {
        let deadline = Instant::now() + self.settings.confirm_timeout;

        loop {
            match self.chain.signature_state(signature).await {
                Ok(SignatureState::Confirmed) => return Ok(true),
                Ok(SignatureState::Failed(reason)) => {
                    return Err(AutobotError::TransactionFailed(format!(
                        "{} failed on-chain: {}",
                        signature, reason
                    )));
                }
                Ok(SignatureState::Pending) => {}
                Err(e) => debug!("Status poll for {} failed: {}", signature, e),
            }

            if Instant::now() + self.settings.confirm_poll_interval > deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.settings.confirm_poll_interval).await;
        }
    }

    fn record(&self, result: &Result<SwapOutcome, AutobotError>) {
        let mut stats = self.stats.write();
        stats.swaps_attempted += 1;
        match result {
            Ok(_) => {
                stats.swaps_succeeded += 1;
                stats.boosts += 1;
            }
            Err(_) => stats.swaps_failed += 1,
        }
    }
}

#[async_trait]
impl SwapExecution for SwapExecutor {
    async fn execute(&self, request: SwapRequest) -> Result<SwapOutcome, AutobotError> {
        let wallet = self
            .wallet
            .read()
            .clone()
            .ok_or(AutobotError::WalletNotConnected)?;

        let result = self.swap(&request, wallet).await;
        self.record(&result);

        match &result {
            Ok(outcome) if outcome.confirmed => {
                self.log.success(format!("✅ Swap confirmed: {}", outcome.solscan_url));
            }
            Ok(outcome) => {
                self.log.info(format!("📨 Swap submitted: {}", outcome.solscan_url));
            }
            Err(e @ AutobotError::RequiresConfirmation { .. }) => {
                self.log.warn(format!("🛑 {}", e));
            }
            Err(e) => {
                self.log.error(format!("❌ Swap failed: {}", e));
            }
        }
        result
    }

    fn wallet_pubkey(&self) -> Option<Pubkey> {
        self.wallet.read().as_ref().map(WalletCapability::pubkey)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::autobot::validation::JUPITER_V6_PROGRAM;
    use crate::services::jupiter::{QuoteResponse, SwapTransaction};
    use crate::services::tokens::{SOL_MINT, USDC_MINT};
    use crate::services::wallet::{KeypairWallet, SignAndSend, SignOnly};
    use base64::{Engine, engine::general_purpose::STANDARD};
    use parking_lot::Mutex;
    use serde_json::json;
    use solana_sdk::hash::Hash;
    use solana_sdk::instruction::{AccountMeta, Instruction};
    use solana_sdk::message::{Message, VersionedMessage};
    use solana_sdk::signature::{Keypair, Signature, Signer};
    use solana_sdk::transaction::VersionedTransaction;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Aggregator that builds a transaction paid by `payer` calling `program`
    pub(crate) struct MockAggregator {
        pub payer: Pubkey,
        pub program: Pubkey,
        pub quotes: AtomicUsize,
        pub builds: AtomicUsize,
        pub last_quote: Mutex<Option<QuoteParams>>,
        pub last_fee_account: Mutex<Option<Option<Pubkey>>>,
        /// Output mint reported in quotes; the requested one when unset
        pub quoted_output: Option<String>,
    }

    impl MockAggregator {
        pub(crate) fn new(payer: Pubkey) -> Self {
            Self {
                payer,
                program: JUPITER_V6_PROGRAM,
                quotes: AtomicUsize::new(0),
                builds: AtomicUsize::new(0),
                last_quote: Mutex::new(None),
                last_fee_account: Mutex::new(None),
                quoted_output: None,
            }
        }

        fn network_calls(&self) -> usize {
            self.quotes.load(Ordering::SeqCst) + self.builds.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Aggregator for MockAggregator {
        async fn quote(&self, params: &QuoteParams) -> Result<QuoteResponse, AutobotError> {
            self.quotes.fetch_add(1, Ordering::SeqCst);
            *self.last_quote.lock() = Some(params.clone());
            QuoteResponse::from_json(json!({
                "inputMint": params.input_mint,
                "outputMint": self.quoted_output.as_ref().unwrap_or(&params.output_mint),
                "inAmount": params.amount.to_string(),
                "outAmount": (params.amount * 2).to_string(),
            }))
        }

        async fn build_swap(
            &self,
            _quote: &QuoteResponse,
            _user: &Pubkey,
            fee_account: Option<&Pubkey>,
        ) -> Result<SwapTransaction, AutobotError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            *self.last_fee_account.lock() = Some(fee_account.copied());

            let ix = Instruction::new_with_bytes(
                self.program,
                &[7],
                vec![AccountMeta::new(self.payer, true)],
            );
            let message =
                Message::new_with_blockhash(&[ix], Some(&self.payer), &Hash::new_unique());
            let tx = VersionedTransaction {
                signatures: vec![
                    Signature::default();
                    message.header.num_required_signatures as usize
                ],
                message: VersionedMessage::Legacy(message),
            };
            Ok(SwapTransaction {
                swap_transaction: STANDARD.encode(bincode::serialize(&tx).unwrap()),
                last_valid_block_height: None,
            })
        }
    }

    pub(crate) struct MockChain {
        pub state: SignatureState,
        pub sent: AtomicUsize,
    }

    impl MockChain {
        pub(crate) fn new(state: SignatureState) -> Self {
            Self {
                state,
                sent: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChainClient for MockChain {
        async fn send_transaction(
            &self,
            tx: &VersionedTransaction,
        ) -> Result<Signature, AutobotError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(tx.signatures[0])
        }

        async fn signature_state(
            &self,
            _signature: &Signature,
        ) -> Result<SignatureState, AutobotError> {
            Ok(self.state.clone())
        }
    }

    pub(crate) struct FixedBalance(pub f64);

    #[async_trait]
    impl BalanceSource for FixedBalance {
        async fn balance(&self, _owner: &Pubkey, _mint: &str) -> Result<f64, AutobotError> {
            Ok(self.0)
        }
    }

    /// Sign-only wallet that counts how often it was asked to sign
    struct CountingWallet {
        inner: KeypairWallet,
        pubkey: Pubkey,
        signed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SignOnly for CountingWallet {
        fn pubkey(&self) -> Pubkey {
            self.pubkey
        }

        async fn sign_transaction(
            &self,
            tx: VersionedTransaction,
        ) -> Result<VersionedTransaction, AutobotError> {
            self.signed.fetch_add(1, Ordering::SeqCst);
            self.inner.sign_transaction(tx).await
        }
    }

    /// Wallet that submits on its own, bypassing the chain client
    struct SendingWallet {
        inner: KeypairWallet,
        pubkey: Pubkey,
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SignAndSend for SendingWallet {
        fn pubkey(&self) -> Pubkey {
            self.pubkey
        }

        async fn sign_and_send_transaction(
            &self,
            tx: VersionedTransaction,
        ) -> Result<Signature, AutobotError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            let signed = self.inner.sign_transaction(tx).await?;
            Ok(signed.signatures[0])
        }
    }

    struct Harness {
        executor: SwapExecutor,
        aggregator: Arc<MockAggregator>,
        chain: Arc<MockChain>,
        signed: Arc<AtomicUsize>,
        wallet_pubkey: Pubkey,
    }

    fn harness(balance: f64, state: SignatureState, settings: ExecutorSettings) -> Harness {
        let keypair = Keypair::new();
        let wallet_pubkey = keypair.pubkey();
        let signed = Arc::new(AtomicUsize::new(0));
        let aggregator = Arc::new(MockAggregator::new(wallet_pubkey));
        let chain = Arc::new(MockChain::new(state));

        let executor = SwapExecutor::new(
            aggregator.clone(),
            chain.clone(),
            Arc::new(FixedBalance(balance)),
            Arc::new(TokenRegistry::new("http://127.0.0.1:9").unwrap()),
            settings,
            Arc::new(ActivityLog::new()),
        );
        executor.connect(WalletCapability::CanSignOnly(Arc::new(CountingWallet {
            inner: KeypairWallet::new(keypair),
            pubkey: wallet_pubkey,
            signed: signed.clone(),
        })));

        Harness {
            executor,
            aggregator,
            chain,
            signed,
            wallet_pubkey,
        }
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts_before_network() {
        let h = harness(100.0, SignatureState::Confirmed, ExecutorSettings::default());
        for amount in ["0", "-5", "nope", ""] {
            let err = h
                .executor
                .execute(SwapRequest::new(SOL_MINT, USDC_MINT, amount))
                .await
                .unwrap_err();
            assert!(matches!(err, AutobotError::InvalidAmount(_)), "{amount}: {err}");
        }
        assert_eq!(h.aggregator.network_calls(), 0);
        assert_eq!(h.executor.stats().swaps_failed, 4);
    }

    #[tokio::test]
    async fn test_balance_cap_requires_confirmation() {
        let h = harness(10.0, SignatureState::Confirmed, ExecutorSettings::default());

        let err = h
            .executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "9.5"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutobotError::RequiresConfirmation { cap_pct: 90, .. }));
        assert_eq!(h.aggregator.network_calls(), 0);

        let outcome = h
            .executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "9.5").confirmed())
            .await
            .unwrap();
        assert!(outcome.confirmed);
        assert_eq!(outcome.in_amount_raw, 9_500_000_000);
    }

    #[tokio::test]
    async fn test_successful_swap_signs_submits_and_counts() {
        let h = harness(10.0, SignatureState::Confirmed, ExecutorSettings::default());

        let outcome = h
            .executor
            .execute(SwapRequest::new(USDC_MINT, SOL_MINT, "1.25"))
            .await
            .unwrap();

        assert_eq!(outcome.in_amount_raw, 1_250_000);
        assert_eq!(outcome.out_amount_raw, 2_500_000);
        assert!(outcome.solscan_url.contains(&outcome.signature));
        assert!(outcome.warnings.is_empty());
        assert_eq!(h.signed.load(Ordering::SeqCst), 1);
        assert_eq!(h.chain.sent.load(Ordering::SeqCst), 1);

        let stats = h.executor.stats();
        assert_eq!(stats.swaps_succeeded, 1);
        assert_eq!(stats.boosts, 1);
        assert_eq!(h.executor.wallet_pubkey(), Some(h.wallet_pubkey));
    }

    #[tokio::test]
    async fn test_sign_and_send_wallet_submits_itself() {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        let sent = Arc::new(AtomicUsize::new(0));
        let chain = Arc::new(MockChain::new(SignatureState::Confirmed));
        let executor = SwapExecutor::new(
            Arc::new(MockAggregator::new(pubkey)),
            chain.clone(),
            Arc::new(FixedBalance(10.0)),
            Arc::new(TokenRegistry::new("http://127.0.0.1:9").unwrap()),
            ExecutorSettings::default(),
            Arc::new(ActivityLog::new()),
        );
        executor.connect(WalletCapability::CanSignAndSend(Arc::new(SendingWallet {
            inner: KeypairWallet::new(keypair),
            pubkey,
            sent: sent.clone(),
        })));

        let outcome = executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1"))
            .await
            .unwrap();

        assert!(outcome.confirmed);
        assert_ne!(outcome.signature, Signature::default().to_string());
        assert_eq!(sent.load(Ordering::SeqCst), 1);
        assert_eq!(chain.sent.load(Ordering::SeqCst), 0);
        assert_eq!(executor.stats().swaps_succeeded, 1);
    }

    #[tokio::test]
    async fn test_referral_takes_priority_over_vault() {
        let vault = Pubkey::new_unique();
        let referral = Pubkey::new_unique();
        let settings = ExecutorSettings {
            vault: Some(vault),
            platform_fee_bps: 25,
            ..ExecutorSettings::default()
        };
        let h = harness(10.0, SignatureState::Confirmed, settings);

        h.executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1"))
            .await
            .unwrap();
        assert_eq!(*h.aggregator.last_fee_account.lock(), Some(Some(vault)));
        assert_eq!(h.aggregator.last_quote.lock().as_ref().unwrap().platform_fee_bps, 25);

        h.executor
            .execute(
                SwapRequest::new(SOL_MINT, USDC_MINT, "1")
                    .with_referral(Some(referral.to_string())),
            )
            .await
            .unwrap();
        assert_eq!(*h.aggregator.last_fee_account.lock(), Some(Some(referral)));

        let err = h
            .executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1").with_referral(Some("bad".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, AutobotError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_no_fee_account_sends_zero_platform_fee() {
        let settings = ExecutorSettings {
            platform_fee_bps: 25,
            ..ExecutorSettings::default()
        };
        let h = harness(10.0, SignatureState::Confirmed, settings);
        h.executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1"))
            .await
            .unwrap();
        assert_eq!(h.aggregator.last_quote.lock().as_ref().unwrap().platform_fee_bps, 0);
        assert_eq!(*h.aggregator.last_fee_account.lock(), Some(None));
    }

    #[tokio::test]
    async fn test_fee_payer_mismatch_blocks_signing() {
        let keypair = Keypair::new();
        let signed = Arc::new(AtomicUsize::new(0));
        let aggregator = Arc::new(MockAggregator::new(Pubkey::new_unique()));
        let executor = SwapExecutor::new(
            aggregator.clone(),
            Arc::new(MockChain::new(SignatureState::Confirmed)),
            Arc::new(FixedBalance(10.0)),
            Arc::new(TokenRegistry::new("http://127.0.0.1:9").unwrap()),
            ExecutorSettings::default(),
            Arc::new(ActivityLog::new()),
        );
        let pubkey = keypair.pubkey();
        executor.connect(WalletCapability::CanSignOnly(Arc::new(CountingWallet {
            inner: KeypairWallet::new(keypair),
            pubkey,
            signed: signed.clone(),
        })));

        let err = executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutobotError::ValidationFailed(_)));
        assert_eq!(signed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_program_only_warns() {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        let mut aggregator = MockAggregator::new(pubkey);
        aggregator.program = Pubkey::new_unique();
        let log = Arc::new(ActivityLog::new());
        let executor = SwapExecutor::new(
            Arc::new(aggregator),
            Arc::new(MockChain::new(SignatureState::Confirmed)),
            Arc::new(FixedBalance(10.0)),
            Arc::new(TokenRegistry::new("http://127.0.0.1:9").unwrap()),
            ExecutorSettings::default(),
            log.clone(),
        );
        executor.connect(WalletCapability::CanSignOnly(Arc::new(KeypairWallet::new(keypair))));

        let outcome = executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1"))
            .await
            .unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(log.entries().iter().any(|e| e.message.contains("Unknown program")));
    }

    #[tokio::test]
    async fn test_quote_for_other_mints_is_rejected() {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        let mut aggregator = MockAggregator::new(pubkey);
        aggregator.quoted_output = Some(Pubkey::new_unique().to_string());
        let aggregator = Arc::new(aggregator);
        let executor = SwapExecutor::new(
            aggregator.clone(),
            Arc::new(MockChain::new(SignatureState::Confirmed)),
            Arc::new(FixedBalance(10.0)),
            Arc::new(TokenRegistry::new("http://127.0.0.1:9").unwrap()),
            ExecutorSettings::default(),
            Arc::new(ActivityLog::new()),
        );
        executor.connect(WalletCapability::CanSignOnly(Arc::new(KeypairWallet::new(keypair))));

        let err = executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutobotError::Aggregator(_)));
        assert_eq!(aggregator.builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_is_not_an_error() {
        let settings = ExecutorSettings {
            confirm_timeout: Duration::from_millis(60),
            confirm_poll_interval: Duration::from_millis(10),
            ..ExecutorSettings::default()
        };
        let h = harness(10.0, SignatureState::Pending, settings);

        let outcome = h
            .executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1"))
            .await
            .unwrap();
        assert!(!outcome.confirmed);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_on_chain_failure_is_an_error() {
        let h = harness(
            10.0,
            SignatureState::Failed("InstructionError".into()),
            ExecutorSettings::default(),
        );
        let err = h
            .executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutobotError::TransactionFailed(_)));
        assert_eq!(h.executor.stats().boosts, 0);
    }

    #[tokio::test]
    async fn test_disconnected_wallet() {
        let h = harness(10.0, SignatureState::Confirmed, ExecutorSettings::default());
        assert!(h.executor.disconnect());
        assert!(!h.executor.disconnect());

        let err = h
            .executor
            .execute(SwapRequest::new(SOL_MINT, USDC_MINT, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutobotError::WalletNotConnected));
        assert_eq!(h.aggregator.network_calls(), 0);
    }
}
