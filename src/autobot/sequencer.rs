//! # Sequencer
//!
//! Drives repeated swaps under a mode plan:
//!
//! - **normal**: one forward swap
//! - **boost**: per round, `swaps_per_round` forward swaps of a random amount
//!   in `[min, max]`, then one return swap of the destination-balance delta
//!   (or the configured manual amount)
//! - **rewards**: per cycle, one forward swap of a fixed amount, then one
//!   return swap of the whole destination balance
//!
//! Swaps run strictly one after another. A failed swap is logged and the
//! loop moves on; nothing is retried. Every swap is preceded by a run
//! controller checkpoint, so pause and stop take effect between swaps.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use solana_sdk::pubkey::Pubkey;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::autobot::activity_log::ActivityLog;
use crate::autobot::executor::SwapExecution;
use crate::autobot::format::short;
use crate::autobot::run_state::{RunController, RunGuard};
use crate::autobot::types::{
    AutobotError, BoostConfig, RewardsConfig, RunPlan, RunSummary, SwapRequest,
};
use crate::services::balance::BalanceSource;
use crate::services::tokens::format_ui_amount;

/// Precision used when turning float amounts into request strings; the
/// executor truncates further to the mint's decimals.
const AMOUNT_PRECISION: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Forward,
    Return,
}

pub struct Sequencer {
    executor: Arc<dyn SwapExecution>,
    balances: Arc<dyn BalanceSource>,
    controller: Arc<RunController>,
    log: Arc<ActivityLog>,
}

impl Sequencer {
    pub fn new(
        executor: Arc<dyn SwapExecution>,
        balances: Arc<dyn BalanceSource>,
        controller: Arc<RunController>,
        log: Arc<ActivityLog>,
    ) -> Self {
        Self {
            executor,
            balances,
            controller,
            log,
        }
    }

    pub fn controller(&self) -> &Arc<RunController> {
        &self.controller
    }

    /// Run a plan to completion on the current task
    pub async fn run(&self, plan: RunPlan) -> Result<RunSummary, AutobotError> {
        let (owner, guard) = self.prepare(&plan)?;
        Ok(self.drive(plan, owner, guard).await)
    }

    /// Register a run and drive it on a background task
    pub fn start(
        self: &Arc<Self>,
        plan: RunPlan,
    ) -> Result<(Uuid, JoinHandle<RunSummary>), AutobotError> {
        let (owner, guard) = self.prepare(&plan)?;
        let run_id = guard.run_id();
        let sequencer = Arc::clone(self);
        let handle = tokio::spawn(async move { sequencer.drive(plan, owner, guard).await });
        Ok((run_id, handle))
    }

    fn prepare(&self, plan: &RunPlan) -> Result<(Pubkey, RunGuard), AutobotError> {
        plan.validate()?;
        let owner = self
            .executor
            .wallet_pubkey()
            .ok_or(AutobotError::WalletNotConnected)?;
        let guard = self.controller.begin(plan.mode())?;
        Ok((owner, guard))
    }

    async fn drive(&self, plan: RunPlan, owner: Pubkey, guard: RunGuard) -> RunSummary {
        let mut summary = RunSummary {
            run_id: guard.run_id(),
            mode: plan.mode(),
            rounds_completed: 0,
            forward_swaps: 0,
            return_swaps: 0,
            failed_swaps: 0,
            stopped: false,
        };

        self.log.info(format!("▶️ Autobot started in {:?} mode", summary.mode));

        let result = match &plan {
            RunPlan::Normal(request) => self.run_normal(request, &mut summary).await,
            RunPlan::Boost(config) => self.run_boost(config, &owner, &mut summary).await,
            RunPlan::Rewards(config) => self.run_rewards(config, &owner, &mut summary).await,
        };

        match result {
            Ok(()) => self.log.info(format!(
                "🏁 Autobot finished: {} rounds, {} forward, {} return, {} failed",
                summary.rounds_completed,
                summary.forward_swaps,
                summary.return_swaps,
                summary.failed_swaps
            )),
            Err(AutobotError::Stopped) => {
                summary.stopped = true;
                self.log.info(format!(
                    "⏹️ Autobot stopped after {} rounds",
                    summary.rounds_completed
                ))
            }
            Err(e) => self.log.error(format!("Autobot aborted: {}", e)),
        };

        drop(guard);
        summary
    }

    async fn run_normal(
        &self,
        request: &SwapRequest,
        summary: &mut RunSummary,
    ) -> Result<(), AutobotError> {
        self.controller.checkpoint().await?;
        self.controller.set_position(1, 1);
        self.attempt(request.clone(), Leg::Forward, summary).await;
        summary.rounds_completed = 1;
        Ok(())
    }

    async fn run_boost(
        &self,
        config: &BoostConfig,
        owner: &Pubkey,
        summary: &mut RunSummary,
    ) -> Result<(), AutobotError> {
        let delay = Duration::from_millis(config.delay_ms);
        let mut round = 0u32;

        while config.number_of_rounds == 0 || round < config.number_of_rounds {
            self.controller.checkpoint().await?;
            let display_round = round + 1;
            self.log.info(format!(
                "🚀 Boost round {}{}",
                display_round,
                total_suffix(config.number_of_rounds)
            ));

            let start_balance = self.read_balance(owner, &config.output_mint).await;

            for index in 0..config.swaps_per_round {
                self.controller.checkpoint().await?;
                self.controller.set_position(display_round, index + 1);

                let amount = draw_amount(config.min_amount, config.max_amount);
                let request = SwapRequest::new(
                    &config.input_mint,
                    &config.output_mint,
                    format_ui_amount(amount, AMOUNT_PRECISION),
                )
                .with_referral(config.referral.clone());
                self.attempt(request, Leg::Forward, summary).await;

                self.controller.sleep(delay).await?;
            }

            let return_amount = match config.return_amount {
                Some(manual) => Some(manual),
                None => match (start_balance, self.read_balance(owner, &config.output_mint).await) {
                    (Some(start), Some(end)) => Some(end - start),
                    _ => None,
                },
            };

            match return_amount {
                None => {
                    self.log.warn(format!(
                        "⚠️ Could not measure {} balance, skipping return swap",
                        short(&config.output_mint, 4)
                    ));
                }
                Some(amount) if amount <= 0.0 => {
                    self.log.warn(format!(
                        "⚠️ Return amount {} is not positive, skipping return swap",
                        amount
                    ));
                }
                Some(amount) => {
                    self.controller.checkpoint().await?;
                    self.controller
                        .set_position(display_round, config.swaps_per_round + 1);
                    let request = SwapRequest::new(
                        &config.output_mint,
                        &config.input_mint,
                        format_ui_amount(amount, AMOUNT_PRECISION),
                    )
                    .with_referral(config.referral.clone())
                    .confirmed();
                    self.attempt(request, Leg::Return, summary).await;
                }
            };

            summary.rounds_completed += 1;
            round += 1;

            if config.number_of_rounds == 0 || round < config.number_of_rounds {
                self.controller.sleep(delay).await?;
            }
        }
        Ok(())
    }

    async fn run_rewards(
        &self,
        config: &RewardsConfig,
        owner: &Pubkey,
        summary: &mut RunSummary,
    ) -> Result<(), AutobotError> {
        let delay = Duration::from_millis(config.delay_ms);
        let mut cycle = 0u32;

        while config.number_of_swaps == 0 || cycle < config.number_of_swaps {
            self.controller.checkpoint().await?;
            let display_cycle = cycle + 1;
            self.controller.set_position(display_cycle, 1);
            self.log.info(format!(
                "🎁 Rewards cycle {}{}",
                display_cycle,
                total_suffix(config.number_of_swaps)
            ));

            let request = SwapRequest::new(
                &config.input_mint,
                &config.output_mint,
                format_ui_amount(config.amount, AMOUNT_PRECISION),
            )
            .with_referral(config.referral.clone());
            self.attempt(request, Leg::Forward, summary).await;

            self.controller.sleep(delay).await?;

            match self.read_balance(owner, &config.output_mint).await {
                None => {
                    self.log.warn(format!(
                        "⚠️ Could not read {} balance, skipping return swap",
                        short(&config.output_mint, 4)
                    ));
                }
                Some(balance) if balance <= 0.0 => {
                    self.log.warn(format!(
                        "⚠️ No {} balance to return, skipping return swap",
                        short(&config.output_mint, 4)
                    ));
                }
                Some(balance) => {
                    self.controller.set_position(display_cycle, 2);
                    let request = SwapRequest::new(
                        &config.output_mint,
                        &config.input_mint,
                        format_ui_amount(balance, AMOUNT_PRECISION),
                    )
                    .with_referral(config.referral.clone())
                    .confirmed();
                    self.attempt(request, Leg::Return, summary).await;
                }
            };

            summary.rounds_completed += 1;
            cycle += 1;

            if config.number_of_swaps == 0 || cycle < config.number_of_swaps {
                self.controller.sleep(delay).await?;
            }
        }
        Ok(())
    }

    /// One swap attempt; failures are counted, never propagated
    async fn attempt(&self, request: SwapRequest, leg: Leg, summary: &mut RunSummary) {
        match leg {
            Leg::Forward => summary.forward_swaps += 1,
            Leg::Return => summary.return_swaps += 1,
        }

        match self.executor.execute(request).await {
            Ok(outcome) => debug!("{:?} swap landed: {}", leg, outcome.signature),
            Err(e) => {
                debug!("{:?} swap failed: {}", leg, e);
                summary.failed_swaps += 1;
            }
        }
    }

    async fn read_balance(&self, owner: &Pubkey, mint: &str) -> Option<f64> {
        match self.balances.balance(owner, mint).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                self.log
                    .warn(format!("Balance lookup for {} failed: {}", short(mint, 4), e));
                None
            }
        }
    }
}

fn total_suffix(total: u32) -> String {
    if total == 0 {
        " (until stopped)".to_string()
    } else {
        format!(" of {}", total)
    }
}

/// Uniform draw from `[min, max]`
fn draw_amount(min: f64, max: f64) -> f64 {
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}
