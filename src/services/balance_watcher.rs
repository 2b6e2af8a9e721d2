//! Background balance polling for the connected wallet.
//!
//! Every tick the watcher reads each watched mint concurrently and stores the
//! results in a shared cache that the status endpoints read from. Nothing in
//! the swap path depends on this cache; the executor and sequencer always read
//! live balances.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::autobot::executor::SwapExecution;
use crate::services::balance::BalanceSource;

#[derive(Debug, Clone, Serialize)]
pub struct BalanceSnapshot {
    pub owner: Option<String>,
    pub balances: BTreeMap<String, f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct BalanceWatcher {
    source: Arc<dyn BalanceSource>,
    wallet: Arc<dyn SwapExecution>,
    mints: Vec<String>,
    poll_interval: Duration,
    cache: DashMap<String, f64>,
    owner: RwLock<Option<String>>,
    updated_at: RwLock<Option<DateTime<Utc>>>,
}

impl BalanceWatcher {
    pub fn new(
        source: Arc<dyn BalanceSource>,
        wallet: Arc<dyn SwapExecution>,
        mints: Vec<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            wallet,
            mints,
            poll_interval,
            cache: DashMap::new(),
            owner: RwLock::new(None),
            updated_at: RwLock::new(None),
        }
    }

    /// Poll once. Returns how many mints were refreshed.
    pub async fn refresh(&self) -> usize {
        let Some(owner) = self.wallet.wallet_pubkey() else {
            if self.owner.write().take().is_some() {
                self.cache.clear();
                debug!("Wallet gone, balance cache cleared");
            }
            return 0;
        };

        let owner_str = owner.to_string();
        if self.owner.read().as_deref() != Some(owner_str.as_str()) {
            self.cache.clear();
            *self.owner.write() = Some(owner_str);
        }

        let reads = self
            .mints
            .iter()
            .map(|mint| async move { (mint, self.source.balance(&owner, mint).await) });
        let results = futures::future::join_all(reads).await;

        let mut refreshed = 0;
        for (mint, result) in results {
            match result {
                Ok(balance) => {
                    self.cache.insert(mint.clone(), balance);
                    refreshed += 1;
                }
                Err(e) => warn!("Balance poll for {} failed: {}", mint, e),
            }
        }

        if refreshed > 0 {
            *self.updated_at.write() = Some(Utc::now());
        }
        debug!("Refreshed {}/{} watched balances", refreshed, self.mints.len());
        refreshed
    }

    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            owner: self.owner.read().clone(),
            balances: self
                .cache
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
            updated_at: *self.updated_at.read(),
        }
    }

    /// Poll on an interval until `shutdown` is cancelled
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "👀 Balance watcher polling {} mints every {:?}",
                self.mints.len(),
                self.poll_interval
            );
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.refresh().await;
                    }
                }
            }
            info!("Balance watcher stopped");
        })
    }
}
