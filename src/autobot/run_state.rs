//! # Run-state Controller
//!
//! Owns the single [`RunState`] of the autobot. Callers get snapshots and
//! issue commands (`pause`, `resume`, `stop`); only the sequencer, through a
//! [`RunGuard`], marks a run as started or finished.
//!
//! ## States
//! `Idle -> Running -> {Paused <-> Running} -> Stopping -> Idle`
//!
//! Pauses are waited out on a `watch` channel rather than polled, and a stop
//! cancels the per-run [`CancellationToken`] so a paused or sleeping loop
//! wakes at once.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::autobot::types::{AutobotError, Mode, RunState};

#[derive(Debug)]
pub struct RunController {
    state: watch::Sender<RunState>,
    cancel: Mutex<CancellationToken>,
}

impl Default for RunController {
    fn default() -> Self {
        Self::new()
    }
}

impl RunController {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunState::default());
        Self {
            state,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn snapshot(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Mark a run as started. Fails if another run is active.
    pub fn begin(self: &Arc<Self>, mode: Mode) -> Result<RunGuard, AutobotError> {
        let run_id = Uuid::new_v4();
        let started = self.state.send_if_modified(|state| {
            if state.running {
                return false;
            }
            *state = RunState {
                mode,
                running: true,
                run_id: Some(run_id),
                ..RunState::default()
            };
            true
        });

        if !started {
            return Err(AutobotError::AlreadyRunning);
        }

        *self.cancel.lock() = CancellationToken::new();
        info!("Run {} started in {:?} mode", run_id, mode);

        Ok(RunGuard {
            controller: Arc::clone(self),
            run_id,
        })
    }

    pub fn pause(&self) -> Result<RunState, AutobotError> {
        let mut result = Err(AutobotError::NotRunning);
        self.state.send_if_modified(|state| {
            if !state.running || state.stopping {
                return false;
            }
            result = Ok(());
            if state.paused {
                return false;
            }
            state.paused = true;
            true
        });
        result?;
        info!("Run paused");
        Ok(self.snapshot())
    }

    pub fn resume(&self) -> Result<RunState, AutobotError> {
        let mut result = Err(AutobotError::NotRunning);
        self.state.send_if_modified(|state| {
            if !state.running || state.stopping {
                return false;
            }
            result = Ok(());
            if !state.paused {
                return false;
            }
            state.paused = false;
            true
        });
        result?;
        info!("Run resumed");
        Ok(self.snapshot())
    }

    /// Request a stop. Idempotent; a no-op when idle.
    pub fn stop(&self) -> RunState {
        let requested = self.state.send_if_modified(|state| {
            if !state.running || state.stopping {
                return false;
            }
            state.stopping = true;
            state.paused = false;
            true
        });

        if requested {
            self.cancel.lock().cancel();
            info!("Stop requested");
        }
        self.snapshot()
    }

    /// Record loop progress for display
    pub fn set_position(&self, round: u32, index: u32) {
        self.state.send_modify(|state| {
            state.current_round = round;
            state.current_index = index;
        });
    }

    /// Gate before any new work: waits out a pause, fails once a stop was requested.
    pub async fn checkpoint(&self) -> Result<(), AutobotError> {
        let token = self.cancel.lock().clone();
        let mut rx = self.state.subscribe();

        let stopping = tokio::select! {
            res = rx.wait_for(|state| !state.paused || state.stopping) => match res {
                Ok(state) => state.stopping,
                Err(_) => true,
            },
            _ = token.cancelled() => true,
        };

        if stopping {
            debug!("Checkpoint observed stop request");
            return Err(AutobotError::Stopped);
        }
        Ok(())
    }

    /// Sleep for `duration` unless stopped, then pass a checkpoint
    pub async fn sleep(&self, duration: Duration) -> Result<(), AutobotError> {
        if !duration.is_zero() {
            let token = self.cancel.lock().clone();
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = token.cancelled() => return Err(AutobotError::Stopped),
            }
        }
        self.checkpoint().await
    }

    fn finish(&self, run_id: Uuid) {
        self.state.send_modify(|state| {
            state.running = false;
            state.paused = false;
            state.stopping = false;
            state.current_index = 0;
            state.current_round = 0;
            state.run_id = None;
        });
        info!("Run {} finished, controller idle", run_id);
    }
}

/// Held for the lifetime of a run; dropping it returns the controller to idle
#[derive(Debug)]
pub struct RunGuard {
    controller: Arc<RunController>,
    run_id: Uuid,
}

impl RunGuard {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.controller.finish(self.run_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[test]
    fn test_single_active_run() {
        let controller = Arc::new(RunController::new());
        let guard = controller.begin(Mode::Boost).unwrap();
        assert!(matches!(
            controller.begin(Mode::Rewards),
            Err(AutobotError::AlreadyRunning)
        ));

        let state = controller.snapshot();
        assert!(state.running);
        assert_eq!(state.mode, Mode::Boost);
        assert_eq!(state.run_id, Some(guard.run_id()));

        drop(guard);
        assert!(controller.snapshot().is_idle());
        assert!(controller.begin(Mode::Rewards).is_ok());
    }

    #[test]
    fn test_commands_require_a_run() {
        let controller = RunController::new();
        assert!(matches!(controller.pause(), Err(AutobotError::NotRunning)));
        assert!(matches!(controller.resume(), Err(AutobotError::NotRunning)));
        assert!(controller.stop().is_idle());
    }

    #[test]
    fn test_guard_drop_resets_everything() {
        let controller = Arc::new(RunController::new());
        let guard = controller.begin(Mode::Boost).unwrap();
        controller.set_position(2, 5);
        controller.pause().unwrap();
        controller.stop();
        assert!(controller.snapshot().stopping);

        drop(guard);
        let state = controller.snapshot();
        assert!(!state.running && !state.paused && !state.stopping);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.current_round, 0);
        assert_eq!(state.run_id, None);
        assert_eq!(state.mode, Mode::Boost);
    }

    #[tokio::test]
    async fn test_checkpoint_blocks_while_paused() {
        let controller = Arc::new(RunController::new());
        let _guard = controller.begin(Mode::Boost).unwrap();

        controller.pause().unwrap();
        let blocked = timeout(Duration::from_millis(50), controller.checkpoint()).await;
        assert!(blocked.is_err(), "checkpoint should wait while paused");

        let waiter = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.checkpoint().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.resume().unwrap();

        let res = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn test_stop_wakes_paused_checkpoint() {
        let controller = Arc::new(RunController::new());
        let _guard = controller.begin(Mode::Rewards).unwrap();
        controller.pause().unwrap();

        let waiter = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.checkpoint().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.stop();

        let res = timeout(Duration::from_millis(200), waiter).await.unwrap().unwrap();
        assert!(matches!(res, Err(AutobotError::Stopped)));
    }

    #[tokio::test]
    async fn test_stop_interrupts_sleep() {
        let controller = Arc::new(RunController::new());
        let _guard = controller.begin(Mode::Boost).unwrap();

        let sleeper = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.sleep(Duration::from_secs(30)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.stop();

        let res = timeout(Duration::from_millis(200), sleeper).await.unwrap().unwrap();
        assert!(matches!(res, Err(AutobotError::Stopped)));
    }
}
