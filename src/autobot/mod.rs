//! # Autobot
//!
//! The swap engine proper: a single-swap [`executor`], the multi-swap
//! [`sequencer`] for boost and rewards modes, and the [`run_state`]
//! controller that pauses and stops it.

pub mod activity_log;
pub mod executor;
pub mod format;
pub mod run_state;
pub mod sequencer;
pub mod types;
pub mod validation;
