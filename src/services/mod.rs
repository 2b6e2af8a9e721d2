//! # Services Module
//!
//! Clients for everything outside the process: the Jupiter aggregator, the
//! Solana RPC node, the token list, and the wallet that signs for us.

pub mod balance;
pub mod balance_watcher;
pub mod chain;
pub mod jupiter;
pub mod tokens;
pub mod wallet;
