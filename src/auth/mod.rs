//! # Authentication Module
//!
//! Bearer-token guard for the control API. When no token is configured the
//! API is open, which is only sensible on a loopback bind.

pub mod middleware;
