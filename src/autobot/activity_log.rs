//! # Activity Log
//!
//! Append-only, in-memory record of what the autobot did. Entries are
//! numbered so pollers can ask for everything after the last sequence they
//! saw. Every entry is mirrored to `tracing`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityLogEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: RwLock<Vec<ActivityLogEntry>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its sequence number
    pub fn push(&self, level: LogLevel, message: impl Into<String>) -> u64 {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => info!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }

        let mut entries = self.entries.write();
        let seq = entries.len() as u64;
        entries.push(ActivityLogEntry {
            seq,
            timestamp: Utc::now(),
            level,
            message,
        });
        seq
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Success, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Warn, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Error, message)
    }

    pub fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries.read().clone()
    }

    /// Entries with a sequence number greater than or equal to `seq`
    pub fn since(&self, seq: u64) -> Vec<ActivityLogEntry> {
        let entries = self.entries.read();
        let start = (seq as usize).min(entries.len());
        entries[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
