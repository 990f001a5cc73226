// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Event log for security-relevant operations.
//!
//! Every relay, security change, unsigned finalization and administrator
//! edit produces one [`WalletEvent`], accepted or not.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{StorageError, StorageResult};
use crate::error::WalletError;

/// Types of logged events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // Factory
    WalletRegistered,

    // Relayed batches
    PlainBatch,
    WhitelistBatch,
    SessionBatch,

    // Relayed security changes
    AddToWhitelist,
    RemoveFromWhitelist,
    CreateSession,
    ClearSession,
    AddGuardian,
    RevokeGuardianAddition,
    ConfirmGuardianAddition,
    RemoveGuardian,
    RevokeGuardianRemoval,
    Lock,
    Unlock,
    ExecuteRecovery,
    CancelRecovery,
    TransferOwnership,

    // Unsigned
    FinalizeRecovery,
    ConfirmGuardianRemoval,

    // Admin
    AuthorisationAdded,
    AuthorisationRemoved,
}

/// A log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletEvent {
    /// Unique event ID.
    pub event_id: String,
    /// Engine time of the event.
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub wallet: Option<Address>,
    /// Operation parameters as JSON.
    pub details: Option<serde_json::Value>,
    pub success: bool,
    pub error: Option<String>,
    pub error_code: Option<String>,
}

impl WalletEvent {
    /// Create a successful event stamped with engine time `now`.
    pub fn new(kind: EventKind, now: u64) -> Self {
        let timestamp = i64::try_from(now)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_default();
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            kind,
            wallet: None,
            details: None,
            success: true,
            error: None,
            error_code: None,
        }
    }

    pub fn with_wallet(mut self, wallet: Address) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed.
    pub fn failed(mut self, error: &WalletError) -> Self {
        self.success = false;
        self.error = Some(error.to_string());
        self.error_code = Some(error.error_code().to_string());
        self
    }
}

/// Sink for [`WalletEvent`]s.
pub trait EventLog: Send + Sync {
    fn record(&mut self, event: &WalletEvent) -> StorageResult<()>;
}

/// In-memory log. Clones share the same buffer, so a test can keep a
/// handle after giving one to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    events: Arc<Mutex<Vec<WalletEvent>>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WalletEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventLog for MemoryEventLog {
    fn record(&mut self, event: &WalletEvent) -> StorageResult<()> {
        self.events
            .lock()
            .map_err(|_| StorageError::Corrupt("event buffer poisoned".into()))?
            .push(event.clone());
        Ok(())
    }
}

/// Appends events to daily `events-YYYY-MM-DD.jsonl` files.
#[derive(Debug, Clone)]
pub struct JsonlEventLog {
    dir: PathBuf,
}

impl JsonlEventLog {
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn file_for(&self, date: &str) -> PathBuf {
        self.dir.join(format!("events-{date}.jsonl"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read events for a specific date (`YYYY-MM-DD`).
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<WalletEvent>> {
        let path = self.file_for(date);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(line)?);
        }
        Ok(events)
    }

    /// Read events for an inclusive date range.
    pub fn read_events_range(&self, start: &str, end: &str) -> StorageResult<Vec<WalletEvent>> {
        let parse = |raw: &str| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| StorageError::Corrupt(format!("invalid date {raw}: {e}")))
        };
        let (mut current, end) = (parse(start)?, parse(end)?);

        let mut all = Vec::new();
        while current <= end {
            all.extend(self.read_events(&current.format("%Y-%m-%d").to_string())?);
            current = current
                .succ_opt()
                .ok_or_else(|| StorageError::Corrupt("date overflow".into()))?;
        }
        Ok(all)
    }

    /// Events of one wallet on a given date.
    pub fn search_by_wallet(&self, wallet: &Address, date: &str) -> StorageResult<Vec<WalletEvent>> {
        Ok(self
            .read_events(date)?
            .into_iter()
            .filter(|e| e.wallet.as_ref() == Some(wallet))
            .collect())
    }
}

impl EventLog for JsonlEventLog {
    fn record(&mut self, event: &WalletEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(&date))?;
        file.write_all(&line)?;
        Ok(())
    }
}
