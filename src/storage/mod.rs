// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Security State Storage
//!
//! The engine persists two things: one [`WalletRecord`] per wallet and the
//! process-wide authoriser table. Both go through the [`SecurityStore`]
//! key/value abstraction so the engine never sees the backing store.
//!
//! ## Backends
//!
//! - [`MemoryStore`] - tests and throwaway deployments
//! - [`RedbStore`] - embedded ACID database (redb), one JSON value per key
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   custody.redb
//!     wallet_records:   wallet address (20 bytes) → WalletRecord JSON
//!     authoriser_rules: target address (20 bytes) → AuthorisationRule JSON
//!   events/
//!     events-{date}.jsonl   # Daily event logs
//! ```

pub mod audit;
pub mod database;
pub mod memory;

use alloy::primitives::Address;

use crate::authoriser::AuthorisationRule;
use crate::security::WalletRecord;

pub use audit::{EventKind, EventLog, JsonlEventLog, MemoryEventLog, WalletEvent};
pub use database::RedbStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt entry: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key/value persistence for wallet records and authoriser rules.
pub trait SecurityStore {
    fn load_wallet(&self, wallet: &Address) -> StorageResult<Option<WalletRecord>>;

    /// Insert or replace the record for `record.wallet`.
    fn save_wallet(&mut self, record: &WalletRecord) -> StorageResult<()>;

    fn wallets(&self) -> StorageResult<Vec<Address>>;

    fn load_rules(&self) -> StorageResult<Vec<AuthorisationRule>>;

    fn save_rule(&mut self, rule: &AuthorisationRule) -> StorageResult<()>;

    /// Returns `false` when no rule existed.
    fn delete_rule(&mut self, target: &Address) -> StorageResult<bool>;
}

impl<T: SecurityStore + ?Sized> SecurityStore for Box<T> {
    fn load_wallet(&self, wallet: &Address) -> StorageResult<Option<WalletRecord>> {
        (**self).load_wallet(wallet)
    }

    fn save_wallet(&mut self, record: &WalletRecord) -> StorageResult<()> {
        (**self).save_wallet(record)
    }

    fn wallets(&self) -> StorageResult<Vec<Address>> {
        (**self).wallets()
    }

    fn load_rules(&self) -> StorageResult<Vec<AuthorisationRule>> {
        (**self).load_rules()
    }

    fn save_rule(&mut self, rule: &AuthorisationRule) -> StorageResult<()> {
        (**self).save_rule(rule)
    }

    fn delete_rule(&mut self, target: &Address) -> StorageResult<bool> {
        (**self).delete_rule(target)
    }
}
