// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded security-state database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wallet_records`: wallet address (20 bytes) → serialized WalletRecord
//! - `authoriser_rules`: target address (20 bytes) → serialized AuthorisationRule
//!
//! Each save is its own write transaction, so a record is either fully
//! persisted or untouched.

use std::path::Path;

use alloy::primitives::Address;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;

use super::{SecurityStore, StorageError, StorageResult};
use crate::authoriser::AuthorisationRule;
use crate::security::WalletRecord;

// =============================================================================
// Table Definitions
// =============================================================================

/// Address-keyed table of JSON values.
type JsonTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

/// wallet address → WalletRecord (JSON bytes).
const WALLET_RECORDS: JsonTable = TableDefinition::new("wallet_records");

/// target address → AuthorisationRule (JSON bytes).
const AUTHORISER_RULES: JsonTable = TableDefinition::new("authoriser_rules");

// =============================================================================
// RedbStore
// =============================================================================

pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WALLET_RECORDS)?;
            let _ = write_txn.open_table(AUTHORISER_RULES)?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Opened security store");
        Ok(Self { db })
    }

    fn get<T: DeserializeOwned>(
        &self,
        table: JsonTable,
        key: &Address,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get(key.as_slice())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn put(
        &self,
        table: JsonTable,
        key: &Address,
        json: &[u8],
    ) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            table.insert(key.as_slice(), json)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl SecurityStore for RedbStore {
    fn load_wallet(&self, wallet: &Address) -> StorageResult<Option<WalletRecord>> {
        self.get(WALLET_RECORDS, wallet)
    }

    fn save_wallet(&mut self, record: &WalletRecord) -> StorageResult<()> {
        let json = serde_json::to_vec(record)?;
        self.put(WALLET_RECORDS, &record.wallet, &json)
    }

    fn wallets(&self) -> StorageResult<Vec<Address>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLET_RECORDS)?;
        let mut wallets = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            let address = Address::try_from(key.value())
                .map_err(|e| StorageError::Corrupt(format!("wallet key: {e}")))?;
            wallets.push(address);
        }
        Ok(wallets)
    }

    fn load_rules(&self) -> StorageResult<Vec<AuthorisationRule>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUTHORISER_RULES)?;
        let mut rules = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            rules.push(serde_json::from_slice(value.value())?);
        }
        Ok(rules)
    }

    fn save_rule(&mut self, rule: &AuthorisationRule) -> StorageResult<()> {
        let json = serde_json::to_vec(rule)?;
        self.put(AUTHORISER_RULES, &rule.target, &json)
    }

    fn delete_rule(&mut self, target: &Address) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(AUTHORISER_RULES)?;
            // bind before `table` drops; the guard borrows it
            let removed = table.remove(target.as_slice())?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

// =============================================================================
// Tests
// =============================================================================
