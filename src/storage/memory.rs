// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::{BTreeMap, HashMap};

use alloy::primitives::Address;

use super::{SecurityStore, StorageResult};
use crate::authoriser::AuthorisationRule;
use crate::security::WalletRecord;

/// Volatile store; everything is lost on drop.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    wallets: HashMap<Address, WalletRecord>,
    rules: BTreeMap<Address, AuthorisationRule>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecurityStore for MemoryStore {
    fn load_wallet(&self, wallet: &Address) -> StorageResult<Option<WalletRecord>> {
        Ok(self.wallets.get(wallet).cloned())
    }

    fn save_wallet(&mut self, record: &WalletRecord) -> StorageResult<()> {
        self.wallets.insert(record.wallet, record.clone());
        Ok(())
    }

    fn wallets(&self) -> StorageResult<Vec<Address>> {
        let mut wallets: Vec<_> = self.wallets.keys().copied().collect();
        wallets.sort();
        Ok(wallets)
    }

    fn load_rules(&self) -> StorageResult<Vec<AuthorisationRule>> {
        Ok(self.rules.values().cloned().collect())
    }

    fn save_rule(&mut self, rule: &AuthorisationRule) -> StorageResult<()> {
        self.rules.insert(rule.target, rule.clone());
        Ok(())
    }

    fn delete_rule(&mut self, target: &Address) -> StorageResult<bool> {
        Ok(self.rules.remove(target).is_some())
    }
}
