// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Time-locked whitelist of call targets.
//!
//! Adding a target weakens protection, so it only takes effect after the
//! security period. Removal strengthens it and is immediate.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhitelistRegistry {
    /// target -> trusted-at
    entries: BTreeMap<Address, u64>,
}

impl WhitelistRegistry {
    /// Stamp `target` with `now`. Returns `false` and keeps the original
    /// stamp when the target is already present.
    pub fn add(&mut self, target: Address, now: u64) -> bool {
        if self.entries.contains_key(&target) {
            return false;
        }
        self.entries.insert(target, now);
        true
    }

    pub fn remove(&mut self, target: &Address) -> bool {
        self.entries.remove(target).is_some()
    }

    pub fn trusted_at(&self, target: &Address) -> Option<u64> {
        self.entries.get(target).copied()
    }

    pub fn is_whitelisted(&self, target: &Address, now: u64, security_period: u64) -> bool {
        self.trusted_at(target)
            .is_some_and(|at| now >= at.saturating_add(security_period))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: u64 = 2;

    fn target() -> Address {
        Address::repeat_byte(0xaa)
    }

    #[test]
    fn entry_matures_after_security_period() {
        let mut list = WhitelistRegistry::default();
        assert!(list.add(target(), 0));

        assert!(!list.is_whitelisted(&target(), 1, PERIOD));
        assert!(list.is_whitelisted(&target(), 2, PERIOD));
        assert!(list.is_whitelisted(&target(), 3, PERIOD));
    }

    #[test]
    fn removal_is_immediate() {
        let mut list = WhitelistRegistry::default();
        list.add(target(), 0);
        assert!(list.remove(&target()));

        assert!(!list.is_whitelisted(&target(), 3, PERIOD));
        assert_eq!(list.trusted_at(&target()), None);
        assert!(!list.remove(&target()));
    }

    #[test]
    fn re_adding_keeps_original_stamp() {
        let mut list = WhitelistRegistry::default();
        list.add(target(), 5);
        assert!(!list.add(target(), 9));
        assert_eq!(list.trusted_at(&target()), Some(5));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn re_adding_after_removal_restarts_the_clock() {
        let mut list = WhitelistRegistry::default();
        list.add(target(), 0);
        list.remove(&target());
        list.add(target(), 10);
        assert!(!list.is_whitelisted(&target(), 11, PERIOD));
        assert!(list.is_whitelisted(&target(), 12, PERIOD));
    }
}
