// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Temporary wallet freeze.
//!
//! A wallet is locked while its lock-until timestamp lies in the future or
//! while a recovery is pending. Guardians lock and unlock; a recovery owns
//! its lock until it is cancelled or finalized.

use serde::{Deserialize, Serialize};

use super::WalletRecord;
use crate::error::WalletError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockHolder {
    Guardian,
    Recovery,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletLock {
    /// 0 when unlocked.
    until: u64,
    holder: Option<LockHolder>,
}

impl WalletLock {
    pub fn until(&self) -> u64 {
        self.until
    }

    pub fn holder(&self) -> Option<LockHolder> {
        self.holder
    }

    pub fn is_active(&self, now: u64) -> bool {
        now < self.until
    }

    pub(crate) fn set(&mut self, until: u64, holder: LockHolder) {
        self.until = until;
        self.holder = Some(holder);
    }

    pub(crate) fn release(&mut self) {
        self.until = 0;
        self.holder = None;
    }
}

impl WalletRecord {
    pub fn is_locked(&self, now: u64) -> bool {
        self.recovery.is_pending() || self.lock.is_active(now)
    }

    pub fn ensure_unlocked(&self, now: u64) -> Result<(), WalletError> {
        if self.is_locked(now) {
            return Err(WalletError::WalletLocked);
        }
        Ok(())
    }

    /// Guardian lock for `lock_period` seconds. Returns the lock-until time.
    pub fn lock(&mut self, now: u64, lock_period: u64) -> Result<u64, WalletError> {
        self.ensure_unlocked(now)?;
        let until = now.saturating_add(lock_period);
        self.lock.set(until, LockHolder::Guardian);
        Ok(until)
    }

    pub fn unlock(&mut self, now: u64) -> Result<(), WalletError> {
        if self.recovery.is_pending() {
            return Err(WalletError::LockedByRecovery);
        }
        if !self.lock.is_active(now) {
            return Err(WalletError::NotLocked);
        }
        self.lock.release();
        Ok(())
    }
}
