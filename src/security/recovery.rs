// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Guardian-driven social recovery.
//!
//! ```text
//! None ──execute──▶ Pending ──finalize (after recovery period)──▶ Finalized
//!                     │
//!                     └──cancel──▶ Cancelled
//! ```
//!
//! `None`, `Finalized` and `Cancelled` all admit a new recovery. A pending
//! recovery keeps the wallet locked.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use super::lock::LockHolder;
use super::WalletRecord;
use crate::error::WalletError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryState {
    #[default]
    None,
    Pending,
    Finalized,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRecovery {
    pub state: RecoveryState,
    pub new_owner: Address,
    pub initiated_at: u64,
}

impl PendingRecovery {
    pub fn is_pending(&self) -> bool {
        self.state == RecoveryState::Pending
    }

    pub fn ready_at(&self, recovery_period: u64) -> u64 {
        self.initiated_at.saturating_add(recovery_period)
    }
}

impl WalletRecord {
    /// Reject owners that would collapse roles: zero, the current owner, a
    /// guardian, or the wallet itself.
    pub fn check_new_owner(&self, new_owner: &Address) -> Result<(), WalletError> {
        if new_owner.is_zero()
            || *new_owner == self.owner
            || *new_owner == self.wallet
            || self.guardians.get(new_owner).is_some()
        {
            return Err(WalletError::InvalidOwner(*new_owner));
        }
        Ok(())
    }

    /// Start a recovery towards `new_owner` and lock the wallet until it
    /// can be finalized.
    pub fn execute_recovery(
        &mut self,
        new_owner: Address,
        now: u64,
        recovery_period: u64,
    ) -> Result<(), WalletError> {
        if self.recovery.is_pending() {
            return Err(WalletError::RecoveryAlreadyPending);
        }
        self.check_new_owner(&new_owner)?;

        self.recovery = PendingRecovery {
            state: RecoveryState::Pending,
            new_owner,
            initiated_at: now,
        };
        self.lock
            .set(now.saturating_add(recovery_period), LockHolder::Recovery);
        Ok(())
    }

    pub fn cancel_recovery(&mut self) -> Result<(), WalletError> {
        if !self.recovery.is_pending() {
            return Err(WalletError::RecoveryNotPending);
        }
        self.recovery.state = RecoveryState::Cancelled;
        self.lock.release();
        Ok(())
    }

    /// Hand the wallet to the recovered owner. Returns the new owner.
    pub fn finalize_recovery(
        &mut self,
        now: u64,
        recovery_period: u64,
    ) -> Result<Address, WalletError> {
        if !self.recovery.is_pending() {
            return Err(WalletError::RecoveryNotPending);
        }
        let ready_at = self.recovery.ready_at(recovery_period);
        if now < ready_at {
            return Err(WalletError::RecoveryNotYetMature { ready_at });
        }

        self.owner = self.recovery.new_owner;
        self.recovery.state = RecoveryState::Finalized;
        self.lock.release();
        self.session.clear();
        Ok(self.owner)
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) -> Result<(), WalletError> {
        self.check_new_owner(&new_owner)?;
        self.owner = new_owner;
        Ok(())
    }
}
