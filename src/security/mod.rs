// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Per-Wallet Security State
//!
//! Everything the engine knows about one wallet lives in a single
//! [`WalletRecord`]: owner, nonce, lock, guardians, whitelist, session and
//! recovery. The engine loads the record at the start of a request, hands it
//! by `&mut` to each component and persists it once at the end.
//!
//! ## Components
//!
//! - [`nonce`] - replay protection
//! - [`whitelist`] - time-locked trusted targets
//! - [`session`] - ephemeral delegated signer
//! - [`guardians`] - guardian set and its add/remove lifecycle
//! - [`lock`] - temporary freeze
//! - [`recovery`] - guardian-driven ownership transfer

pub mod guardians;
pub mod lock;
pub mod nonce;
pub mod recovery;
pub mod session;
pub mod whitelist;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::models::GuardianSigner;

pub use guardians::{
    ChangeKind, ConfirmationWindow, GuardianEntry, GuardianRegistry, GuardianState,
    PendingGuardianChange,
};
pub use lock::{LockHolder, WalletLock};
pub use nonce::NonceTracker;
pub use recovery::{PendingRecovery, RecoveryState};
pub use session::{SessionKey, SessionKeyManager};
pub use whitelist::WhitelistRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub wallet: Address,
    pub owner: Address,
    pub created_at: u64,
    #[serde(default)]
    pub nonce: NonceTracker,
    #[serde(default)]
    pub lock: WalletLock,
    #[serde(default)]
    pub guardians: GuardianRegistry,
    #[serde(default)]
    pub whitelist: WhitelistRegistry,
    #[serde(default)]
    pub session: SessionKeyManager,
    #[serde(default)]
    pub recovery: PendingRecovery,
}

impl WalletRecord {
    pub fn new(wallet: Address, owner: Address, now: u64) -> Self {
        Self {
            wallet,
            owner,
            created_at: now,
            nonce: NonceTracker::default(),
            lock: WalletLock::default(),
            guardians: GuardianRegistry::default(),
            whitelist: WhitelistRegistry::default(),
            session: SessionKeyManager::default(),
            recovery: PendingRecovery::default(),
        }
    }

    /// Owner request to add a guardian. The owner and the wallet itself can
    /// never guard the wallet.
    pub fn add_guardian(
        &mut self,
        candidate: GuardianSigner,
        now: u64,
        window: &ConfirmationWindow,
    ) -> Result<GuardianState, WalletError> {
        let address = candidate.address;
        if address.is_zero() || address == self.owner || address == self.wallet {
            return Err(WalletError::InvalidGuardian(address));
        }
        self.guardians.add(candidate, now, window)
    }

    /// Returns `false` when the target was already whitelisted.
    pub fn add_to_whitelist(&mut self, target: Address, now: u64) -> Result<bool, WalletError> {
        if target.is_zero() || target == self.wallet {
            return Err(WalletError::InvalidTarget(target));
        }
        Ok(self.whitelist.add(target, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: ConfirmationWindow = ConfirmationWindow {
        security_period: 2,
        security_window: 2,
    };

    fn record() -> WalletRecord {
        WalletRecord::new(Address::repeat_byte(0xee), Address::repeat_byte(0x01), 7)
    }

    #[test]
    fn owner_and_wallet_cannot_be_guardians() {
        let mut wallet = record();
        let owner = wallet.owner;
        let self_address = wallet.wallet;
        assert_eq!(
            wallet.add_guardian(GuardianSigner::direct(owner), 0, &WINDOW),
            Err(WalletError::InvalidGuardian(owner))
        );
        assert_eq!(
            wallet.add_guardian(GuardianSigner::direct(self_address), 0, &WINDOW),
            Err(WalletError::InvalidGuardian(self_address))
        );
        assert_eq!(wallet.guardians.active_count(), 0);
    }

    #[test]
    fn wallet_cannot_whitelist_itself() {
        let mut wallet = record();
        let self_address = wallet.wallet;
        assert_eq!(
            wallet.add_to_whitelist(self_address, 0),
            Err(WalletError::InvalidTarget(self_address))
        );
        assert!(wallet.add_to_whitelist(Address::repeat_byte(0xaa), 0).unwrap());
        assert!(!wallet.add_to_whitelist(Address::repeat_byte(0xaa), 1).unwrap());
    }

    #[test]
    fn record_survives_json_round_trip() {
        let mut wallet = record();
        wallet
            .add_guardian(GuardianSigner::direct(Address::repeat_byte(0x02)), 0, &WINDOW)
            .unwrap();
        wallet.add_to_whitelist(Address::repeat_byte(0xaa), 3).unwrap();
        wallet.session.create_or_refresh(Address::repeat_byte(0x5e), 99);
        wallet.nonce.validate_and_consume(1).unwrap();
        wallet.lock(0, 5).unwrap();

        let json = serde_json::to_vec(&wallet).unwrap();
        let back: WalletRecord = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, wallet);
    }
}
