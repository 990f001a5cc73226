// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Guardian set with a time-locked add/remove lifecycle.
//!
//! A request made at `t0` can be confirmed in
//! `[t0 + security_period, t0 + security_period + security_window)`.
//! Outside that window the request is either not mature yet or expired; an
//! expired request can simply be made again.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::models::{GuardianSigner, SignerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardianState {
    Pending,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianEntry {
    pub kind: SignerKind,
    pub state: GuardianState,
    pub requested_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGuardianChange {
    pub guardian: Address,
    pub kind: ChangeKind,
    pub requested_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationWindow {
    pub security_period: u64,
    pub security_window: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotMature,
    Open,
    Expired,
}

impl ConfirmationWindow {
    fn phase(&self, requested_at: u64, now: u64) -> Phase {
        let opens = requested_at.saturating_add(self.security_period);
        let closes = opens.saturating_add(self.security_window);
        if now < opens {
            Phase::NotMature
        } else if now < closes {
            Phase::Open
        } else {
            Phase::Expired
        }
    }

    fn check(&self, guardian: Address, requested_at: u64, now: u64) -> Result<(), WalletError> {
        match self.phase(requested_at, now) {
            Phase::NotMature => Err(WalletError::PendingNotMature(guardian)),
            Phase::Open => Ok(()),
            Phase::Expired => Err(WalletError::PendingExpired(guardian)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianRegistry {
    guardians: BTreeMap<Address, GuardianEntry>,
    /// guardian -> removal requested-at
    removals: BTreeMap<Address, u64>,
}

impl GuardianRegistry {
    pub fn get(&self, guardian: &Address) -> Option<&GuardianEntry> {
        self.guardians.get(guardian)
    }

    pub fn is_active(&self, guardian: &Address) -> bool {
        self.active_kind(guardian).is_some()
    }

    /// Signer kind of an active guardian.
    pub fn active_kind(&self, guardian: &Address) -> Option<SignerKind> {
        self.guardians
            .get(guardian)
            .filter(|entry| entry.state == GuardianState::Active)
            .map(|entry| entry.kind)
    }

    pub fn active(&self) -> impl Iterator<Item = Address> + '_ {
        self.guardians
            .iter()
            .filter(|(_, entry)| entry.state == GuardianState::Active)
            .map(|(addr, _)| *addr)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Pending addition or removal recorded for `guardian`, expired or not.
    pub fn pending_change(&self, guardian: &Address) -> Option<PendingGuardianChange> {
        if let Some(requested_at) = self.removals.get(guardian) {
            return Some(PendingGuardianChange {
                guardian: *guardian,
                kind: ChangeKind::Remove,
                requested_at: *requested_at,
            });
        }
        self.guardians
            .get(guardian)
            .filter(|entry| entry.state == GuardianState::Pending)
            .map(|entry| PendingGuardianChange {
                guardian: *guardian,
                kind: ChangeKind::Add,
                requested_at: entry.requested_at,
            })
    }

    pub fn pending_changes(&self) -> Vec<PendingGuardianChange> {
        // removals only ever target guardians still in the map
        self.guardians
            .keys()
            .filter_map(|guardian| self.pending_change(guardian))
            .collect()
    }

    /// Request the addition of `candidate`. The first guardian of a wallet
    /// becomes active immediately.
    pub fn add(
        &mut self,
        candidate: GuardianSigner,
        now: u64,
        window: &ConfirmationWindow,
    ) -> Result<GuardianState, WalletError> {
        if let Some(entry) = self.guardians.get(&candidate.address) {
            match entry.state {
                GuardianState::Active => {
                    return Err(WalletError::GuardianAlreadyActive(candidate.address))
                }
                GuardianState::Pending => {
                    if window.phase(entry.requested_at, now) != Phase::Expired {
                        return Err(WalletError::GuardianAlreadyPending(candidate.address));
                    }
                }
            }
        }

        let state = if self.active_count() == 0 {
            GuardianState::Active
        } else {
            GuardianState::Pending
        };
        self.guardians.insert(
            candidate.address,
            GuardianEntry {
                kind: candidate.kind,
                state,
                requested_at: now,
            },
        );
        Ok(state)
    }

    pub fn confirm_addition(
        &mut self,
        candidate: &Address,
        now: u64,
        window: &ConfirmationWindow,
    ) -> Result<(), WalletError> {
        let entry = self
            .guardians
            .get_mut(candidate)
            .ok_or(WalletError::NotPending(*candidate))?;
        if entry.state == GuardianState::Active {
            return Err(WalletError::GuardianAlreadyActive(*candidate));
        }
        window.check(*candidate, entry.requested_at, now)?;
        entry.state = GuardianState::Active;
        Ok(())
    }

    pub fn revoke_addition(&mut self, candidate: &Address) -> Result<(), WalletError> {
        match self.guardians.get(candidate) {
            Some(entry) if entry.state == GuardianState::Pending => {
                self.guardians.remove(candidate);
                Ok(())
            }
            _ => Err(WalletError::NotPending(*candidate)),
        }
    }

    pub fn request_removal(
        &mut self,
        guardian: &Address,
        now: u64,
        window: &ConfirmationWindow,
    ) -> Result<(), WalletError> {
        if !self.is_active(guardian) {
            return Err(WalletError::NotGuardian(*guardian));
        }
        if let Some(requested_at) = self.removals.get(guardian) {
            if window.phase(*requested_at, now) != Phase::Expired {
                return Err(WalletError::GuardianAlreadyPending(*guardian));
            }
        }
        self.removals.insert(*guardian, now);
        Ok(())
    }

    pub fn confirm_removal(
        &mut self,
        guardian: &Address,
        now: u64,
        window: &ConfirmationWindow,
    ) -> Result<(), WalletError> {
        let requested_at = *self
            .removals
            .get(guardian)
            .ok_or(WalletError::NotPending(*guardian))?;
        window.check(*guardian, requested_at, now)?;
        self.removals.remove(guardian);
        self.guardians.remove(guardian);
        Ok(())
    }

    pub fn revoke_removal(&mut self, guardian: &Address) -> Result<(), WalletError> {
        self.removals
            .remove(guardian)
            .map(|_| ())
            .ok_or(WalletError::NotPending(*guardian))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: ConfirmationWindow = ConfirmationWindow {
        security_period: 2,
        security_window: 2,
    };

    fn g(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    fn with_first_guardian() -> GuardianRegistry {
        let mut registry = GuardianRegistry::default();
        registry.add(GuardianSigner::direct(g(1)), 0, &WINDOW).unwrap();
        registry
    }

    #[test]
    fn first_guardian_is_active_immediately() {
        let registry = with_first_guardian();
        assert!(registry.is_active(&g(1)));
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.pending_change(&g(1)), None);
    }

    #[test]
    fn second_guardian_waits_for_confirmation_window() {
        let mut registry = with_first_guardian();
        let state = registry.add(GuardianSigner::direct(g(2)), 0, &WINDOW).unwrap();
        assert_eq!(state, GuardianState::Pending);
        assert_eq!(registry.active_count(), 1);

        assert_eq!(
            registry.confirm_addition(&g(2), 1, &WINDOW),
            Err(WalletError::PendingNotMature(g(2)))
        );
        registry.confirm_addition(&g(2), 2, &WINDOW).unwrap();
        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn confirmation_after_window_expires() {
        let mut registry = with_first_guardian();
        registry.add(GuardianSigner::direct(g(2)), 0, &WINDOW).unwrap();

        assert_eq!(
            registry.confirm_addition(&g(2), 4, &WINDOW),
            Err(WalletError::PendingExpired(g(2)))
        );
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn re_request_only_after_expiry() {
        let mut registry = with_first_guardian();
        registry.add(GuardianSigner::direct(g(2)), 0, &WINDOW).unwrap();

        assert_eq!(
            registry.add(GuardianSigner::direct(g(2)), 3, &WINDOW),
            Err(WalletError::GuardianAlreadyPending(g(2)))
        );
        registry.add(GuardianSigner::direct(g(2)), 4, &WINDOW).unwrap();
        assert_eq!(registry.pending_change(&g(2)).map(|c| c.requested_at), Some(4));
    }

    #[test]
    fn active_guardian_cannot_be_added_again() {
        let mut registry = with_first_guardian();
        assert_eq!(
            registry.add(GuardianSigner::direct(g(1)), 5, &WINDOW),
            Err(WalletError::GuardianAlreadyActive(g(1)))
        );
    }

    #[test]
    fn revoke_addition_drops_pending_entry() {
        let mut registry = with_first_guardian();
        registry.add(GuardianSigner::delegated(g(2)), 0, &WINDOW).unwrap();
        registry.revoke_addition(&g(2)).unwrap();
        assert!(registry.get(&g(2)).is_none());
        assert_eq!(registry.revoke_addition(&g(2)), Err(WalletError::NotPending(g(2))));
        assert_eq!(registry.revoke_addition(&g(1)), Err(WalletError::NotPending(g(1))));
    }

    #[test]
    fn removal_lifecycle() {
        let mut registry = with_first_guardian();
        assert_eq!(
            registry.request_removal(&g(9), 0, &WINDOW),
            Err(WalletError::NotGuardian(g(9)))
        );

        registry.request_removal(&g(1), 10, &WINDOW).unwrap();
        assert_eq!(
            registry.request_removal(&g(1), 11, &WINDOW),
            Err(WalletError::GuardianAlreadyPending(g(1)))
        );
        assert_eq!(
            registry.confirm_removal(&g(1), 11, &WINDOW),
            Err(WalletError::PendingNotMature(g(1)))
        );
        assert!(registry.is_active(&g(1)));

        registry.confirm_removal(&g(1), 12, &WINDOW).unwrap();
        assert_eq!(registry.active_count(), 0);
        assert_eq!(
            registry.confirm_removal(&g(1), 12, &WINDOW),
            Err(WalletError::NotPending(g(1)))
        );
    }

    #[test]
    fn revoked_removal_keeps_guardian() {
        let mut registry = with_first_guardian();
        registry.request_removal(&g(1), 0, &WINDOW).unwrap();
        registry.revoke_removal(&g(1)).unwrap();
        assert_eq!(
            registry.confirm_removal(&g(1), 2, &WINDOW),
            Err(WalletError::NotPending(g(1)))
        );
        assert!(registry.is_active(&g(1)));
        assert_eq!(registry.revoke_removal(&g(1)), Err(WalletError::NotPending(g(1))));
    }

    #[test]
    fn pending_changes_lists_both_kinds() {
        let mut registry = with_first_guardian();
        registry.add(GuardianSigner::direct(g(2)), 1, &WINDOW).unwrap();
        registry.request_removal(&g(1), 1, &WINDOW).unwrap();

        let changes = registry.pending_changes();
        assert_eq!(changes.len(), 2);
        assert!(changes
            .iter()
            .any(|c| c.guardian == g(1) && c.kind == ChangeKind::Remove));
        assert!(changes
            .iter()
            .any(|c| c.guardian == g(2) && c.kind == ChangeKind::Add));
    }
}
