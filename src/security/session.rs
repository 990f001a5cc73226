// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ephemeral delegated signer.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionKey {
    pub key: Address,
    /// Expiry timestamp; 0 means revoked.
    pub expires: u64,
}

/// At most one session per wallet. Creating a session overwrites the
/// previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKeyManager {
    session: Option<SessionKey>,
}

impl SessionKeyManager {
    /// Install `key` until `expires`. The zero key clears the session;
    /// `expires == 0` keeps the key on record but revokes it.
    pub fn create_or_refresh(&mut self, key: Address, expires: u64) {
        if key.is_zero() {
            self.session = None;
        } else {
            self.session = Some(SessionKey { key, expires });
        }
    }

    pub fn clear(&mut self) {
        self.session = None;
    }

    pub fn current(&self) -> Option<&SessionKey> {
        self.session.as_ref()
    }

    /// Whether `signer` is the recorded session key, expired or not.
    pub fn is_session_key(&self, signer: &Address) -> bool {
        self.session.is_some_and(|s| s.key == *signer)
    }

    pub fn is_session_valid(&self, key: &Address, now: u64) -> bool {
        self.session
            .is_some_and(|s| s.key == *key && s.expires != 0 && now < s.expires)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Address {
        Address::repeat_byte(0x5e)
    }

    #[test]
    fn session_valid_until_expiry() {
        let mut sessions = SessionKeyManager::default();
        sessions.create_or_refresh(key(), 100);

        assert!(sessions.is_session_valid(&key(), 99));
        assert!(!sessions.is_session_valid(&key(), 100));
        assert!(!sessions.is_session_valid(&Address::repeat_byte(0x01), 50));
        assert!(sessions.is_session_key(&key()));
    }

    #[test]
    fn zero_expiry_revokes() {
        let mut sessions = SessionKeyManager::default();
        sessions.create_or_refresh(key(), 100);
        sessions.create_or_refresh(key(), 0);
        assert!(!sessions.is_session_valid(&key(), 1));
        assert!(sessions.is_session_key(&key()));
    }

    #[test]
    fn new_session_overwrites_and_zero_key_clears() {
        let mut sessions = SessionKeyManager::default();
        sessions.create_or_refresh(key(), 100);
        let other = Address::repeat_byte(0x77);
        sessions.create_or_refresh(other, 200);
        assert!(!sessions.is_session_key(&key()));
        assert_eq!(sessions.current().map(|s| s.key), Some(other));

        sessions.create_or_refresh(Address::ZERO, 300);
        assert!(sessions.current().is_none());
    }
}
