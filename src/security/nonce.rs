// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Replay protection.

use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Last consumed nonce of a wallet. A fresh wallet accepts nonce 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonceTracker {
    last: u64,
}

impl NonceTracker {
    pub fn current(&self) -> u64 {
        self.last
    }

    /// The only nonce the next request may carry.
    pub fn expected(&self) -> Option<u64> {
        self.last.checked_add(1)
    }

    /// Accept `provided` iff it is exactly one past the stored value, then
    /// store it.
    pub fn validate_and_consume(&mut self, provided: u64) -> Result<(), WalletError> {
        match self.expected() {
            Some(expected) if expected == provided => {
                self.last = provided;
                Ok(())
            }
            expected => Err(WalletError::InvalidNonce {
                expected: expected.unwrap_or(u64::MAX),
                provided,
            }),
        }
    }
}
