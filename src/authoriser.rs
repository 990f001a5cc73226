// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide allow-list of vetted call targets.
//!
//! A rule lets any wallet call its target without whitelisting it first.
//! Rules for contracts that hand out spending rights carry a
//! [`SpenderRule`]: the grantee pulled out of the calldata must itself be a
//! vetted target.

use std::collections::BTreeMap;

use alloy::primitives::{Address, FixedBytes};
use serde::{Deserialize, Serialize};

use crate::abi;
use crate::error::WalletError;
use crate::models::Call;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpenderRule {
    /// ERC-20 `approve`/`increaseAllowance` and ERC-721/1155
    /// `setApprovalForAll`.
    Approvals,
    /// Calls with `selector` carry the spender as ABI address argument
    /// `argument`.
    Selector {
        selector: FixedBytes<4>,
        argument: usize,
    },
}

impl SpenderRule {
    /// Spender granted by `data`, `Ok(None)` when the call is not
    /// approval-shaped.
    fn extract(&self, target: Address, data: &[u8]) -> Result<Option<Address>, WalletError> {
        let Some(selector) = data.get(..4).and_then(|s| <[u8; 4]>::try_from(s).ok()) else {
            return Ok(None);
        };
        let argument = match self {
            SpenderRule::Approvals if abi::is_approval(&selector) => 0,
            SpenderRule::Selector { selector: wanted, argument } if wanted.0 == selector => {
                *argument
            }
            _ => return Ok(None),
        };
        abi::address_argument(data, argument)
            .map(Some)
            .ok_or(WalletError::NotAuthorised(target))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorisationRule {
    pub target: Address,
    #[serde(default)]
    pub spender_rule: Option<SpenderRule>,
}

impl AuthorisationRule {
    pub fn target(target: Address) -> Self {
        Self {
            target,
            spender_rule: None,
        }
    }

    pub fn with_approvals(target: Address) -> Self {
        Self {
            target,
            spender_rule: Some(SpenderRule::Approvals),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authoriser {
    rules: BTreeMap<Address, AuthorisationRule>,
}

impl Authoriser {
    pub fn from_rules(rules: impl IntoIterator<Item = AuthorisationRule>) -> Self {
        Self {
            rules: rules.into_iter().map(|rule| (rule.target, rule)).collect(),
        }
    }

    /// Insert or replace the rule for `rule.target`.
    pub fn add_rule(&mut self, rule: AuthorisationRule) {
        self.rules.insert(rule.target, rule);
    }

    pub fn remove_rule(&mut self, target: &Address) -> Option<AuthorisationRule> {
        self.rules.remove(target)
    }

    pub fn rule(&self, target: &Address) -> Option<&AuthorisationRule> {
        self.rules.get(target)
    }

    pub fn rules(&self) -> impl Iterator<Item = &AuthorisationRule> {
        self.rules.values()
    }

    pub fn is_authorised(&self, target: &Address) -> bool {
        self.rules.contains_key(target)
    }

    /// Whether `call` is vetted: its target holds a rule and, for
    /// approval-shaped calldata, the granted spender holds one too.
    pub fn check(&self, call: &Call) -> Result<(), WalletError> {
        let rule = self
            .rules
            .get(&call.to)
            .ok_or(WalletError::NotAuthorised(call.to))?;

        if let Some(spender_rule) = &rule.spender_rule {
            if let Some(spender) = spender_rule.extract(call.to, &call.data)? {
                if !self.is_authorised(&spender) {
                    return Err(WalletError::SpenderNotAuthorised {
                        target: call.to,
                        spender,
                    });
                }
            }
        }
        Ok(())
    }
}
