// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Joint whitelist/authoriser gate applied to each sub-call.

use alloy::primitives::Address;

use crate::abi;
use crate::authoriser::Authoriser;
use crate::error::WalletError;
use crate::models::Call;
use crate::security::{WalletRecord, WhitelistRegistry};

/// Which relay path is asking; decides how a denial is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Owner-only plain batch without the guardian quorum.
    Owner,
    Whitelist,
    Session,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenial {
    /// The effective spender is neither whitelisted nor vetted.
    Unvetted { target: Address, spender: Address },
    /// Vetted target, but the spender granted by the calldata is not.
    Spender { target: Address, spender: Address },
    /// `spender_in_data` set on calldata without an address argument.
    MissingSpender(Address),
    /// Native value attached to a call whose spender comes from calldata.
    ValueWithDataSpender(Address),
}

impl AccessDenial {
    pub fn into_error(self, gate: Gate) -> WalletError {
        match (gate, self) {
            (_, AccessDenial::MissingSpender(target)) => WalletError::InvalidTarget(target),
            (Gate::Session, AccessDenial::ValueWithDataSpender(target)) => {
                WalletError::SessionScopeViolation(format!("send value to {target}"))
            }
            (Gate::Owner, AccessDenial::ValueWithDataSpender(target)) => {
                WalletError::NotAuthorised(target)
            }
            (Gate::Whitelist, AccessDenial::ValueWithDataSpender(target)) => {
                WalletError::NotWhitelisted(target)
            }
            (Gate::Session, AccessDenial::Unvetted { spender, .. }) => {
                WalletError::SessionScopeViolation(format!("call unvetted target {spender}"))
            }
            (Gate::Session, AccessDenial::Spender { spender, .. }) => {
                WalletError::SessionScopeViolation(format!("grant spending rights to {spender}"))
            }
            (_, AccessDenial::Spender { target, spender }) => {
                WalletError::SpenderNotAuthorised { target, spender }
            }
            (Gate::Owner, AccessDenial::Unvetted { spender, .. }) => {
                WalletError::NotAuthorised(spender)
            }
            (Gate::Whitelist, AccessDenial::Unvetted { spender, .. }) => {
                WalletError::NotWhitelisted(spender)
            }
        }
    }
}

pub struct AccessPolicy<'a> {
    whitelist: &'a WhitelistRegistry,
    authoriser: &'a Authoriser,
    now: u64,
    security_period: u64,
}

impl<'a> AccessPolicy<'a> {
    pub fn new(
        record: &'a WalletRecord,
        authoriser: &'a Authoriser,
        now: u64,
        security_period: u64,
    ) -> Self {
        Self {
            whitelist: &record.whitelist,
            authoriser,
            now,
            security_period,
        }
    }

    /// The party a call actually pays or empowers.
    pub fn effective_spender(call: &Call) -> Result<Address, AccessDenial> {
        if !call.spender_in_data {
            return Ok(call.to);
        }
        abi::address_argument(&call.data, 0).ok_or(AccessDenial::MissingSpender(call.to))
    }

    pub fn check(&self, call: &Call) -> Result<(), AccessDenial> {
        // Value is paid to `to`, which a calldata spender check never vets.
        if call.spender_in_data && !call.value.is_zero() {
            return Err(AccessDenial::ValueWithDataSpender(call.to));
        }
        let spender = Self::effective_spender(call)?;
        if self
            .whitelist
            .is_whitelisted(&spender, self.now, self.security_period)
        {
            return Ok(());
        }

        match self.authoriser.check(call) {
            Ok(()) if spender == call.to || self.authoriser.is_authorised(&spender) => Ok(()),
            Err(WalletError::SpenderNotAuthorised { target, spender }) => {
                Err(AccessDenial::Spender { target, spender })
            }
            _ => Err(AccessDenial::Unvetted {
                target: call.to,
                spender,
            }),
        }
    }

    /// Check every call, reporting the first denial through `gate`.
    pub fn check_all(&self, calls: &[Call], gate: Gate) -> Result<(), WalletError> {
        for call in calls {
            self.check(call).map_err(|denial| denial.into_error(gate))?;
        }
        Ok(())
    }
}
