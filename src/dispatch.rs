// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Atomic batch execution and relayer refund.

use alloy::primitives::{Address, Bytes, U256};

use crate::error::WalletError;
use crate::ledger::Ledger;
use crate::models::{Asset, Call, RefundPaid, RefundTerms};

/// Refund owed to the relayer for one accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundOrder {
    pub asset: Asset,
    pub amount: U256,
    pub recipient: Address,
}

impl RefundOrder {
    /// `min(requested, cap)` to the signed recipient, or to the relayer.
    /// `None` when nothing is owed.
    pub fn bounded(terms: &RefundTerms, requested: U256, relayer: Address) -> Option<Self> {
        let amount = requested.min(terms.cap);
        if amount.is_zero() {
            return None;
        }
        Some(Self {
            asset: terms.asset,
            amount,
            recipient: terms.recipient.unwrap_or(relayer),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub results: Vec<Bytes>,
    pub refund: Option<RefundPaid>,
}

pub struct CallDispatcher<'a, L: ?Sized> {
    ledger: &'a mut L,
}

impl<'a, L: Ledger + ?Sized> CallDispatcher<'a, L> {
    pub fn new(ledger: &'a mut L) -> Self {
        Self { ledger }
    }

    /// Run `calls` in order from `wallet`, then pay `refund`. Either
    /// everything happens or nothing does.
    pub fn execute(
        &mut self,
        wallet: Address,
        calls: &[Call],
        refund: Option<RefundOrder>,
    ) -> Result<DispatchOutcome, WalletError> {
        let checkpoint = self.ledger.checkpoint();
        match self.run(wallet, calls, refund) {
            Ok(outcome) => {
                self.ledger
                    .commit(checkpoint)
                    .map_err(|e| WalletError::Storage(e.to_string()))?;
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback) = self.ledger.rollback(checkpoint) {
                    tracing::error!(error = %rollback, wallet = %wallet, "Ledger rollback failed");
                }
                Err(err)
            }
        }
    }

    fn run(
        &mut self,
        wallet: Address,
        calls: &[Call],
        refund: Option<RefundOrder>,
    ) -> Result<DispatchOutcome, WalletError> {
        let mut results = Vec::with_capacity(calls.len());
        for (index, call) in calls.iter().enumerate() {
            let output = self
                .ledger
                .invoke(wallet, call)
                .map_err(|e| WalletError::CallFailed {
                    index,
                    reason: e.to_string(),
                })?;
            results.push(output);
        }

        let refund = match refund {
            Some(order) => {
                self.ledger
                    .transfer(wallet, order.asset, order.recipient, order.amount)
                    .map_err(|e| WalletError::RefundFailed(e.to_string()))?;
                Some(RefundPaid {
                    asset: order.asset,
                    amount: order.amount,
                    recipient: order.recipient,
                })
            }
            None => None,
        };

        Ok(DispatchOutcome { results, refund })
    }
}
