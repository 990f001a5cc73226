// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory ledger with native balances, ERC-20 style tokens and
//! checkpoints.
//!
//! Registered token contracts understand `transfer`, `approve`,
//! `increaseAllowance`, `transferFrom` and `setApprovalForAll`. Any other
//! target accepts every call and only receives the attached value, unless
//! it was told to revert.

use std::collections::{HashMap, HashSet};

use alloy::primitives::{Address, Bytes, U256};

use super::{Checkpoint, Ledger, LedgerError};
use crate::abi;
use crate::models::{Asset, Call};

#[derive(Debug, Clone, Default)]
struct State {
    native: HashMap<Address, U256>,
    /// (token, holder) -> balance
    tokens: HashMap<(Address, Address), U256>,
    /// (token, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    /// (collection, owner, operator)
    operators: HashSet<(Address, Address, Address)>,
    /// Executed calls, in order.
    calls: Vec<(Address, Call)>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: State,
    snapshots: Vec<State>,
    token_contracts: HashSet<Address>,
    reverting: HashSet<Address>,
}

fn abi_true() -> Bytes {
    let mut word = [0u8; 32];
    word[31] = 1;
    Bytes::copy_from_slice(&word)
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of the native asset to `holder`.
    pub fn fund(&mut self, holder: Address, amount: U256) {
        let balance = self.state.native.entry(holder).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn register_token(&mut self, token: Address) {
        self.token_contracts.insert(token);
    }

    pub fn mint(&mut self, token: Address, holder: Address, amount: U256) {
        self.register_token(token);
        let balance = self.state.tokens.entry((token, holder)).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Every later call to `target` reverts.
    pub fn revert_calls_to(&mut self, target: Address) {
        self.reverting.insert(target);
    }

    pub fn balance(&self, holder: &Address) -> U256 {
        self.state.native.get(holder).copied().unwrap_or_default()
    }

    pub fn token_balance(&self, token: &Address, holder: &Address) -> U256 {
        self.state
            .tokens
            .get(&(*token, *holder))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> U256 {
        self.state
            .allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_approved_for_all(
        &self,
        collection: &Address,
        owner: &Address,
        operator: &Address,
    ) -> bool {
        self.state
            .operators
            .contains(&(*collection, *owner, *operator))
    }

    /// Calls that executed and were not rolled back.
    pub fn calls(&self) -> &[(Address, Call)] {
        &self.state.calls
    }

    fn move_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
        let available = self.balance(&from);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientBalance {
                    holder: from,
                    asset: Asset::Native,
                    available,
                    required: amount,
                })?;
        self.state.native.insert(from, remaining);
        self.fund(to, amount);
        Ok(())
    }

    fn move_token(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let available = self.token_balance(&token, &from);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientBalance {
                    holder: from,
                    asset: Asset::Token(token),
                    available,
                    required: amount,
                })?;
        self.state.tokens.insert((token, from), remaining);
        let balance = self.state.tokens.entry((token, to)).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    fn invoke_token(&mut self, wallet: Address, call: &Call) -> Result<Bytes, LedgerError> {
        let token = call.to;
        let data = &call.data;
        let malformed = || LedgerError::Reverted(format!("malformed calldata for {token}"));
        let address = |i| abi::address_argument(data, i).ok_or_else(malformed);
        let uint = |i| abi::uint_argument(data, i).ok_or_else(malformed);

        let selector = call.selector().ok_or_else(malformed)?;
        match selector {
            abi::TRANSFER => {
                self.move_token(token, wallet, address(0)?, uint(1)?)?;
                Ok(abi_true())
            }
            abi::APPROVE => {
                self.state
                    .allowances
                    .insert((token, wallet, address(0)?), uint(1)?);
                Ok(abi_true())
            }
            abi::INCREASE_ALLOWANCE => {
                let spender = address(0)?;
                let added = uint(1)?;
                let allowance = self.state.allowances.entry((token, wallet, spender)).or_default();
                *allowance = allowance.saturating_add(added);
                Ok(abi_true())
            }
            abi::TRANSFER_FROM => {
                let (from, to, amount) = (address(0)?, address(1)?, uint(2)?);
                let available = self.allowance(&token, &from, &wallet);
                let remaining = available.checked_sub(amount).ok_or(
                    LedgerError::InsufficientAllowance {
                        available,
                        required: amount,
                    },
                )?;
                self.move_token(token, from, to, amount)?;
                self.state.allowances.insert((token, from, wallet), remaining);
                Ok(abi_true())
            }
            abi::SET_APPROVAL_FOR_ALL => {
                let operator = address(0)?;
                if uint(1)?.is_zero() {
                    self.state.operators.remove(&(token, wallet, operator));
                } else {
                    self.state.operators.insert((token, wallet, operator));
                }
                Ok(Bytes::new())
            }
            other => Err(LedgerError::Reverted(format!(
                "{token} does not implement 0x{}",
                alloy::primitives::hex::encode(other)
            ))),
        }
    }
}

impl Ledger for MemoryLedger {
    fn checkpoint(&mut self) -> Checkpoint {
        self.snapshots.push(self.state.clone());
        self.snapshots.len() - 1
    }

    fn commit(&mut self, checkpoint: Checkpoint) -> Result<(), LedgerError> {
        if checkpoint >= self.snapshots.len() {
            return Err(LedgerError::UnknownCheckpoint(checkpoint));
        }
        self.snapshots.truncate(checkpoint);
        Ok(())
    }

    fn rollback(&mut self, checkpoint: Checkpoint) -> Result<(), LedgerError> {
        if checkpoint >= self.snapshots.len() {
            return Err(LedgerError::UnknownCheckpoint(checkpoint));
        }
        if let Some(snapshot) = self.snapshots.drain(checkpoint..).next() {
            self.state = snapshot;
        }
        Ok(())
    }

    fn invoke(&mut self, wallet: Address, call: &Call) -> Result<Bytes, LedgerError> {
        if self.reverting.contains(&call.to) {
            return Err(LedgerError::Reverted(format!("{} reverted", call.to)));
        }
        if !call.value.is_zero() {
            self.move_native(wallet, call.to, call.value)?;
        }
        let output = if self.token_contracts.contains(&call.to) && !call.data.is_empty() {
            self.invoke_token(wallet, call)?
        } else {
            Bytes::new()
        };
        self.state.calls.push((wallet, call.clone()));
        Ok(output)
    }

    fn transfer(
        &mut self,
        from: Address,
        asset: Asset,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        match asset {
            Asset::Native => self.move_native(from, to, amount),
            Asset::Token(token) => self.move_token(token, from, to, amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::IERC20;
    use alloy::sol_types::SolCall;

    fn wallet() -> Address {
        Address::repeat_byte(0xee)
    }

    fn token() -> Address {
        Address::repeat_byte(0x70)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    #[test]
    fn value_transfer_moves_native_balance() {
        let mut ledger = MemoryLedger::new();
        ledger.fund(wallet(), U256::from(10u64));
        ledger
            .invoke(wallet(), &Call::transfer(bob(), U256::from(4u64)))
            .unwrap();
        assert_eq!(ledger.balance(&wallet()), U256::from(6u64));
        assert_eq!(ledger.balance(&bob()), U256::from(4u64));
        assert_eq!(ledger.calls().len(), 1);
    }

    #[test]
    fn overdraft_fails() {
        let mut ledger = MemoryLedger::new();
        let err = ledger
            .invoke(wallet(), &Call::transfer(bob(), U256::from(1u64)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert!(ledger.calls().is_empty());
    }

    #[test]
    fn token_transfer_and_approve() {
        let mut ledger = MemoryLedger::new();
        ledger.mint(token(), wallet(), U256::from(100u64));

        let transfer = IERC20::transferCall {
            to: bob(),
            amount: U256::from(30u64),
        }
        .abi_encode();
        ledger.invoke(wallet(), &Call::contract(token(), transfer)).unwrap();
        assert_eq!(ledger.token_balance(&token(), &bob()), U256::from(30u64));

        let approve = IERC20::approveCall {
            spender: bob(),
            amount: U256::from(5u64),
        }
        .abi_encode();
        ledger.invoke(wallet(), &Call::contract(token(), approve)).unwrap();
        assert_eq!(ledger.allowance(&token(), &wallet(), &bob()), U256::from(5u64));

        let pull = IERC20::transferFromCall {
            from: wallet(),
            to: bob(),
            amount: U256::from(6u64),
        }
        .abi_encode();
        assert!(matches!(
            ledger.invoke(bob(), &Call::contract(token(), pull)),
            Err(LedgerError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn rollback_restores_state_and_call_log() {
        let mut ledger = MemoryLedger::new();
        ledger.fund(wallet(), U256::from(10u64));

        let checkpoint = ledger.checkpoint();
        ledger
            .invoke(wallet(), &Call::transfer(bob(), U256::from(4u64)))
            .unwrap();
        ledger.rollback(checkpoint).unwrap();

        assert_eq!(ledger.balance(&wallet()), U256::from(10u64));
        assert!(ledger.calls().is_empty());
        assert_eq!(
            ledger.rollback(checkpoint),
            Err(LedgerError::UnknownCheckpoint(checkpoint))
        );
    }

    #[test]
    fn nested_checkpoints() {
        let mut ledger = MemoryLedger::new();
        ledger.fund(wallet(), U256::from(10u64));

        let outer = ledger.checkpoint();
        ledger
            .transfer(wallet(), Asset::Native, bob(), U256::from(1u64))
            .unwrap();
        let inner = ledger.checkpoint();
        ledger
            .transfer(wallet(), Asset::Native, bob(), U256::from(2u64))
            .unwrap();
        ledger.commit(inner).unwrap();
        assert_eq!(ledger.balance(&bob()), U256::from(3u64));

        ledger.rollback(outer).unwrap();
        assert_eq!(ledger.balance(&bob()), U256::ZERO);
    }

    #[test]
    fn reverting_target() {
        let mut ledger = MemoryLedger::new();
        ledger.revert_calls_to(bob());
        assert!(matches!(
            ledger.invoke(wallet(), &Call::contract(bob(), vec![1, 2, 3, 4])),
            Err(LedgerError::Reverted(_))
        ));
    }

    #[test]
    fn unknown_token_selector_reverts() {
        let mut ledger = MemoryLedger::new();
        ledger.register_token(token());
        assert!(matches!(
            ledger.invoke(wallet(), &Call::contract(token(), vec![0xde, 0xad, 0xbe, 0xef])),
            Err(LedgerError::Reverted(_))
        ));
    }
}
