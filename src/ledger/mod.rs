// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Value Movement
//!
//! The engine never executes calls itself. It drives a [`Ledger`]: the
//! environment that performs a sub-call on behalf of a wallet and moves
//! assets. Ledgers support nested checkpoints so a batch can be undone as a
//! whole.

pub mod memory;

use alloy::primitives::{Address, Bytes, U256};

use crate::models::{Asset, Call};

pub use memory::MemoryLedger;

/// Opaque checkpoint handle.
pub type Checkpoint = usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient {asset:?} balance for {holder}: have {available}, need {required}")]
    InsufficientBalance {
        holder: Address,
        asset: Asset,
        available: U256,
        required: U256,
    },

    #[error("insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance { available: U256, required: U256 },

    #[error("call reverted: {0}")]
    Reverted(String),

    #[error("unknown checkpoint {0}")]
    UnknownCheckpoint(Checkpoint),
}

pub trait Ledger {
    /// Open a checkpoint. Checkpoints nest.
    fn checkpoint(&mut self) -> Checkpoint;

    /// Keep every change made since `checkpoint`.
    fn commit(&mut self, checkpoint: Checkpoint) -> Result<(), LedgerError>;

    /// Undo every change made since `checkpoint`.
    fn rollback(&mut self, checkpoint: Checkpoint) -> Result<(), LedgerError>;

    /// Perform `call` from `wallet`, returning its output.
    fn invoke(&mut self, wallet: Address, call: &Call) -> Result<Bytes, LedgerError>;

    /// Move `amount` of `asset` from `from` to `to`.
    fn transfer(
        &mut self,
        from: Address,
        asset: Asset,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError>;
}

impl<T: Ledger + ?Sized> Ledger for Box<T> {
    fn checkpoint(&mut self) -> Checkpoint {
        (**self).checkpoint()
    }

    fn commit(&mut self, checkpoint: Checkpoint) -> Result<(), LedgerError> {
        (**self).commit(checkpoint)
    }

    fn rollback(&mut self, checkpoint: Checkpoint) -> Result<(), LedgerError> {
        (**self).rollback(checkpoint)
    }

    fn invoke(&mut self, wallet: Address, call: &Call) -> Result<Bytes, LedgerError> {
        (**self).invoke(wallet, call)
    }

    fn transfer(
        &mut self,
        from: Address,
        asset: Asset,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        (**self).transfer(from, asset, to, amount)
    }
}
