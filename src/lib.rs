// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Custody Guard - Authorization Core for Guarded Wallets
//!
//! Decides whether a relayed batch or security-state change is currently
//! permitted for a guardian-protected wallet, and applies it atomically.
//!
//! ## Modules
//!
//! - `engine` - relay pipeline and unsigned completions
//! - `signing` - signed payload, signature recovery and quorum rules
//! - `security` - per-wallet state (nonce, whitelist, session, guardians, lock, recovery)
//! - `authoriser` / `policy` - vetted targets and the per-call access gate
//! - `dispatch` / `ledger` - atomic batch execution and relayer refund
//! - `storage` - redb persistence and the event log
//! - `api` - HTTP API handlers (Axum)

pub mod abi;
pub mod api;
pub mod authoriser;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod models;
pub mod policy;
pub mod security;
pub mod signing;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
