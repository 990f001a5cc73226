// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use k256::ecdsa::SigningKey;

use crate::clock::ManualClock;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::WalletError;
use crate::ledger::MemoryLedger;
use crate::models::{
    CallKind, GuardianSigner, RefundTerms, RelayReceipt, RelayRequest, SecurityChange,
    SignerSignature,
};
use crate::signing::address_of;
use crate::storage::{MemoryEventLog, MemoryStore};

/// Deterministic secp256k1 key.
pub struct TestKey {
    key: SigningKey,
}

impl TestKey {
    pub fn new(seed: u8) -> Self {
        Self {
            key: SigningKey::from_slice(&[seed; 32]).expect("valid scalar"),
        }
    }

    pub fn address(&self) -> Address {
        address_of(self.key.verifying_key())
    }

    /// 65-byte `r || s || v` signature with `v` in {27, 28}.
    pub fn sign(&self, digest: &B256) -> Vec<u8> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_slice())
            .expect("signing succeeds");
        let mut out = signature.to_bytes().to_vec();
        out.push(recovery_id.to_byte() + 27);
        out
    }
}

/// Signatures of `keys` over `digest`, sorted by signer.
pub fn sign(digest: &B256, keys: &[&TestKey]) -> Vec<SignerSignature> {
    let mut signatures: Vec<_> = keys
        .iter()
        .map(|key| SignerSignature {
            signer: key.address(),
            signature: key.sign(digest).into(),
        })
        .collect();
    signatures.sort_by_key(|s| s.signer);
    signatures
}

pub fn relayer() -> Address {
    Address::repeat_byte(0x4e)
}

/// Unsigned request with no refund.
pub fn request(wallet: Address, nonce: u64, kind: CallKind) -> RelayRequest {
    RelayRequest {
        wallet,
        nonce,
        kind,
        refund: RefundTerms::default(),
        relayer: relayer(),
        refund_amount: U256::ZERO,
        signatures: Vec::new(),
    }
}

pub type TestEngine = Engine<MemoryStore, MemoryLedger>;

/// One registered wallet on an in-memory engine with 2-second periods.
pub struct Harness {
    pub engine: TestEngine,
    pub clock: Arc<ManualClock>,
    pub events: MemoryEventLog,
    pub owner: TestKey,
    pub guardians: Vec<TestKey>,
    pub wallet: Address,
}

impl Harness {
    pub const FUNDING: u64 = 1_000;

    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(0));
        let events = MemoryEventLog::new();
        let mut ledger = MemoryLedger::new();
        let wallet = Address::repeat_byte(0xee);
        ledger.fund(wallet, U256::from(Self::FUNDING));

        let mut engine = Engine::new(
            EngineConfig::for_testing(),
            MemoryStore::new(),
            ledger,
            clock.clone(),
        )
        .expect("engine starts")
        .with_event_log(events.clone());

        let owner = TestKey::new(1);
        engine
            .register_wallet(wallet, owner.address())
            .expect("wallet registers");

        Self {
            engine,
            clock,
            events,
            owner,
            guardians: Vec::new(),
            wallet,
        }
    }

    pub fn next_nonce(&self) -> u64 {
        self.engine.nonce(&self.wallet).expect("wallet exists") + 1
    }

    pub fn signed(&self, nonce: u64, kind: CallKind, signers: &[&TestKey]) -> RelayRequest {
        let mut request = request(self.wallet, nonce, kind);
        request.signatures = sign(&self.engine.digest(&request), signers);
        request
    }

    pub fn relay(
        &mut self,
        kind: CallKind,
        signers: &[&TestKey],
    ) -> Result<RelayReceipt, WalletError> {
        let request = self.signed(self.next_nonce(), kind, signers);
        self.engine.relay(request)
    }

    pub fn change(
        &mut self,
        change: SecurityChange,
        signers: &[&TestKey],
    ) -> Result<RelayReceipt, WalletError> {
        self.relay(CallKind::SecurityChange { change }, signers)
    }

    /// Add and, when needed, confirm a guardian through the relay path.
    pub fn add_guardian(&mut self, seed: u8) {
        let guardian = TestKey::new(seed);
        let owner = TestKey::new(1);
        self.change(
            SecurityChange::AddGuardian {
                guardian: GuardianSigner::direct(guardian.address()),
            },
            &[&owner],
        )
        .expect("guardian requested");

        if !self.guardians.is_empty() {
            self.clock.advance(self.engine.config().security_period);
            let confirmer = TestKey::new(self.guardian_seed(0));
            self.change(
                SecurityChange::ConfirmGuardianAddition {
                    guardian: guardian.address(),
                },
                &[&confirmer],
            )
            .expect("guardian confirmed");
        }
        self.guardians.push(guardian);
    }

    fn guardian_seed(&self, index: usize) -> u8 {
        let address = self.guardians[index].address();
        (2..=u8::MAX)
            .find(|seed| TestKey::new(*seed).address() == address)
            .expect("guardian seed")
    }
}
