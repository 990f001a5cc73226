// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Engine
//!
//! Entry point for everything that touches wallet security state. The
//! engine owns the store, the ledger, the authoriser table and the event
//! log, and runs each relay request through the same pipeline:
//!
//! ```text
//! load record ─▶ verify signatures ─▶ check quorum ─▶ consume nonce
//!     ─▶ persist nonce ─▶ apply (policy, security change, dispatch + refund)
//!     ─▶ persist record ─▶ commit ledger
//! ```
//!
//! Failures before the nonce is consumed leave the record untouched.
//! Failures after it persist the consumed nonce and nothing else, so a
//! rejected request can never be replayed.

use std::sync::Arc;

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::authoriser::{AuthorisationRule, Authoriser};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::dispatch::{CallDispatcher, RefundOrder};
use crate::error::WalletError;
use crate::ledger::Ledger;
use crate::models::{CallKind, RelayReceipt, RelayRequest, SecurityChange};
use crate::policy::{AccessPolicy, Gate};
use crate::security::{
    ConfirmationWindow, LockHolder, PendingGuardianChange, PendingRecovery, SessionKey,
    WalletRecord,
};
use crate::signing::{relay_digest, Authority, DelegatedVerifier, Quorum, SignatureVerifier};
use crate::storage::{EventKind, EventLog, MemoryEventLog, SecurityStore, WalletEvent};

/// Snapshot of one wallet's security state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
    pub wallet: Address,
    pub owner: Address,
    /// Last consumed nonce.
    pub nonce: u64,
    pub locked: bool,
    pub lock_until: u64,
    pub lock_holder: Option<LockHolder>,
    pub guardians: Vec<Address>,
    pub pending_guardian_changes: Vec<PendingGuardianChange>,
    pub recovery: PendingRecovery,
    /// Earliest finalization time of a pending recovery.
    pub recovery_ready_at: Option<u64>,
    pub session: Option<SessionKey>,
    pub whitelist_size: usize,
}

pub struct Engine<S, L> {
    config: EngineConfig,
    store: S,
    ledger: L,
    authoriser: Authoriser,
    clock: Arc<dyn Clock>,
    events: Box<dyn EventLog>,
    delegated: Option<Arc<dyn DelegatedVerifier>>,
}

fn event_kind(kind: &CallKind) -> EventKind {
    match kind {
        CallKind::PlainBatch { .. } => EventKind::PlainBatch,
        CallKind::WhitelistBatch { .. } => EventKind::WhitelistBatch,
        CallKind::SessionBatch { .. } => EventKind::SessionBatch,
        CallKind::SecurityChange { change } => match change {
            SecurityChange::AddToWhitelist { .. } => EventKind::AddToWhitelist,
            SecurityChange::RemoveFromWhitelist { .. } => EventKind::RemoveFromWhitelist,
            SecurityChange::CreateSession { .. } => EventKind::CreateSession,
            SecurityChange::ClearSession => EventKind::ClearSession,
            SecurityChange::AddGuardian { .. } => EventKind::AddGuardian,
            SecurityChange::RevokeGuardianAddition { .. } => EventKind::RevokeGuardianAddition,
            SecurityChange::ConfirmGuardianAddition { .. } => EventKind::ConfirmGuardianAddition,
            SecurityChange::RemoveGuardian { .. } => EventKind::RemoveGuardian,
            SecurityChange::RevokeGuardianRemoval { .. } => EventKind::RevokeGuardianRemoval,
            SecurityChange::Lock => EventKind::Lock,
            SecurityChange::Unlock => EventKind::Unlock,
            SecurityChange::ExecuteRecovery { .. } => EventKind::ExecuteRecovery,
            SecurityChange::CancelRecovery => EventKind::CancelRecovery,
            SecurityChange::TransferOwnership { .. } => EventKind::TransferOwnership,
        },
    }
}

impl<S: SecurityStore, L: Ledger> Engine<S, L> {
    /// Build an engine over `store`, loading the persisted authoriser rules.
    pub fn new(
        config: EngineConfig,
        store: S,
        ledger: L,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WalletError> {
        let authoriser = Authoriser::from_rules(store.load_rules()?);
        tracing::info!(
            domain = config.domain,
            rules = authoriser.rules().count(),
            quorum = ?config.guardian_quorum,
            "Authorization engine ready"
        );
        Ok(Self {
            config,
            store,
            ledger,
            authoriser,
            clock,
            events: Box::new(MemoryEventLog::new()),
            delegated: None,
        })
    }

    pub fn with_event_log(mut self, events: impl EventLog + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn with_delegated_verifier(mut self, verifier: Arc<dyn DelegatedVerifier>) -> Self {
        self.delegated = Some(verifier);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn authoriser(&self) -> &Authoriser {
        &self.authoriser
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    fn window(&self) -> ConfirmationWindow {
        ConfirmationWindow {
            security_period: self.config.security_period,
            security_window: self.config.security_window,
        }
    }

    fn load(&self, wallet: &Address) -> Result<WalletRecord, WalletError> {
        self.store
            .load_wallet(wallet)?
            .ok_or(WalletError::UnknownWallet(*wallet))
    }

    fn emit(&mut self, event: WalletEvent) {
        if let Err(e) = self.events.record(&event) {
            tracing::warn!(error = %e, kind = ?event.kind, "Failed to record wallet event");
        }
    }

    /// Record `result` of an operation on `wallet` in the event log.
    fn finish<T>(
        &mut self,
        kind: EventKind,
        wallet: Option<Address>,
        details: serde_json::Value,
        result: Result<T, WalletError>,
    ) -> Result<T, WalletError> {
        let mut event = WalletEvent::new(kind, self.now()).with_details(details);
        if let Some(wallet) = wallet {
            event = event.with_wallet(wallet);
        }
        if let Err(e) = &result {
            event = event.failed(e);
        }
        self.emit(event);
        result
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a freshly deployed wallet with its initial owner.
    pub fn register_wallet(&mut self, wallet: Address, owner: Address) -> Result<(), WalletError> {
        let now = self.now();
        let result = self.register_inner(wallet, owner, now);
        match &result {
            Ok(()) => tracing::info!(wallet = %wallet, owner = %owner, "Wallet registered"),
            Err(e) => tracing::warn!(wallet = %wallet, error = %e, "Wallet registration rejected"),
        }
        self.finish(
            EventKind::WalletRegistered,
            Some(wallet),
            json!({ "owner": owner }),
            result,
        )
    }

    fn register_inner(&mut self, wallet: Address, owner: Address, now: u64) -> Result<(), WalletError> {
        if wallet.is_zero() {
            return Err(WalletError::InvalidTarget(wallet));
        }
        if owner.is_zero() || owner == wallet {
            return Err(WalletError::InvalidOwner(owner));
        }
        if self.store.load_wallet(&wallet)?.is_some() {
            return Err(WalletError::WalletExists(wallet));
        }
        self.store.save_wallet(&WalletRecord::new(wallet, owner, now))?;
        Ok(())
    }

    // =========================================================================
    // Relay
    // =========================================================================

    /// Digest the signers of `request` must sign.
    pub fn digest(&self, request: &RelayRequest) -> B256 {
        relay_digest(self.config.domain, request)
    }

    /// Authorise and execute a relayed request.
    pub fn relay(&mut self, request: RelayRequest) -> Result<RelayReceipt, WalletError> {
        let now = self.now();
        let result = self.relay_inner(&request, now);

        match &result {
            Ok(receipt) => tracing::info!(
                wallet = %request.wallet,
                nonce = request.nonce,
                kind = %receipt.kind,
                calls = receipt.results.len(),
                refunded = receipt.refund.is_some(),
                "Relay accepted"
            ),
            Err(e) => tracing::warn!(
                wallet = %request.wallet,
                nonce = request.nonce,
                kind = request.kind.name(),
                error_code = e.error_code(),
                error = %e,
                "Relay rejected"
            ),
        }

        let details = json!({
            "nonce": request.nonce,
            "request": request.kind,
            "relayer": request.relayer,
            "signers": request.signatures.iter().map(|s| s.signer).collect::<Vec<_>>(),
        });
        self.finish(event_kind(&request.kind), Some(request.wallet), details, result)
    }

    fn relay_inner(&mut self, request: &RelayRequest, now: u64) -> Result<RelayReceipt, WalletError> {
        let mut record = self.load(&request.wallet)?;
        let digest = self.digest(request);

        let authority = {
            let verifier = SignatureVerifier::new(
                &record,
                self.config.guardian_quorum,
                self.delegated.as_deref(),
                now,
            );
            let signers = verifier.verify(&digest, &request.signatures)?;
            verifier.authorise(&signers, Quorum::for_kind(&request.kind))?
        };

        record.nonce.validate_and_consume(request.nonce)?;
        // The consumed nonce is durable before any value moves.
        self.store.save_wallet(&record)?;

        let checkpoint = self.ledger.checkpoint();
        let result = match self.apply(&mut record, request, &authority, now) {
            Ok(receipt) => self
                .store
                .save_wallet(&record)
                .map(|()| receipt)
                .map_err(WalletError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(receipt) => {
                self.ledger
                    .commit(checkpoint)
                    .map_err(|e| WalletError::Storage(e.to_string()))?;
                Ok(receipt)
            }
            Err(e) => {
                if let Err(rollback) = self.ledger.rollback(checkpoint) {
                    tracing::error!(error = %rollback, wallet = %request.wallet, "Ledger rollback failed");
                }
                Err(e)
            }
        }
    }

    fn apply(
        &mut self,
        record: &mut WalletRecord,
        request: &RelayRequest,
        authority: &Authority,
        now: u64,
    ) -> Result<RelayReceipt, WalletError> {
        match &request.kind {
            CallKind::PlainBatch { calls } => {
                record.ensure_unlocked(now)?;
                if *authority == Authority::Owner {
                    self.policy(record, now).check_all(calls, Gate::Owner)?;
                }
            }
            CallKind::WhitelistBatch { calls } => {
                record.ensure_unlocked(now)?;
                self.policy(record, now).check_all(calls, Gate::Whitelist)?;
            }
            CallKind::SessionBatch { calls, session } => {
                record.ensure_unlocked(now)?;
                match authority {
                    Authority::Session(_) => {
                        if session.is_some() {
                            return Err(WalletError::SessionScopeViolation(
                                "a session key cannot install a session".into(),
                            ));
                        }
                        self.policy(record, now).check_all(calls, Gate::Session)?;
                    }
                    _ => {
                        if let Some(grant) = session {
                            record.session.create_or_refresh(grant.key, grant.expires);
                        }
                    }
                }
            }
            CallKind::SecurityChange { change } => self.apply_change(record, change, now)?,
        }

        let refund = RefundOrder::bounded(&request.refund, request.refund_amount, request.relayer);
        let outcome = CallDispatcher::new(&mut self.ledger).execute(
            request.wallet,
            request.kind.calls(),
            refund,
        )?;

        Ok(RelayReceipt {
            wallet: request.wallet,
            nonce: request.nonce,
            kind: request.kind.name().to_string(),
            results: outcome.results,
            refund: outcome.refund,
        })
    }

    fn policy<'a>(&'a self, record: &'a WalletRecord, now: u64) -> AccessPolicy<'a> {
        AccessPolicy::new(record, &self.authoriser, now, self.config.security_period)
    }

    fn apply_change(
        &self,
        record: &mut WalletRecord,
        change: &SecurityChange,
        now: u64,
    ) -> Result<(), WalletError> {
        let window = self.window();
        match change {
            // Recovery and lock management stay reachable while locked.
            SecurityChange::Lock => {
                record.lock(now, self.config.lock_period)?;
                return Ok(());
            }
            SecurityChange::Unlock => return record.unlock(now),
            SecurityChange::ExecuteRecovery { new_owner } => {
                return record.execute_recovery(*new_owner, now, self.config.recovery_period)
            }
            SecurityChange::CancelRecovery => return record.cancel_recovery(),
            _ => record.ensure_unlocked(now)?,
        }

        match change {
            SecurityChange::AddToWhitelist { target } => {
                record.add_to_whitelist(*target, now)?;
            }
            SecurityChange::RemoveFromWhitelist { target } => {
                record.whitelist.remove(target);
            }
            SecurityChange::CreateSession { key, expires } => {
                record.session.create_or_refresh(*key, *expires);
            }
            SecurityChange::ClearSession => record.session.clear(),
            SecurityChange::AddGuardian { guardian } => {
                let state = record.add_guardian(*guardian, now, &window)?;
                tracing::debug!(wallet = %record.wallet, guardian = %guardian.address, ?state, "Guardian requested");
            }
            SecurityChange::RevokeGuardianAddition { guardian } => {
                record.guardians.revoke_addition(guardian)?;
            }
            SecurityChange::ConfirmGuardianAddition { guardian } => {
                record.guardians.confirm_addition(guardian, now, &window)?;
            }
            SecurityChange::RemoveGuardian { guardian } => {
                record.guardians.request_removal(guardian, now, &window)?;
            }
            SecurityChange::RevokeGuardianRemoval { guardian } => {
                record.guardians.revoke_removal(guardian)?;
            }
            SecurityChange::TransferOwnership { new_owner } => {
                record.transfer_ownership(*new_owner)?;
            }
            SecurityChange::Lock
            | SecurityChange::Unlock
            | SecurityChange::ExecuteRecovery { .. }
            | SecurityChange::CancelRecovery => {}
        }
        Ok(())
    }

    // =========================================================================
    // Unsigned operations
    // =========================================================================

    /// Complete a matured recovery. Anyone may call this.
    pub fn finalize_recovery(&mut self, wallet: Address) -> Result<Address, WalletError> {
        let now = self.now();
        let result = self.load(&wallet).and_then(|mut record| {
            let owner = record.finalize_recovery(now, self.config.recovery_period)?;
            self.store.save_wallet(&record)?;
            Ok(owner)
        });
        match &result {
            Ok(owner) => tracing::info!(wallet = %wallet, owner = %owner, "Recovery finalized"),
            Err(e) => tracing::warn!(wallet = %wallet, error = %e, "Recovery finalization rejected"),
        }
        let details = match &result {
            Ok(owner) => json!({ "new_owner": owner }),
            Err(_) => json!({}),
        };
        self.finish(EventKind::FinalizeRecovery, Some(wallet), details, result)
    }

    /// Complete a guardian removal inside its confirmation window. Anyone
    /// may call this.
    pub fn confirm_guardian_removal(
        &mut self,
        wallet: Address,
        guardian: Address,
    ) -> Result<(), WalletError> {
        let now = self.now();
        let window = self.window();
        let result = self.load(&wallet).and_then(|mut record| {
            record.ensure_unlocked(now)?;
            record.guardians.confirm_removal(&guardian, now, &window)?;
            self.store.save_wallet(&record)?;
            Ok(())
        });
        match &result {
            Ok(()) => tracing::info!(wallet = %wallet, guardian = %guardian, "Guardian removed"),
            Err(e) => tracing::warn!(wallet = %wallet, guardian = %guardian, error = %e, "Guardian removal rejected"),
        }
        self.finish(
            EventKind::ConfirmGuardianRemoval,
            Some(wallet),
            json!({ "guardian": guardian }),
            result,
        )
    }

    // =========================================================================
    // Authoriser administration
    // =========================================================================

    /// Insert or replace a vetted target.
    pub fn add_authorisation(&mut self, rule: AuthorisationRule) -> Result<(), WalletError> {
        let details = json!({ "rule": rule });
        let result = self.store.save_rule(&rule).map_err(WalletError::from);
        if result.is_ok() {
            tracing::info!(target_address = %rule.target, "Authorisation added");
            self.authoriser.add_rule(rule);
        }
        self.finish(EventKind::AuthorisationAdded, None, details, result)
    }

    /// Returns `false` when `target` held no rule.
    pub fn remove_authorisation(&mut self, target: Address) -> Result<bool, WalletError> {
        let result = self.store.delete_rule(&target).map_err(WalletError::from);
        if result.is_ok() {
            self.authoriser.remove_rule(&target);
            tracing::info!(target_address = %target, "Authorisation removed");
        }
        self.finish(
            EventKind::AuthorisationRemoved,
            None,
            json!({ "target": target }),
            result,
        )
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn record(&self, wallet: &Address) -> Result<WalletRecord, WalletError> {
        self.load(wallet)
    }

    pub fn owner(&self, wallet: &Address) -> Result<Address, WalletError> {
        Ok(self.load(wallet)?.owner)
    }

    /// Last consumed nonce.
    pub fn nonce(&self, wallet: &Address) -> Result<u64, WalletError> {
        Ok(self.load(wallet)?.nonce.current())
    }

    pub fn is_whitelisted(&self, wallet: &Address, target: &Address) -> Result<bool, WalletError> {
        let record = self.load(wallet)?;
        Ok(record
            .whitelist
            .is_whitelisted(target, self.now(), self.config.security_period))
    }

    pub fn is_guardian(&self, wallet: &Address, guardian: &Address) -> Result<bool, WalletError> {
        Ok(self.load(wallet)?.guardians.is_active(guardian))
    }

    pub fn guardian_count(&self, wallet: &Address) -> Result<usize, WalletError> {
        Ok(self.load(wallet)?.guardians.active_count())
    }

    pub fn is_locked(&self, wallet: &Address) -> Result<bool, WalletError> {
        Ok(self.load(wallet)?.is_locked(self.now()))
    }

    pub fn recovery(&self, wallet: &Address) -> Result<PendingRecovery, WalletError> {
        Ok(self.load(wallet)?.recovery)
    }

    pub fn session(&self, wallet: &Address) -> Result<Option<SessionKey>, WalletError> {
        Ok(self.load(wallet)?.session.current().copied())
    }

    pub fn wallet_status(&self, wallet: &Address) -> Result<WalletStatus, WalletError> {
        let record = self.load(wallet)?;
        let now = self.now();
        Ok(WalletStatus {
            wallet: record.wallet,
            owner: record.owner,
            nonce: record.nonce.current(),
            locked: record.is_locked(now),
            lock_until: record.lock.until(),
            lock_holder: record.lock.holder(),
            guardians: record.guardians.active().collect(),
            pending_guardian_changes: record.guardians.pending_changes(),
            recovery: record.recovery,
            recovery_ready_at: record
                .recovery
                .is_pending()
                .then(|| record.recovery.ready_at(self.config.recovery_period)),
            session: record.session.current().copied(),
            whitelist_size: record.whitelist.len(),
        })
    }
}
