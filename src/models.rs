// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relay Data Models
//!
//! Request and receipt types exchanged with relayers. Everything a relay
//! request carries except `relayer`, `refund_amount` and the signatures
//! themselves is covered by the signed payload (see [`crate::signing`]).
//!
//! ## Model Categories
//!
//! - **Calls**: sub-calls of a batch and the refund asset
//! - **Requests**: [`RelayRequest`], [`CallKind`] and [`SecurityChange`]
//! - **Signers**: signature pairs and guardian signer kinds
//! - **Receipts**: outcome of an accepted relay

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

// =============================================================================
// Calls
// =============================================================================

/// One sub-call of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: Address,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
    /// When set, the party the call actually pays or approves is the first
    /// ABI address argument of `data` rather than `to`.
    #[serde(default)]
    pub spender_in_data: bool,
}

impl Call {
    /// Plain value transfer.
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to,
            value,
            data: Bytes::new(),
            spender_in_data: false,
        }
    }

    /// Contract call without value.
    pub fn contract(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: data.into(),
            spender_in_data: false,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_spender_in_data(mut self) -> Self {
        self.spender_in_data = true;
        self
    }

    /// First four bytes of calldata, if any.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// Asset used to pay the relayer refund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "token", rename_all = "snake_case")]
pub enum Asset {
    #[default]
    Native,
    Token(Address),
}

/// Signed refund terms: the relayer may claim up to `cap` of `asset`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundTerms {
    #[serde(default)]
    pub asset: Asset,
    #[serde(default)]
    pub cap: U256,
    /// Refund recipient; the submitting relayer when unset.
    #[serde(default)]
    pub recipient: Option<Address>,
}

// =============================================================================
// Signers
// =============================================================================

/// How a guardian proves a signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerKind {
    /// secp256k1 ECDSA; the signer address is recovered from the signature.
    #[default]
    DirectKey,
    /// Signature checked by an external [`DelegatedVerifier`](crate::signing::DelegatedVerifier).
    Delegated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSigner {
    pub address: Address,
    #[serde(default)]
    pub kind: SignerKind,
}

impl GuardianSigner {
    pub fn direct(address: Address) -> Self {
        Self {
            address,
            kind: SignerKind::DirectKey,
        }
    }

    pub fn delegated(address: Address) -> Self {
        Self {
            address,
            kind: SignerKind::Delegated,
        }
    }
}

/// A signature attributed to a claimed signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSignature {
    pub signer: Address,
    pub signature: Bytes,
}

// =============================================================================
// Requests
// =============================================================================

/// Session grant carried by an owner + guardian signed session batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub key: Address,
    pub expires: u64,
}

/// What a relay request asks the wallet to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallKind {
    /// Owner-signed batch. Calls outside the access policy need the
    /// guardian quorum as well.
    PlainBatch { calls: Vec<Call> },
    /// Owner-signed batch whose every call must pass the access policy.
    WhitelistBatch { calls: Vec<Call> },
    /// Either owner + guardian quorum (optionally installing a session), or
    /// the session key alone within the access policy.
    SessionBatch {
        calls: Vec<Call>,
        #[serde(default)]
        session: Option<SessionGrant>,
    },
    SecurityChange { change: SecurityChange },
}

impl CallKind {
    pub fn name(&self) -> &'static str {
        match self {
            CallKind::PlainBatch { .. } => "plain_batch",
            CallKind::WhitelistBatch { .. } => "whitelist_batch",
            CallKind::SessionBatch { .. } => "session_batch",
            CallKind::SecurityChange { change } => change.name(),
        }
    }

    /// Sub-calls to dispatch; empty for security changes.
    pub fn calls(&self) -> &[Call] {
        match self {
            CallKind::PlainBatch { calls }
            | CallKind::WhitelistBatch { calls }
            | CallKind::SessionBatch { calls, .. } => calls,
            CallKind::SecurityChange { .. } => &[],
        }
    }
}

/// Security-state mutations routed through the relay path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SecurityChange {
    AddToWhitelist { target: Address },
    RemoveFromWhitelist { target: Address },
    CreateSession { key: Address, expires: u64 },
    ClearSession,
    AddGuardian { guardian: GuardianSigner },
    RevokeGuardianAddition { guardian: Address },
    ConfirmGuardianAddition { guardian: Address },
    RemoveGuardian { guardian: Address },
    RevokeGuardianRemoval { guardian: Address },
    Lock,
    Unlock,
    ExecuteRecovery { new_owner: Address },
    CancelRecovery,
    TransferOwnership { new_owner: Address },
}

impl SecurityChange {
    pub fn name(&self) -> &'static str {
        match self {
            SecurityChange::AddToWhitelist { .. } => "add_to_whitelist",
            SecurityChange::RemoveFromWhitelist { .. } => "remove_from_whitelist",
            SecurityChange::CreateSession { .. } => "create_session",
            SecurityChange::ClearSession => "clear_session",
            SecurityChange::AddGuardian { .. } => "add_guardian",
            SecurityChange::RevokeGuardianAddition { .. } => "revoke_guardian_addition",
            SecurityChange::ConfirmGuardianAddition { .. } => "confirm_guardian_addition",
            SecurityChange::RemoveGuardian { .. } => "remove_guardian",
            SecurityChange::RevokeGuardianRemoval { .. } => "revoke_guardian_removal",
            SecurityChange::Lock => "lock",
            SecurityChange::Unlock => "unlock",
            SecurityChange::ExecuteRecovery { .. } => "execute_recovery",
            SecurityChange::CancelRecovery => "cancel_recovery",
            SecurityChange::TransferOwnership { .. } => "transfer_ownership",
        }
    }
}

/// A pre-signed request submitted by a relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub wallet: Address,
    pub nonce: u64,
    pub kind: CallKind,
    #[serde(default)]
    pub refund: RefundTerms,
    /// Submitting relayer; receives the refund unless the signers named a
    /// recipient.
    pub relayer: Address,
    /// Refund claimed by the relayer, clamped to `refund.cap`.
    #[serde(default)]
    pub refund_amount: U256,
    pub signatures: Vec<SignerSignature>,
}

// =============================================================================
// Receipts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPaid {
    pub asset: Asset,
    pub amount: U256,
    pub recipient: Address,
}

/// Outcome of an accepted relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReceipt {
    pub wallet: Address,
    pub nonce: u64,
    pub kind: String,
    /// Return data of each sub-call, in order.
    pub results: Vec<Bytes>,
    pub refund: Option<RefundPaid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn call_selector_needs_four_bytes() {
        let to = address!("0x1000000000000000000000000000000000000001");
        assert_eq!(Call::transfer(to, U256::from(1)).selector(), None);
        assert_eq!(
            Call::contract(to, vec![0xa9, 0x05, 0x9c, 0xbb, 0x00]).selector(),
            Some([0xa9, 0x05, 0x9c, 0xbb])
        );
    }

    #[test]
    fn relay_request_json_shape() {
        let json = serde_json::json!({
            "wallet": "0x1000000000000000000000000000000000000001",
            "nonce": 1,
            "kind": {
                "kind": "security_change",
                "change": { "op": "add_to_whitelist", "target": "0x2000000000000000000000000000000000000002" }
            },
            "relayer": "0x3000000000000000000000000000000000000003",
            "signatures": []
        });
        let request: RelayRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.refund, RefundTerms::default());
        assert_eq!(request.refund_amount, U256::ZERO);
        assert_eq!(request.kind.name(), "add_to_whitelist");
        assert!(request.kind.calls().is_empty());
    }

    #[test]
    fn guardian_signer_defaults_to_direct_key() {
        let signer: GuardianSigner =
            serde_json::from_str(r#"{"address":"0x2000000000000000000000000000000000000002"}"#)
                .unwrap();
        assert_eq!(signer.kind, SignerKind::DirectKey);
    }

    #[test]
    fn unit_security_changes_serialize_with_op_tag() {
        let value = serde_json::to_value(SecurityChange::Lock).unwrap();
        assert_eq!(value, serde_json::json!({ "op": "lock" }));
    }
}
