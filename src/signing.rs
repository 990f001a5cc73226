// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relay Signatures
//!
//! ## Signed payload
//!
//! Every relay request is signed over a canonical byte encoding:
//!
//! ```text
//! tag || domain (u64) || wallet || nonce (u64)
//!     || refund asset || refund cap || refund recipient
//!     || kind tag || kind payload
//! ```
//!
//! Integers are big-endian, U256 values 32 bytes, addresses 20 bytes,
//! optional values prefixed with a presence byte and variable-length data
//! with a u32 length. The digest handed to signers is
//! `eip191(keccak256(payload))`, the same personal-message wrapping wallets
//! apply to a 32-byte hash.
//!
//! ## Signers
//!
//! Signatures come as `(signer, bytes)` pairs sorted by signer with no
//! duplicates. Owners and session keys always sign with a secp256k1 key;
//! guardians either sign directly or delegate verification to an external
//! [`DelegatedVerifier`]. High-s signatures are rejected.

use alloy::primitives::{eip191_hash_message, keccak256, Address, B256, U256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::config::QuorumRule;
use crate::error::WalletError;
use crate::models::{
    Asset, Call, CallKind, RefundTerms, RelayRequest, SecurityChange, SignerKind,
    SignerSignature,
};
use crate::security::WalletRecord;

const PAYLOAD_TAG: &[u8] = b"relational-custody-guard/relay/v1";

// =============================================================================
// Canonical payload
// =============================================================================

struct Encoder(Vec<u8>);

impl Encoder {
    fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.extend_from_slice(bytes);
        self
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    fn u64(&mut self, v: u64) -> &mut Self {
        self.bytes(&v.to_be_bytes())
    }

    fn u256(&mut self, v: &U256) -> &mut Self {
        self.bytes(&v.to_be_bytes::<32>())
    }

    fn address(&mut self, a: &Address) -> &mut Self {
        self.bytes(a.as_slice())
    }

    fn optional_address(&mut self, a: &Option<Address>) -> &mut Self {
        match a {
            Some(a) => self.u8(1).address(a),
            None => self.u8(0),
        }
    }

    fn len_prefixed(&mut self, bytes: &[u8]) -> &mut Self {
        // calldata beyond u32::MAX never reaches the encoder in practice
        let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        self.bytes(&len.to_be_bytes()).bytes(bytes)
    }

    fn calls(&mut self, calls: &[Call]) -> &mut Self {
        let count = u32::try_from(calls.len()).unwrap_or(u32::MAX);
        self.bytes(&count.to_be_bytes());
        for call in calls {
            self.address(&call.to)
                .u256(&call.value)
                .u8(call.spender_in_data as u8)
                .len_prefixed(&call.data);
        }
        self
    }

    fn refund(&mut self, refund: &RefundTerms) -> &mut Self {
        match refund.asset {
            Asset::Native => self.u8(0),
            Asset::Token(token) => self.u8(1).address(&token),
        };
        self.u256(&refund.cap).optional_address(&refund.recipient)
    }

    fn kind(&mut self, kind: &CallKind) -> &mut Self {
        match kind {
            CallKind::PlainBatch { calls } => self.u8(0).calls(calls),
            CallKind::WhitelistBatch { calls } => self.u8(1).calls(calls),
            CallKind::SessionBatch { calls, session } => {
                self.u8(2).calls(calls);
                match session {
                    Some(grant) => self.u8(1).address(&grant.key).u64(grant.expires),
                    None => self.u8(0),
                }
            }
            CallKind::SecurityChange { change } => self.u8(3).change(change),
        }
    }

    fn change(&mut self, change: &SecurityChange) -> &mut Self {
        match change {
            SecurityChange::AddToWhitelist { target } => self.u8(0).address(target),
            SecurityChange::RemoveFromWhitelist { target } => self.u8(1).address(target),
            SecurityChange::CreateSession { key, expires } => {
                self.u8(2).address(key).u64(*expires)
            }
            SecurityChange::ClearSession => self.u8(3),
            SecurityChange::AddGuardian { guardian } => {
                let kind = match guardian.kind {
                    SignerKind::DirectKey => 0,
                    SignerKind::Delegated => 1,
                };
                self.u8(4).address(&guardian.address).u8(kind)
            }
            SecurityChange::RevokeGuardianAddition { guardian } => self.u8(5).address(guardian),
            SecurityChange::ConfirmGuardianAddition { guardian } => self.u8(6).address(guardian),
            SecurityChange::RemoveGuardian { guardian } => self.u8(7).address(guardian),
            SecurityChange::RevokeGuardianRemoval { guardian } => self.u8(8).address(guardian),
            SecurityChange::Lock => self.u8(9),
            SecurityChange::Unlock => self.u8(10),
            SecurityChange::ExecuteRecovery { new_owner } => self.u8(11).address(new_owner),
            SecurityChange::CancelRecovery => self.u8(12),
            SecurityChange::TransferOwnership { new_owner } => self.u8(13).address(new_owner),
        }
    }
}

/// Canonical bytes a relay request is signed over.
pub fn relay_payload(domain: u64, request: &RelayRequest) -> Vec<u8> {
    let mut encoder = Encoder(Vec::with_capacity(256));
    encoder
        .bytes(PAYLOAD_TAG)
        .u64(domain)
        .address(&request.wallet)
        .u64(request.nonce)
        .refund(&request.refund)
        .kind(&request.kind);
    encoder.0
}

/// Digest every signer of `request` signs.
pub fn relay_digest(domain: u64, request: &RelayRequest) -> B256 {
    eip191_hash_message(keccak256(relay_payload(domain, request)))
}

// =============================================================================
// Signature recovery
// =============================================================================

/// Ethereum address of a secp256k1 public key.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Recover the signer of a 65-byte `r || s || v` signature over `digest`.
pub fn recover_signer(digest: &B256, signature: &[u8]) -> Result<Address, WalletError> {
    if signature.len() != 65 {
        return Err(WalletError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            signature.len()
        )));
    }
    let parsed = Signature::from_slice(&signature[..64])
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))?;
    if parsed.normalize_s().is_some() {
        return Err(WalletError::InvalidSignature("high-s signature".into()));
    }
    let v = match signature[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        v => {
            return Err(WalletError::InvalidSignature(format!(
                "invalid recovery byte {v}"
            )))
        }
    };
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| WalletError::InvalidSignature(format!("invalid recovery byte {v}")))?;
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &parsed, recovery_id)
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))?;
    Ok(address_of(&key))
}

/// External verification for guardians that are not plain keys (contract
/// accounts, hardware services).
pub trait DelegatedVerifier: Send + Sync {
    fn is_valid_signature(&self, signer: Address, digest: B256, signature: &[u8]) -> bool;
}

// =============================================================================
// Quorum
// =============================================================================

/// Signer set an operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quorum {
    OwnerOnly,
    /// Owner, plus the guardian quorum when the batch leaves the access
    /// policy.
    OwnerWithOptionalGuardians,
    OwnerAndGuardians,
    /// Owner + guardian quorum, or the session key alone.
    OwnerAndGuardiansOrSession,
    SingleGuardian,
    /// Guardian quorum with the owner excluded.
    GuardiansOnly,
}

impl Quorum {
    pub fn for_kind(kind: &CallKind) -> Self {
        match kind {
            CallKind::PlainBatch { .. } => Quorum::OwnerWithOptionalGuardians,
            CallKind::WhitelistBatch { .. } => Quorum::OwnerOnly,
            CallKind::SessionBatch { .. } => Quorum::OwnerAndGuardiansOrSession,
            CallKind::SecurityChange { change } => match change {
                SecurityChange::AddToWhitelist { .. }
                | SecurityChange::RemoveFromWhitelist { .. }
                | SecurityChange::ClearSession
                | SecurityChange::AddGuardian { .. }
                | SecurityChange::RevokeGuardianAddition { .. }
                | SecurityChange::RemoveGuardian { .. }
                | SecurityChange::RevokeGuardianRemoval { .. } => Quorum::OwnerOnly,
                SecurityChange::CreateSession { .. }
                | SecurityChange::CancelRecovery
                | SecurityChange::TransferOwnership { .. } => Quorum::OwnerAndGuardians,
                SecurityChange::Lock
                | SecurityChange::Unlock
                | SecurityChange::ConfirmGuardianAddition { .. } => Quorum::SingleGuardian,
                SecurityChange::ExecuteRecovery { .. } => Quorum::GuardiansOnly,
            },
        }
    }
}

/// Who authorised an accepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authority {
    Owner,
    OwnerAndGuardians,
    Guardians(Vec<Address>),
    Session(Address),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifiedSigners {
    pub owner: bool,
    pub guardians: Vec<Address>,
    pub session_key: Option<Address>,
}

enum Role {
    Owner,
    Guardian(SignerKind),
    Session,
}

pub struct SignatureVerifier<'a> {
    record: &'a WalletRecord,
    quorum_rule: QuorumRule,
    delegated: Option<&'a dyn DelegatedVerifier>,
    now: u64,
}

impl<'a> SignatureVerifier<'a> {
    pub fn new(
        record: &'a WalletRecord,
        quorum_rule: QuorumRule,
        delegated: Option<&'a dyn DelegatedVerifier>,
        now: u64,
    ) -> Self {
        Self {
            record,
            quorum_rule,
            delegated,
            now,
        }
    }

    fn role_of(&self, signer: &Address) -> Option<Role> {
        if *signer == self.record.owner {
            Some(Role::Owner)
        } else if let Some(kind) = self.record.guardians.active_kind(signer) {
            Some(Role::Guardian(kind))
        } else if self.record.session.is_session_key(signer) {
            Some(Role::Session)
        } else {
            None
        }
    }

    /// Check ordering, signer roles and every signature.
    pub fn verify(
        &self,
        digest: &B256,
        signatures: &[SignerSignature],
    ) -> Result<VerifiedSigners, WalletError> {
        if signatures.is_empty() {
            return Err(WalletError::InvalidSignature("no signatures".into()));
        }
        if signatures.windows(2).any(|w| w[0].signer >= w[1].signer) {
            return Err(WalletError::InvalidSignature(
                "signatures must be sorted by signer without duplicates".into(),
            ));
        }

        let mut verified = VerifiedSigners::default();
        for entry in signatures {
            let role = self
                .role_of(&entry.signer)
                .ok_or(WalletError::UnauthorisedSigner(entry.signer))?;
            let kind = match role {
                Role::Guardian(kind) => kind,
                Role::Owner | Role::Session => SignerKind::DirectKey,
            };
            self.check_signature(kind, entry, digest)?;
            if matches!(role, Role::Session)
                && !self.record.session.is_session_valid(&entry.signer, self.now)
            {
                return Err(WalletError::SessionExpired);
            }

            match role {
                Role::Owner => verified.owner = true,
                Role::Guardian(_) => verified.guardians.push(entry.signer),
                Role::Session => verified.session_key = Some(entry.signer),
            }
        }
        Ok(verified)
    }

    fn check_signature(
        &self,
        kind: SignerKind,
        entry: &SignerSignature,
        digest: &B256,
    ) -> Result<(), WalletError> {
        match kind {
            SignerKind::DirectKey => {
                let recovered = recover_signer(digest, &entry.signature)?;
                if recovered != entry.signer {
                    return Err(WalletError::InvalidSignature(format!(
                        "signature does not match signer {}",
                        entry.signer
                    )));
                }
                Ok(())
            }
            SignerKind::Delegated => {
                let verifier = self.delegated.ok_or_else(|| {
                    WalletError::InvalidSignature(format!(
                        "no delegated verifier for {}",
                        entry.signer
                    ))
                })?;
                if !verifier.is_valid_signature(entry.signer, *digest, &entry.signature) {
                    return Err(WalletError::InvalidSignature(format!(
                        "delegated signature rejected for {}",
                        entry.signer
                    )));
                }
                Ok(())
            }
        }
    }

    /// Guardian signatures the current guardian set requires.
    pub fn required_guardians(&self) -> usize {
        self.quorum_rule
            .required(self.record.guardians.active_count())
    }

    /// Decide whether `signers` satisfy `quorum`.
    pub fn authorise(
        &self,
        signers: &VerifiedSigners,
        quorum: Quorum,
    ) -> Result<Authority, WalletError> {
        let required = self.required_guardians();
        let owner = self.record.owner;

        let reject_session = || match signers.session_key {
            Some(key) => Err(WalletError::UnauthorisedSigner(key)),
            None => Ok(()),
        };
        let require_owner = || {
            if signers.owner {
                Ok(())
            } else {
                Err(WalletError::InvalidSignature("owner signature required".into()))
            }
        };
        let guardian_quorum = || {
            if signers.guardians.len() >= required {
                Ok(())
            } else {
                Err(WalletError::InvalidSignature(format!(
                    "{required} guardian signatures required, got {}",
                    signers.guardians.len()
                )))
            }
        };

        match quorum {
            Quorum::OwnerOnly => {
                reject_session()?;
                require_owner()?;
                if let Some(guardian) = signers.guardians.first() {
                    return Err(WalletError::UnauthorisedSigner(*guardian));
                }
                Ok(Authority::Owner)
            }
            Quorum::OwnerWithOptionalGuardians => {
                reject_session()?;
                require_owner()?;
                if signers.guardians.len() >= required {
                    Ok(Authority::OwnerAndGuardians)
                } else if signers.guardians.is_empty() {
                    Ok(Authority::Owner)
                } else {
                    guardian_quorum().map(|_| Authority::OwnerAndGuardians)
                }
            }
            Quorum::OwnerAndGuardians => {
                reject_session()?;
                require_owner()?;
                guardian_quorum()?;
                Ok(Authority::OwnerAndGuardians)
            }
            Quorum::OwnerAndGuardiansOrSession => match signers.session_key {
                Some(key) if !signers.owner && signers.guardians.is_empty() => {
                    Ok(Authority::Session(key))
                }
                Some(key) => Err(WalletError::UnauthorisedSigner(key)),
                None => {
                    require_owner()?;
                    guardian_quorum()?;
                    Ok(Authority::OwnerAndGuardians)
                }
            },
            Quorum::SingleGuardian => {
                reject_session()?;
                if signers.owner {
                    return Err(WalletError::UnauthorisedSigner(owner));
                }
                if signers.guardians.is_empty() {
                    return Err(WalletError::InvalidSignature(
                        "guardian signature required".into(),
                    ));
                }
                Ok(Authority::Guardians(signers.guardians.clone()))
            }
            Quorum::GuardiansOnly => {
                reject_session()?;
                if signers.owner {
                    return Err(WalletError::UnauthorisedSigner(owner));
                }
                if signers.guardians.is_empty() {
                    return Err(WalletError::InvalidSignature(
                        "guardian signature required".into(),
                    ));
                }
                guardian_quorum()?;
                Ok(Authority::Guardians(signers.guardians.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GuardianSigner;
    use crate::security::ConfirmationWindow;
    use crate::testing::{sign, TestKey};

    const WINDOW: ConfirmationWindow = ConfirmationWindow {
        security_period: 2,
        security_window: 2,
    };

    fn digest() -> B256 {
        keccak256(b"relay")
    }

    fn record(owner: &TestKey, guardians: &[&TestKey]) -> WalletRecord {
        let mut record = WalletRecord::new(Address::repeat_byte(0xee), owner.address(), 0);
        for (i, guardian) in guardians.iter().enumerate() {
            record
                .add_guardian(GuardianSigner::direct(guardian.address()), 0, &WINDOW)
                .unwrap();
            if i > 0 {
                record
                    .guardians
                    .confirm_addition(&guardian.address(), 2, &WINDOW)
                    .unwrap();
            }
        }
        record
    }

    fn verifier(record: &WalletRecord) -> SignatureVerifier<'_> {
        SignatureVerifier::new(record, QuorumRule::Majority, None, 0)
    }

    #[test]
    fn recovers_direct_key_signatures() {
        let key = TestKey::new(1);
        let signature = key.sign(&digest());
        assert_eq!(signature.len(), 65);
        assert_eq!(recover_signer(&digest(), &signature).unwrap(), key.address());
    }

    #[test]
    fn rejects_malformed_and_high_s() {
        let key = TestKey::new(1);
        let signature = key.sign(&digest());
        assert!(recover_signer(&digest(), &signature[..64]).is_err());

        let mut bad_v = signature.clone();
        bad_v[64] = 5;
        assert!(recover_signer(&digest(), &bad_v).is_err());

        // flip s to n - s
        let parsed = Signature::from_slice(&signature[..64]).unwrap();
        let high_s: k256::Scalar = -*parsed.s();
        let high = Signature::from_scalars(parsed.r().to_bytes(), high_s.to_bytes()).unwrap();
        let mut high_bytes = high.to_bytes().to_vec();
        high_bytes.push(signature[64] ^ 1);
        assert_eq!(
            recover_signer(&digest(), &high_bytes),
            Err(WalletError::InvalidSignature("high-s signature".into()))
        );
    }

    #[test]
    fn owner_alone_satisfies_owner_only() {
        let owner = TestKey::new(1);
        let record = record(&owner, &[]);
        let signers = verifier(&record)
            .verify(&digest(), &sign(&digest(), &[&owner]))
            .unwrap();
        assert_eq!(
            verifier(&record).authorise(&signers, Quorum::OwnerOnly).unwrap(),
            Authority::Owner
        );
    }

    #[test]
    fn unknown_signer_is_unauthorised() {
        let owner = TestKey::new(1);
        let stranger = TestKey::new(9);
        let record = record(&owner, &[]);
        assert_eq!(
            verifier(&record).verify(&digest(), &sign(&digest(), &[&stranger])),
            Err(WalletError::UnauthorisedSigner(stranger.address()))
        );
    }

    #[test]
    fn signature_by_wrong_key_is_invalid() {
        let owner = TestKey::new(1);
        let record = record(&owner, &[]);
        let forged = vec![SignerSignature {
            signer: owner.address(),
            signature: TestKey::new(2).sign(&digest()).into(),
        }];
        assert!(matches!(
            verifier(&record).verify(&digest(), &forged),
            Err(WalletError::InvalidSignature(_))
        ));
    }

    #[test]
    fn unsorted_or_duplicate_signers_are_invalid() {
        let owner = TestKey::new(1);
        let guardian = TestKey::new(2);
        let record = record(&owner, &[&guardian]);
        let mut signatures = sign(&digest(), &[&owner, &guardian]);
        signatures.reverse();
        assert!(matches!(
            verifier(&record).verify(&digest(), &signatures),
            Err(WalletError::InvalidSignature(_))
        ));

        let duplicated = vec![signatures[0].clone(), signatures[0].clone()];
        assert!(matches!(
            verifier(&record).verify(&digest(), &duplicated),
            Err(WalletError::InvalidSignature(_))
        ));
        assert!(verifier(&record).verify(&digest(), &[]).is_err());
    }

    #[test]
    fn guardian_majority_is_enforced() {
        let owner = TestKey::new(1);
        let (g1, g2, g3) = (TestKey::new(2), TestKey::new(3), TestKey::new(4));
        let record = record(&owner, &[&g1, &g2, &g3]);
        let v = verifier(&record);
        assert_eq!(v.required_guardians(), 2);

        let one = v.verify(&digest(), &sign(&digest(), &[&owner, &g1])).unwrap();
        assert!(matches!(
            v.authorise(&one, Quorum::OwnerAndGuardians),
            Err(WalletError::InvalidSignature(_))
        ));

        let two = v
            .verify(&digest(), &sign(&digest(), &[&owner, &g1, &g2]))
            .unwrap();
        assert_eq!(
            v.authorise(&two, Quorum::OwnerAndGuardians).unwrap(),
            Authority::OwnerAndGuardians
        );
    }

    #[test]
    fn zero_guardians_make_owner_quorum_trivial() {
        let owner = TestKey::new(1);
        let record = record(&owner, &[]);
        let v = verifier(&record);
        let signers = v.verify(&digest(), &sign(&digest(), &[&owner])).unwrap();
        assert_eq!(
            v.authorise(&signers, Quorum::OwnerWithOptionalGuardians).unwrap(),
            Authority::OwnerAndGuardians
        );
        assert!(v.authorise(&signers, Quorum::GuardiansOnly).is_err());
    }

    #[test]
    fn recovery_quorum_excludes_owner() {
        let owner = TestKey::new(1);
        let guardian = TestKey::new(2);
        let record = record(&owner, &[&guardian]);
        let v = verifier(&record);

        let with_owner = v
            .verify(&digest(), &sign(&digest(), &[&owner, &guardian]))
            .unwrap();
        assert_eq!(
            v.authorise(&with_owner, Quorum::GuardiansOnly),
            Err(WalletError::UnauthorisedSigner(owner.address()))
        );

        let guardians = v.verify(&digest(), &sign(&digest(), &[&guardian])).unwrap();
        assert_eq!(
            v.authorise(&guardians, Quorum::GuardiansOnly).unwrap(),
            Authority::Guardians(vec![guardian.address()])
        );
    }

    #[test]
    fn session_key_signs_alone() {
        let owner = TestKey::new(1);
        let session = TestKey::new(7);
        let mut record = record(&owner, &[]);
        record.session.create_or_refresh(session.address(), 100);
        let v = verifier(&record);

        let alone = v.verify(&digest(), &sign(&digest(), &[&session])).unwrap();
        assert_eq!(
            v.authorise(&alone, Quorum::OwnerAndGuardiansOrSession).unwrap(),
            Authority::Session(session.address())
        );
        assert_eq!(
            v.authorise(&alone, Quorum::OwnerOnly),
            Err(WalletError::UnauthorisedSigner(session.address()))
        );

        let mixed = v
            .verify(&digest(), &sign(&digest(), &[&owner, &session]))
            .unwrap();
        assert_eq!(
            v.authorise(&mixed, Quorum::OwnerAndGuardiansOrSession),
            Err(WalletError::UnauthorisedSigner(session.address()))
        );

    }

    #[test]
    fn stale_session_key_fails_verification() {
        let owner = TestKey::new(1);
        let session = TestKey::new(7);
        let mut record = record(&owner, &[]);
        record.session.create_or_refresh(session.address(), 100);
        let signatures = sign(&digest(), &[&session]);

        let at_expiry = SignatureVerifier::new(&record, QuorumRule::Majority, None, 100);
        assert_eq!(
            at_expiry.verify(&digest(), &signatures),
            Err(WalletError::SessionExpired)
        );

        record.session.create_or_refresh(session.address(), 0);
        assert_eq!(
            verifier(&record).verify(&digest(), &signatures),
            Err(WalletError::SessionExpired)
        );
    }

    struct AcceptAll;

    impl DelegatedVerifier for AcceptAll {
        fn is_valid_signature(&self, _: Address, _: B256, signature: &[u8]) -> bool {
            signature == b"ok"
        }
    }

    #[test]
    fn delegated_guardians_forward_to_verifier() {
        let owner = TestKey::new(1);
        let contract_guardian = Address::repeat_byte(0xcc);
        let mut record = record(&owner, &[]);
        record
            .add_guardian(GuardianSigner::delegated(contract_guardian), 0, &WINDOW)
            .unwrap();

        let signatures = vec![SignerSignature {
            signer: contract_guardian,
            signature: b"ok".to_vec().into(),
        }];

        let without = SignatureVerifier::new(&record, QuorumRule::Majority, None, 0);
        assert!(without.verify(&digest(), &signatures).is_err());

        let verifier = AcceptAll;
        let with = SignatureVerifier::new(&record, QuorumRule::Majority, Some(&verifier), 0);
        let signers = with.verify(&digest(), &signatures).unwrap();
        assert_eq!(signers.guardians, vec![contract_guardian]);
    }

    #[test]
    fn payload_binds_domain_and_nonce() {
        let request = crate::testing::request(
            Address::repeat_byte(0xee),
            1,
            CallKind::SecurityChange {
                change: SecurityChange::Lock,
            },
        );
        let mut other = request.clone();
        other.nonce = 2;

        assert_ne!(relay_digest(1, &request), relay_digest(2, &request));
        assert_ne!(relay_digest(1, &request), relay_digest(1, &other));

        // relayer and claimed amount are not signed
        let mut relayed = request.clone();
        relayed.relayer = Address::repeat_byte(0x42);
        relayed.refund_amount = U256::from(7u64);
        assert_eq!(relay_digest(1, &request), relay_digest(1, &relayed));
    }
}
