// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Domain errors of the authorization engine.
//!
//! Every rejected relay or security change resolves to exactly one
//! [`WalletError`]. None of them is retryable as-is: the caller must change
//! the request (new nonce, more signatures) or wait for time to pass.

use alloy::primitives::Address;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("invalid nonce: expected {expected}, got {provided}")]
    InvalidNonce { expected: u64, provided: u64 },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signer {0} is not authorised for this operation")]
    UnauthorisedSigner(Address),

    #[error("target {0} is not whitelisted")]
    NotWhitelisted(Address),

    #[error("target {0} is not authorised")]
    NotAuthorised(Address),

    #[error("spender {spender} is not authorised for calls to {target}")]
    SpenderNotAuthorised { target: Address, spender: Address },

    #[error("session key has expired")]
    SessionExpired,

    #[error("session key is not allowed to {0}")]
    SessionScopeViolation(String),

    #[error("wallet is locked")]
    WalletLocked,

    #[error("wallet is not locked")]
    NotLocked,

    #[error("wallet is locked by a pending recovery")]
    LockedByRecovery,

    #[error("pending change for {0} has expired")]
    PendingExpired(Address),

    #[error("pending change for {0} cannot be confirmed yet")]
    PendingNotMature(Address),

    #[error("no pending change for {0}")]
    NotPending(Address),

    #[error("a recovery is already pending")]
    RecoveryAlreadyPending,

    #[error("no recovery is pending")]
    RecoveryNotPending,

    #[error("recovery cannot be finalized before {ready_at}")]
    RecoveryNotYetMature { ready_at: u64 },

    #[error("guardian {0} already has a pending change")]
    GuardianAlreadyPending(Address),

    #[error("{0} is already an active guardian")]
    GuardianAlreadyActive(Address),

    #[error("{0} is not a guardian")]
    NotGuardian(Address),

    #[error("{0} cannot be a guardian of this wallet")]
    InvalidGuardian(Address),

    #[error("{0} cannot become the owner of this wallet")]
    InvalidOwner(Address),

    #[error("{0} is not a valid target")]
    InvalidTarget(Address),

    #[error("unknown wallet {0}")]
    UnknownWallet(Address),

    #[error("wallet {0} is already registered")]
    WalletExists(Address),

    #[error("call {index} failed: {reason}")]
    CallFailed { index: usize, reason: String },

    #[error("refund failed: {0}")]
    RefundFailed(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl WalletError {
    /// Stable machine-readable identifier.
    pub fn error_code(&self) -> &'static str {
        match self {
            WalletError::InvalidNonce { .. } => "invalid_nonce",
            WalletError::InvalidSignature(_) => "invalid_signature",
            WalletError::UnauthorisedSigner(_) => "unauthorised_signer",
            WalletError::NotWhitelisted(_) => "not_whitelisted",
            WalletError::NotAuthorised(_) => "not_authorised",
            WalletError::SpenderNotAuthorised { .. } => "spender_not_authorised",
            WalletError::SessionExpired => "session_expired",
            WalletError::SessionScopeViolation(_) => "session_scope_violation",
            WalletError::WalletLocked => "wallet_locked",
            WalletError::NotLocked => "not_locked",
            WalletError::LockedByRecovery => "locked_by_recovery",
            WalletError::PendingExpired(_) => "pending_expired",
            WalletError::PendingNotMature(_) => "pending_not_mature",
            WalletError::NotPending(_) => "not_pending",
            WalletError::RecoveryAlreadyPending => "recovery_already_pending",
            WalletError::RecoveryNotPending => "recovery_not_pending",
            WalletError::RecoveryNotYetMature { .. } => "recovery_not_yet_mature",
            WalletError::GuardianAlreadyPending(_) => "guardian_already_pending",
            WalletError::GuardianAlreadyActive(_) => "guardian_already_active",
            WalletError::NotGuardian(_) => "not_guardian",
            WalletError::InvalidGuardian(_) => "invalid_guardian",
            WalletError::InvalidOwner(_) => "invalid_owner",
            WalletError::InvalidTarget(_) => "invalid_target",
            WalletError::UnknownWallet(_) => "unknown_wallet",
            WalletError::WalletExists(_) => "wallet_exists",
            WalletError::CallFailed { .. } => "call_failed",
            WalletError::RefundFailed(_) => "refund_failed",
            WalletError::Storage(_) => "storage_error",
        }
    }

    /// HTTP status used when the error crosses the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WalletError::InvalidSignature(_) | WalletError::UnauthorisedSigner(_) => {
                StatusCode::UNAUTHORIZED
            }
            WalletError::NotWhitelisted(_)
            | WalletError::NotAuthorised(_)
            | WalletError::SpenderNotAuthorised { .. }
            | WalletError::SessionExpired
            | WalletError::SessionScopeViolation(_) => StatusCode::FORBIDDEN,
            WalletError::UnknownWallet(_) => StatusCode::NOT_FOUND,
            WalletError::InvalidNonce { .. }
            | WalletError::WalletLocked
            | WalletError::LockedByRecovery
            | WalletError::RecoveryAlreadyPending
            | WalletError::GuardianAlreadyPending(_)
            | WalletError::GuardianAlreadyActive(_)
            | WalletError::WalletExists(_) => StatusCode::CONFLICT,
            WalletError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<StorageError> for WalletError {
    fn from(err: StorageError) -> Self {
        WalletError::Storage(err.to_string())
    }
}

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        Self::new(err.status_code(), err.error_code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn error_codes_are_snake_case() {
        let samples = [
            WalletError::InvalidNonce {
                expected: 2,
                provided: 1,
            },
            WalletError::SessionExpired,
            WalletError::RecoveryNotYetMature { ready_at: 10 },
            WalletError::CallFailed {
                index: 0,
                reason: "reverted".into(),
            },
            WalletError::Storage("disk".into()),
        ];
        for err in samples {
            let code = err.error_code();
            assert!(code.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{code}");
        }
    }

    #[test]
    fn status_codes_group_by_cause() {
        assert_eq!(
            WalletError::InvalidSignature("bad".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WalletError::NotWhitelisted(Address::ZERO).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(WalletError::WalletLocked.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            WalletError::UnknownWallet(Address::ZERO).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WalletError::PendingExpired(Address::ZERO).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn display_includes_context() {
        let err = WalletError::InvalidNonce {
            expected: 5,
            provided: 4,
        };
        assert_eq!(err.to_string(), "invalid nonce: expected 5, got 4");
    }

    #[test]
    fn api_error_takes_status_and_code_from_wallet_error() {
        let err = ApiError::from(WalletError::SessionExpired);
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "session_expired");
        assert_eq!(err.message, "session key has expired");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(
            body,
            r#"{"success":false,"error":"bad data","error_code":"bad_request"}"#
        );
    }
}
