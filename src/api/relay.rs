// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relayer endpoints.
//!
//! A relayer first asks for the digest of an unsigned request, collects the
//! signatures off-band, then submits the signed request.

use alloy::primitives::{Address, Bytes, B256};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    models::{RelayReceipt, RelayRequest},
    signing::relay_payload,
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestResponse {
    pub wallet: Address,
    /// Digest every signer signs.
    pub digest: B256,
    /// Canonical payload the digest is computed from.
    pub payload: Bytes,
    /// Nonce the next accepted request must carry.
    pub next_nonce: u64,
}

/// Compute the digest of a request. Signatures in the body are ignored.
pub async fn digest(
    State(state): State<AppState>,
    Json(request): Json<RelayRequest>,
) -> Result<Json<DigestResponse>, ApiError> {
    let engine = state.engine.read().await;
    let current = engine.nonce(&request.wallet)?;
    Ok(Json(DigestResponse {
        wallet: request.wallet,
        digest: engine.digest(&request),
        payload: relay_payload(engine.config().domain, &request).into(),
        next_nonce: current.saturating_add(1),
    }))
}

/// Submit a signed request.
pub async fn relay(
    State(state): State<AppState>,
    Json(request): Json<RelayRequest>,
) -> Result<Json<RelayReceipt>, ApiError> {
    let mut engine = state.engine.write().await;
    Ok(Json(engine.relay(request)?))
}
