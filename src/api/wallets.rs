// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet registration, status queries and the unsigned time-gated
//! completions (recovery finalization, guardian removal).

use alloy::primitives::Address;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{engine::WalletStatus, error::ApiError, state::AppState};

/// Request to register a deployed wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWalletRequest {
    pub wallet: Address,
    pub owner: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistResponse {
    pub wallet: Address,
    pub target: Address,
    /// Whether the target is usable in whitelist-gated batches now.
    pub whitelisted: bool,
    /// When the target was added; absent when it never was.
    pub trusted_at: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryFinalizedResponse {
    pub wallet: Address,
    pub owner: Address,
}

/// Register a wallet with its initial owner.
pub async fn register_wallet(
    State(state): State<AppState>,
    Json(request): Json<RegisterWalletRequest>,
) -> Result<(StatusCode, Json<WalletStatus>), ApiError> {
    let mut engine = state.engine.write().await;
    engine.register_wallet(request.wallet, request.owner)?;
    let status = engine.wallet_status(&request.wallet)?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Path(wallet): Path<Address>,
) -> Result<Json<WalletStatus>, ApiError> {
    let engine = state.engine.read().await;
    Ok(Json(engine.wallet_status(&wallet)?))
}

pub async fn get_whitelist_entry(
    State(state): State<AppState>,
    Path((wallet, target)): Path<(Address, Address)>,
) -> Result<Json<WhitelistResponse>, ApiError> {
    let engine = state.engine.read().await;
    let record = engine.record(&wallet)?;
    Ok(Json(WhitelistResponse {
        wallet,
        target,
        whitelisted: engine.is_whitelisted(&wallet, &target)?,
        trusted_at: record.whitelist.trusted_at(&target),
    }))
}

/// Finalize a matured recovery. Needs no signature.
pub async fn finalize_recovery(
    State(state): State<AppState>,
    Path(wallet): Path<Address>,
) -> Result<Json<RecoveryFinalizedResponse>, ApiError> {
    let mut engine = state.engine.write().await;
    let owner = engine.finalize_recovery(wallet)?;
    Ok(Json(RecoveryFinalizedResponse { wallet, owner }))
}

/// Confirm a matured guardian removal. Needs no signature.
pub async fn confirm_guardian_removal(
    State(state): State<AppState>,
    Path((wallet, guardian)): Path<(Address, Address)>,
) -> Result<Json<WalletStatus>, ApiError> {
    let mut engine = state.engine.write().await;
    engine.confirm_guardian_removal(wallet, guardian)?;
    Ok(Json(engine.wallet_status(&wallet)?))
}
