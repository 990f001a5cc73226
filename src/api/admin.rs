// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! These endpoints require the `ADMIN_TOKEN` bearer token and manage the
//! process-wide authoriser table:
//! - List, add and remove vetted targets
//! - List registered wallets

use alloy::primitives::Address;
use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use k256::elliptic_curve::subtle::ConstantTimeEq;
use serde::{Deserialize, Serialize};

use crate::{authoriser::AuthorisationRule, error::ApiError, state::AppState};

/// Extractor that admits only requests carrying the admin bearer token.
pub struct AdminOnly;

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let expected = state
            .admin_token
            .as_deref()
            .ok_or_else(|| ApiError::forbidden("admin API is disabled"))?;

        let provided = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

        if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            tracing::warn!("Rejected admin request with invalid token");
            return Err(ApiError::unauthorized("invalid admin token"));
        }
        Ok(AdminOnly)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorisationListResponse {
    pub rules: Vec<AuthorisationRule>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveAuthorisationResponse {
    pub target: Address,
    /// `false` when the target held no rule.
    pub removed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletListResponse {
    pub wallets: Vec<Address>,
    pub total: usize,
}

pub async fn list_authorisations(
    _admin: AdminOnly,
    State(state): State<AppState>,
) -> Json<AuthorisationListResponse> {
    let engine = state.engine.read().await;
    let rules: Vec<_> = engine.authoriser().rules().cloned().collect();
    Json(AuthorisationListResponse {
        total: rules.len(),
        rules,
    })
}

/// Insert or replace the rule for `rule.target`.
pub async fn add_authorisation(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Json(rule): Json<AuthorisationRule>,
) -> Result<(StatusCode, Json<AuthorisationRule>), ApiError> {
    if rule.target.is_zero() {
        return Err(ApiError::bad_request("target must not be the zero address"));
    }
    let mut engine = state.engine.write().await;
    engine.add_authorisation(rule.clone())?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn remove_authorisation(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Path(target): Path<Address>,
) -> Result<Json<RemoveAuthorisationResponse>, ApiError> {
    let mut engine = state.engine.write().await;
    let removed = engine.remove_authorisation(target)?;
    Ok(Json(RemoveAuthorisationResponse { target, removed }))
}

pub async fn list_wallets(
    _admin: AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<WalletListResponse>, ApiError> {
    let engine = state.engine.read().await;
    let wallets = engine
        .store()
        .wallets()
        .map_err(crate::error::WalletError::from)?;
    Ok(Json(WalletListResponse {
        total: wallets.len(),
        wallets,
    }))
}
