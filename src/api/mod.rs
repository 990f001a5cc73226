// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

pub mod admin;
pub mod health;
pub mod relay;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/relay", post(relay::relay))
        .route("/digest", post(relay::digest))
        .route("/wallets", post(wallets::register_wallet))
        .route("/wallets/{wallet}", get(wallets::get_wallet))
        .route(
            "/wallets/{wallet}/whitelist/{target}",
            get(wallets::get_whitelist_entry),
        )
        .route(
            "/wallets/{wallet}/recovery/finalize",
            post(wallets::finalize_recovery),
        )
        .route(
            "/wallets/{wallet}/guardians/{guardian}/confirm-removal",
            post(wallets::confirm_guardian_removal),
        )
        .route("/admin/wallets", get(admin::list_wallets))
        .route(
            "/admin/authorisations",
            get(admin::list_authorisations).post(admin::add_authorisation),
        )
        .route(
            "/admin/authorisations/{target}",
            delete(admin::remove_authorisation),
        );

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}
