// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use relational_custody_guard::{
    api::router,
    clock::SystemClock,
    config::{EngineConfig, LogFormat, ServerConfig},
    engine::Engine,
    ledger::{Ledger, MemoryLedger},
    state::AppState,
    storage::{JsonlEventLog, RedbStore, SecurityStore},
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() {
    let server = ServerConfig::from_env().expect("Invalid server configuration");
    init_tracing(server.log_format);

    let engine_config = EngineConfig::from_env().expect("Invalid engine configuration");

    std::fs::create_dir_all(&server.data_dir).expect("Failed to create data directory");
    let store = RedbStore::open(&server.data_dir.join("custody.redb"))
        .expect("Failed to open security database");
    let events =
        JsonlEventLog::new(server.data_dir.join("events")).expect("Failed to open event log");

    // Balances live in memory; a chain-backed ledger plugs in here.
    let engine = Engine::new(
        engine_config,
        Box::new(store) as Box<dyn SecurityStore + Send + Sync>,
        Box::new(MemoryLedger::new()) as Box<dyn Ledger + Send + Sync>,
        Arc::new(SystemClock),
    )
    .expect("Failed to start authorization engine")
    .with_event_log(events);

    if server.admin_token.is_none() {
        info!("ADMIN_TOKEN not set, admin routes disabled");
    }

    let app = router(AppState::new(engine, server.admin_token.clone()));

    let addr = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    info!(address = %addr, data_dir = %server.data_dir.display(), "Custody guard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}
