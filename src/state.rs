// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::engine::Engine;
use crate::ledger::Ledger;
use crate::storage::SecurityStore;

/// Engine behind the HTTP server, with the backends chosen at startup.
pub type ServiceEngine =
    Engine<Box<dyn SecurityStore + Send + Sync>, Box<dyn Ledger + Send + Sync>>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<ServiceEngine>>,
    /// Bearer token of the admin routes; admin is disabled when `None`.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(engine: ServiceEngine, admin_token: Option<String>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            admin_token: admin_token.map(Arc::from),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory engine over `ledger` on a manual clock.
    pub fn for_testing(
        clock: Arc<crate::clock::ManualClock>,
        ledger: crate::ledger::MemoryLedger,
        admin_token: Option<&str>,
    ) -> Self {
        let engine = Engine::new(
            crate::config::EngineConfig::for_testing(),
            Box::new(crate::storage::MemoryStore::new()) as Box<dyn SecurityStore + Send + Sync>,
            Box::new(ledger) as Box<dyn Ledger + Send + Sync>,
            clock,
        )
        .expect("engine starts");
        Self::new(engine, admin_token.map(str::to_string))
    }
}
