// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authenticated-request lifecycle core: credential storage, expiry
//! oracle, refresh flow, session coordinator, and request gate, wired
//! together by [`Session`].

pub mod coordinator;
pub mod gate;
pub mod oracle;
pub mod refresh;
pub mod store;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::ClientConfig;
use crate::events::SessionEvent;
use crate::session::coordinator::SessionCoordinator;
use crate::session::gate::RequestGate;
use crate::session::oracle::ExpiryOracle;
use crate::session::refresh::RefreshFlow;
use crate::session::store::{CredentialStore, FileStore};

/// One wired-up client session.
///
/// Constructed once at startup; the coordinator is shared between the
/// gate and the UI layer by reference, never through ambient globals.
pub struct Session {
    store: Arc<dyn CredentialStore>,
    oracle: Arc<ExpiryOracle>,
    coordinator: Arc<SessionCoordinator>,
    gate: RequestGate,
}

impl Session {
    pub fn new(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .unwrap_or_default();

        let oracle =
            Arc::new(ExpiryOracle::new(Arc::clone(&store), config.expiry_memo_window_ms()));
        let refresh = RefreshFlow::new(
            http.clone(),
            &config.api_url,
            Arc::clone(&store),
            Arc::clone(&oracle),
        );
        let coordinator = SessionCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&oracle),
            refresh,
            config.prompt_timeout(),
        );
        let gate = RequestGate::new(
            http,
            &config.api_url,
            Arc::clone(&store),
            Arc::clone(&oracle),
            Arc::clone(&coordinator),
        );

        Self { store, oracle, coordinator, gate }
    }

    /// Session backed by the on-disk store in the configured state dir.
    pub fn with_file_store(config: &ClientConfig) -> Self {
        Self::new(config, Arc::new(FileStore::new(config.state_dir())))
    }

    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn oracle(&self) -> &Arc<ExpiryOracle> {
        &self.oracle
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.coordinator.subscribe()
    }
}
