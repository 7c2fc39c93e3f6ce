// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: mock API servers and builders.

use std::sync::{Arc, Once};

use axum::Router;

use crate::config::ClientConfig;
use crate::session::store::{epoch_ms, Credential, CredentialStore, MemoryStore};

static CRYPTO_INIT: Once = Once::new();

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
pub fn ensure_crypto_provider() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Serve a router on an ephemeral port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    ensure_crypto_provider();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

pub fn test_config(api_url: &str) -> ClientConfig {
    ClientConfig {
        api_url: api_url.to_owned(),
        state_dir: None,
        expiry_memo_ms: 1000,
        prompt_timeout_secs: 5,
        http_timeout_secs: 5,
    }
}

pub fn valid_cred(access: &str) -> Credential {
    Credential {
        access_token: access.to_owned(),
        refresh_token: "refresh-1".to_owned(),
        expires_at_ms: epoch_ms() + 3_600_000,
    }
}

pub fn expired_cred(access: &str) -> Credential {
    Credential {
        access_token: access.to_owned(),
        refresh_token: "refresh-1".to_owned(),
        expires_at_ms: epoch_ms().saturating_sub(1000),
    }
}

pub fn store_with(cred: Option<Credential>) -> Arc<dyn CredentialStore> {
    ensure_crypto_provider();
    let store = MemoryStore::new();
    if let Some(c) = cred {
        store.save(&c).unwrap();
    }
    Arc::new(store)
}
