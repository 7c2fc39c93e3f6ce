// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token refresh: exchange the refresh token for a new access token.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RefreshError;
use crate::session::oracle::ExpiryOracle;
use crate::session::store::{epoch_ms, Credential, CredentialStore};

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Token response from `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    /// Present when the server rotates the refresh token.
    #[serde(default)]
    refresh_token: Option<String>,
    /// Token lifetime in seconds.
    expires_in: u64,
}

/// Exchanges the stored refresh token for a fresh credential.
///
/// The refresh call posts directly to the API (the equivalent of a
/// gated request with authentication skipped — the old access token is
/// by definition unusable). On success the full new credential is
/// written in a single store write and the expiry memo is invalidated.
/// On any failure the store is left untouched.
pub struct RefreshFlow {
    http: reqwest::Client,
    refresh_url: String,
    store: Arc<dyn CredentialStore>,
    oracle: Arc<ExpiryOracle>,
}

impl RefreshFlow {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        oracle: Arc<ExpiryOracle>,
    ) -> Self {
        let refresh_url = format!("{}/auth/refresh", base_url.trim_end_matches('/'));
        Self { http, refresh_url, store, oracle }
    }

    /// Perform a single refresh attempt.
    ///
    /// No retries: a rejected or unreachable refresh is fatal for the
    /// session and the coordinator escalates to a full logout.
    pub async fn refresh(&self) -> Result<Credential, RefreshError> {
        let current = self
            .store
            .load()
            .map_err(|e| RefreshError::Storage(e.to_string()))?
            .ok_or(RefreshError::NoCredential)?;

        let resp = self
            .http
            .post(&self.refresh_url)
            .json(&RefreshRequest { refresh_token: &current.refresh_token })
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected { status: status.as_u16(), body });
        }

        let token: RefreshResponse =
            resp.json().await.map_err(|e| RefreshError::Network(e.to_string()))?;

        let cred = Credential {
            access_token: token.access_token,
            // Keep the old refresh token unless the server rotated it.
            refresh_token: token.refresh_token.unwrap_or(current.refresh_token),
            expires_at_ms: epoch_ms() + token.expires_in * 1000,
        };
        self.store.save(&cred).map_err(|e| RefreshError::Storage(e.to_string()))?;
        self.oracle.invalidate();

        tracing::info!(expires_in = token.expires_in, "access token refreshed");
        Ok(cred)
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
