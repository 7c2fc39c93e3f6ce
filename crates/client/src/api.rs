// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth feature callers: login, register, logout, and thin gated-request
//! helpers. Everything else the remote API offers is some other
//! caller's concern — it goes through [`RequestGate::send`] directly.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::GateError;
use crate::events::{LogoutReason, SessionEvent};
use crate::session::gate::{ApiRequest, ApiResponse, SendOptions};
use crate::session::store::{epoch_ms, Credential, CurrentUser};
use crate::session::Session;

/// Response from `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: CurrentUser,
    access_token: String,
    refresh_token: String,
    /// Access-token lifetime in seconds.
    expires_in: u64,
}

impl Session {
    /// Authenticate and persist the issued credential and user.
    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<CurrentUser> {
        let req =
            ApiRequest::post("/auth/login", json!({ "email": email, "password": password }));
        let resp = self.gate().send(req, SendOptions::skip_auth()).await?;
        if !resp.is_success() {
            anyhow::bail!("login failed: {}", resp.message());
        }
        self.install_credentials(resp.body)
    }

    /// Create an account and persist the issued credential and user.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<CurrentUser> {
        let req = ApiRequest::post(
            "/auth/register",
            json!({ "name": name, "email": email, "password": password }),
        );
        let resp = self.gate().send(req, SendOptions::skip_auth()).await?;
        if !resp.is_success() {
            anyhow::bail!("registration failed: {}", resp.message());
        }
        self.install_credentials(resp.body)
    }

    /// End the session. Server-side invalidation is best-effort; local
    /// credential clearing proceeds regardless of its outcome.
    pub async fn logout(&self) -> anyhow::Result<()> {
        if let Some(cred) = self.store().load()? {
            let req =
                ApiRequest::post("/auth/logout", json!({ "refresh_token": cred.refresh_token }));
            match self.gate().send(req, SendOptions::skip_auth()).await {
                Ok(resp) if !resp.is_success() => {
                    tracing::warn!(status = resp.status, "server-side logout failed");
                }
                Err(e) => {
                    tracing::warn!(err = %e, "server-side logout unreachable");
                }
                Ok(_) => {}
            }
        }
        self.coordinator().force_logout(LogoutReason::UserChoice).await;
        Ok(())
    }

    /// The locally persisted identity, if any.
    pub fn current_user(&self) -> anyhow::Result<Option<CurrentUser>> {
        self.store().load_user()
    }

    /// Gated GET to an arbitrary API path.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, GateError> {
        self.gate().send(ApiRequest::get(path), SendOptions::default()).await
    }

    fn install_credentials(&self, body: Value) -> anyhow::Result<CurrentUser> {
        let auth: AuthResponse = serde_json::from_value(body)?;
        let cred = Credential {
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            expires_at_ms: epoch_ms() + auth.expires_in * 1000,
        };
        self.store().save(&cred)?;
        self.store().save_user(&auth.user)?;
        self.oracle().invalidate();
        self.coordinator().emit(SessionEvent::LoggedIn { user: auth.user.clone() });
        tracing::info!(user = %auth.user.email, "logged in");
        Ok(auth.user)
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
