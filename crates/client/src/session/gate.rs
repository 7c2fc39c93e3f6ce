// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request gate: every outgoing authenticated request goes through here.
//!
//! The gate consults the expiry oracle before a request leaves the
//! process. A valid (or absent) credential means the request is sent
//! immediately, with a bearer header when a token exists. An expired
//! credential means the request is withheld and the caller suspends on
//! the session coordinator; on [`Resume::Retry`] the gate re-enters its
//! own loop and sends with the fresh token.

use std::sync::Arc;

use serde_json::Value;

use crate::error::GateError;
use crate::session::coordinator::{Resume, SessionCoordinator};
use crate::session::oracle::ExpiryOracle;
use crate::session::store::CredentialStore;

/// A request to the remote API, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: reqwest::Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: reqwest::Method::GET, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self { method: reqwest::Method::POST, path: path.into(), body: Some(body) }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: reqwest::Method::DELETE, path: path.into(), body: None }
    }
}

/// Options for a single send.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    /// Bypass the entire expiry mechanism. Set by login, register,
    /// refresh, and logout — gating those would deadlock the system on
    /// itself.
    pub skip_authentication: bool,
}

impl SendOptions {
    pub fn skip_auth() -> Self {
        Self { skip_authentication: true }
    }
}

/// The remote API's answer, success or not. Server-reported failures
/// pass through untouched — the gate does not interpret them.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort human-readable message from an error body.
    pub fn message(&self) -> String {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}

pub struct RequestGate {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    oracle: Arc<ExpiryOracle>,
    coordinator: Arc<SessionCoordinator>,
}

impl RequestGate {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        oracle: Arc<ExpiryOracle>,
        coordinator: Arc<SessionCoordinator>,
    ) -> Self {
        Self { http, base_url: base_url.trim_end_matches('/').to_owned(), store, oracle, coordinator }
    }

    /// Send a request through the gate.
    pub async fn send(&self, req: ApiRequest, opts: SendOptions) -> Result<ApiResponse, GateError> {
        if opts.skip_authentication {
            return self.dispatch(&req, None).await;
        }

        loop {
            if self.oracle.is_expired()? {
                match self.coordinator.suspend_and_wait().await? {
                    Resume::Retry => continue,
                    Resume::Abort => return Err(GateError::SessionExpired),
                }
            }

            // Absent credential: anonymous request, no bearer header.
            let token = self
                .store
                .load()
                .map_err(|e| GateError::Storage(e.to_string()))?
                .map(|c| c.access_token);
            return self.dispatch(&req, token.as_deref()).await;
        }
    }

    async fn dispatch(
        &self,
        req: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, GateError> {
        let url = format!("{}{}", self.base_url, req.path);
        let mut builder = self.http.request(req.method.clone(), &url);
        if let Some(ref body) = req.body {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        tracing::debug!(method = %req.method, path = %req.path, status, "request dispatched");
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
