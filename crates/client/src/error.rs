// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Failures surfaced by the request gate.
///
/// Server-reported failures are *not* errors at this layer: any response
/// the remote API produces, success or not, comes back as an
/// [`crate::session::gate::ApiResponse`] and is the feature caller's to
/// interpret. `GateError` covers only the cases where no usable response
/// exists.
#[derive(Debug)]
pub enum GateError {
    /// The session could not be recovered: the user declined the prompt,
    /// the prompt timed out, or the refresh was rejected. The caller's
    /// request was never sent.
    SessionExpired,
    /// An expired token was detected but no UI layer has registered a
    /// prompt receiver, so there is no recovery path.
    PromptUnavailable,
    /// Transport-level failure reaching the remote API.
    Network(reqwest::Error),
    /// The credential store could not be read or written.
    Storage(String),
}

impl GateError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::PromptUnavailable => "PROMPT_UNAVAILABLE",
            Self::Network(_) => "NETWORK",
            Self::Storage(_) => "STORAGE",
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionExpired => f.write_str("session expired and was not recovered"),
            Self::PromptUnavailable => {
                f.write_str("session expired, no recovery path available (no prompt handler)")
            }
            Self::Network(e) => write!(f, "network error: {e}"),
            Self::Storage(msg) => write!(f, "credential storage error: {msg}"),
        }
    }
}

impl std::error::Error for GateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GateError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e)
    }
}

/// Failures from the token refresh flow.
///
/// All variants are fatal for the current session (the coordinator
/// escalates to a full logout); the split exists so logs and events can
/// say why.
#[derive(Debug)]
pub enum RefreshError {
    /// No credential is stored, so there is no refresh token to spend.
    NoCredential,
    /// The server rejected the refresh token (invalid, expired, revoked).
    Rejected { status: u16, body: String },
    /// Transport-level failure before a verdict was reached.
    Network(String),
    /// The new credential could not be persisted. The store is left
    /// untouched — no partial writes.
    Storage(String),
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredential => f.write_str("no credential to refresh"),
            Self::Rejected { status, body } => write!(f, "refresh rejected ({status}): {body}"),
            Self::Network(msg) => write!(f, "refresh network error: {msg}"),
            Self::Storage(msg) => write!(f, "refresh storage error: {msg}"),
        }
    }
}

impl std::error::Error for RefreshError {}
