// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memoized "is the access token expired?" check.
//!
//! A page action can fan out into several parallel requests; without the
//! memo each would re-read the credential store within the same instant.
//! The freshness window amortizes those reads without meaningfully
//! delaying detection of a newly expired token.

use std::sync::{Arc, Mutex};

use crate::error::GateError;
use crate::session::store::{epoch_ms, CredentialStore};

/// Cached expiry verdict. Never trusted past the freshness window.
#[derive(Debug, Clone, Copy)]
struct ExpiryMemo {
    expired: bool,
    checked_at_ms: u64,
}

pub struct ExpiryOracle {
    store: Arc<dyn CredentialStore>,
    memo_window_ms: u64,
    memo: Mutex<Option<ExpiryMemo>>,
}

impl ExpiryOracle {
    pub fn new(store: Arc<dyn CredentialStore>, memo_window_ms: u64) -> Self {
        Self { store, memo_window_ms, memo: Mutex::new(None) }
    }

    /// Is the access token currently expired?
    ///
    /// An absent credential is *not expired*: the caller is anonymous and
    /// the request proceeds without a bearer header — the server stays
    /// the sole authority on missing credentials.
    pub fn is_expired(&self) -> Result<bool, GateError> {
        self.is_expired_at(epoch_ms())
    }

    /// Inner check with the clock passed in, so boundary tests need no
    /// wall-clock sleeps.
    pub fn is_expired_at(&self, now_ms: u64) -> Result<bool, GateError> {
        let mut memo = self
            .memo
            .lock()
            .map_err(|_| GateError::Storage("expiry memo lock poisoned".to_owned()))?;

        if let Some(m) = *memo {
            if now_ms.saturating_sub(m.checked_at_ms) < self.memo_window_ms {
                return Ok(m.expired);
            }
        }

        let expired = match self.store.load().map_err(|e| GateError::Storage(e.to_string()))? {
            Some(cred) => cred.is_expired_at(now_ms),
            None => false,
        };
        *memo = Some(ExpiryMemo { expired, checked_at_ms: now_ms });
        Ok(expired)
    }

    /// Discard the memo so the next check re-reads storage. Called after
    /// any credential mutation (login, refresh, logout).
    pub fn invalidate(&self) {
        if let Ok(mut memo) = self.memo.lock() {
            *memo = None;
        }
    }
}

#[cfg(test)]
#[path = "oracle_tests.rs"]
mod tests;
