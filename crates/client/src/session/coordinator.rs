// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session coordinator: bridges the request layer and the UI layer.
//!
//! When the gate detects an expired token it suspends the caller here.
//! The first caller of an episode becomes the driver: it delivers the
//! session-expired prompt to the registered UI receiver, awaits the
//! user's choice (bounded by a timeout), and either runs the refresh
//! flow or the logout path. Callers arriving while a prompt is already
//! open enqueue behind it — exactly one prompt per episode, and every
//! blocked caller is resumed exactly once or aborted, never dropped.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, Mutex};

use crate::error::GateError;
use crate::events::{LogoutReason, SessionEvent};
use crate::session::oracle::ExpiryOracle;
use crate::session::refresh::RefreshFlow;
use crate::session::store::CredentialStore;

/// How a suspended caller should proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Credentials were refreshed; re-enter the gate with the new token.
    Retry,
    /// The session ended; the original request is never sent.
    Abort,
}

/// The user's answer to the session-expired prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Continue,
    LogOut,
}

/// A prompt delivered to the UI layer. Reply by sending the choice on
/// `reply`; dropping it counts as "log out".
#[derive(Debug)]
pub struct PromptRequest {
    pub reply: oneshot::Sender<PromptChoice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Normal,
    PromptVisible,
    Recovering,
}

struct Inner {
    state: GateState,
    /// Callers blocked on the current episode, in arrival order.
    waiters: Vec<oneshot::Sender<Resume>>,
}

pub struct SessionCoordinator {
    inner: Mutex<Inner>,
    prompt_tx: StdMutex<Option<mpsc::Sender<PromptRequest>>>,
    event_tx: broadcast::Sender<SessionEvent>,
    store: Arc<dyn CredentialStore>,
    oracle: Arc<ExpiryOracle>,
    refresh: RefreshFlow,
    prompt_timeout: Duration,
}

impl SessionCoordinator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        oracle: Arc<ExpiryOracle>,
        refresh: RefreshFlow,
        prompt_timeout: Duration,
    ) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            inner: Mutex::new(Inner { state: GateState::Normal, waiters: Vec::new() }),
            prompt_tx: StdMutex::new(None),
            event_tx,
            store,
            oracle,
            refresh,
            prompt_timeout,
        })
    }

    /// Register the UI layer and return the prompt receiver. Replaces any
    /// previous registration.
    pub fn register_prompt_handler(&self) -> mpsc::Receiver<PromptRequest> {
        let (tx, rx) = mpsc::channel(4);
        if let Ok(mut slot) = self.prompt_tx.lock() {
            *slot = Some(tx);
        }
        rx
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Suspend the caller until the current expiry episode resolves.
    ///
    /// Idempotent while a prompt is already open: later callers enqueue
    /// behind the visible prompt instead of opening a second one.
    pub async fn suspend_and_wait(&self) -> Result<Resume, GateError> {
        let waiter = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                GateState::Normal => {
                    inner.state = GateState::PromptVisible;
                    None
                }
                GateState::PromptVisible | GateState::Recovering => {
                    let (tx, rx) = oneshot::channel();
                    inner.waiters.push(tx);
                    tracing::debug!(
                        blocked = inner.waiters.len(),
                        "caller queued behind session-expired prompt"
                    );
                    Some(rx)
                }
            }
        };

        match waiter {
            Some(rx) => rx.await.map_err(|_| GateError::SessionExpired),
            None => self.drive_episode().await,
        }
    }

    /// Run one prompt episode as the driving caller.
    async fn drive_episode(&self) -> Result<Resume, GateError> {
        let prompt_tx = match self.prompt_tx.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        let Some(prompt_tx) = prompt_tx else {
            // UI layer not mounted: fail explicitly instead of hanging.
            self.close_episode(Resume::Abort).await;
            return Err(GateError::PromptUnavailable);
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        if prompt_tx.send(PromptRequest { reply: reply_tx }).await.is_err() {
            // Receiver dropped since registration.
            if let Ok(mut slot) = self.prompt_tx.lock() {
                *slot = None;
            }
            self.close_episode(Resume::Abort).await;
            return Err(GateError::PromptUnavailable);
        }
        self.emit(SessionEvent::PromptShown);
        tracing::info!("access token expired, session-expired prompt shown");

        let choice = match tokio::time::timeout(self.prompt_timeout, reply_rx).await {
            Ok(Ok(choice)) => choice,
            Ok(Err(_)) => {
                tracing::warn!("prompt reply dropped, treating as log out");
                return Ok(self.logout_path(LogoutReason::UserChoice).await);
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.prompt_timeout.as_secs(),
                    "session-expired prompt unanswered, forcing logout"
                );
                return Ok(self.logout_path(LogoutReason::PromptTimeout).await);
            }
        };

        match choice {
            PromptChoice::Continue => {
                {
                    let mut inner = self.inner.lock().await;
                    inner.state = GateState::Recovering;
                }
                match self.refresh.refresh().await {
                    Ok(_) => {
                        self.emit(SessionEvent::Refreshed);
                        self.close_episode(Resume::Retry).await;
                        Ok(Resume::Retry)
                    }
                    Err(e) => {
                        tracing::warn!(err = %e, "session refresh failed, logging out");
                        Ok(self.logout_path(LogoutReason::RefreshFailed).await)
                    }
                }
            }
            PromptChoice::LogOut => Ok(self.logout_path(LogoutReason::UserChoice).await),
        }
    }

    /// Clear all local session state and abort any blocked callers.
    ///
    /// Shared by the prompt's "log out" choice, refresh failure, the
    /// prompt timeout, and the explicit logout feature caller. Queued
    /// resumes are discarded without being invoked.
    pub async fn force_logout(&self, reason: LogoutReason) {
        let _ = self.logout_path(reason).await;
    }

    async fn logout_path(&self, reason: LogoutReason) -> Resume {
        if let Err(e) = self.store.clear() {
            tracing::warn!(err = %e, "failed to clear credential");
        }
        if let Err(e) = self.store.clear_user() {
            tracing::warn!(err = %e, "failed to clear current user");
        }
        self.oracle.invalidate();
        self.close_episode(Resume::Abort).await;
        self.emit(SessionEvent::LoggedOut { reason });
        tracing::info!(reason = %reason, "session ended");
        Resume::Abort
    }

    /// Return to `Normal` and resolve every queued waiter, in arrival
    /// order, with the episode's outcome.
    async fn close_episode(&self, resume: Resume) {
        let waiters = {
            let mut inner = self.inner.lock().await;
            inner.state = GateState::Normal;
            std::mem::take(&mut inner.waiters)
        };
        for tx in waiters {
            let _ = tx.send(resume);
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
