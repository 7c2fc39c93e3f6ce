// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle events.
//!
//! Broadcast so the UI layer can react (show the logged-in user, return
//! to the landing view after a forced logout) without the coordinator
//! knowing anything about rendering.

use serde::{Deserialize, Serialize};

use crate::session::store::CurrentUser;

/// Events broadcast by the session core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A login or registration completed and credentials were stored.
    LoggedIn { user: CurrentUser },
    /// The session-expired prompt was shown to the user.
    PromptShown,
    /// The access token was refreshed; blocked requests are resuming.
    Refreshed,
    /// The session ended; local credentials and user are cleared.
    LoggedOut { reason: LogoutReason },
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user asked to log out (menu action or "log out" prompt choice).
    UserChoice,
    /// The refresh token was rejected or the refresh call failed.
    RefreshFailed,
    /// The session-expired prompt went unanswered past the timeout.
    PromptTimeout,
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserChoice => f.write_str("user_choice"),
            Self::RefreshFailed => f.write_str("refresh_failed"),
            Self::PromptTimeout => f.write_str("prompt_timeout"),
        }
    }
}
