// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

/// Configuration for the tourbook client.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Base URL of the tour-booking API.
    #[arg(long, default_value = "http://127.0.0.1:3000/api/v1", env = "TOURBOOK_API_URL")]
    pub api_url: String,

    /// Directory for persisted session state. Defaults to the XDG state dir.
    #[arg(long, env = "TOURBOOK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Freshness window for the expiry memo in milliseconds. A memo older
    /// than this is recomputed from the credential store.
    #[arg(long, default_value_t = 1000, env = "TOURBOOK_EXPIRY_MEMO_MS")]
    pub expiry_memo_ms: u64,

    /// Seconds an unanswered session-expired prompt may stay open before
    /// the logout path is forced.
    #[arg(long, default_value_t = 120, env = "TOURBOOK_PROMPT_TIMEOUT_SECS")]
    pub prompt_timeout_secs: u64,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 30, env = "TOURBOOK_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: u64,
}

impl ClientConfig {
    pub fn expiry_memo_window_ms(&self) -> u64 {
        self.expiry_memo_ms
    }

    pub fn prompt_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.prompt_timeout_secs)
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }

    /// Resolve the state directory for persisted session data.
    ///
    /// Explicit `--state-dir` wins, then `$XDG_STATE_HOME/tourbook`,
    /// then `$HOME/.local/state/tourbook`.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.state_dir {
            return dir.clone();
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("tourbook");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/state/tourbook");
        }
        PathBuf::from(".tourbook")
    }
}
