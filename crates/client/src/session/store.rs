// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential and user persistence: JSON files with atomic writes.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// A stored credential. The access token and its expiry live in one
/// struct behind one `Option`, so they can never be set or cleared
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as milliseconds since Unix epoch.
    pub expires_at_ms: u64,
}

impl Credential {
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at_ms <= now_ms
    }
}

/// The authenticated identity shown in UI. Persisted for reload
/// survival; not security-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
}

/// Durable storage for the credential and the current user.
///
/// Mutation discipline: the credential is written only by the refresh
/// flow and the login/logout paths. Reads must be cheap — the gate
/// consults the store on every request (amortized by the expiry memo).
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<Credential>>;
    fn save(&self, cred: &Credential) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;

    fn load_user(&self) -> anyhow::Result<Option<CurrentUser>>;
    fn save_user(&self, user: &CurrentUser) -> anyhow::Result<()>;
    fn clear_user(&self) -> anyhow::Result<()>;
}

/// File-backed store: `credential.json` and `user.json` under a state dir.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn credential_path(&self) -> PathBuf {
        self.dir.join("credential.json")
    }

    fn user_path(&self) -> PathBuf {
        self.dir.join("user.json")
    }

    fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save_json<T: Serialize>(&self, path: &Path, value: &T) -> anyhow::Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
        }
        atomic_write(path, &serde_json::to_string_pretty(value)?)
    }

    fn remove(path: &Path) -> anyhow::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> anyhow::Result<Option<Credential>> {
        Self::load_json(&self.credential_path())
    }

    fn save(&self, cred: &Credential) -> anyhow::Result<()> {
        self.save_json(&self.credential_path(), cred)
    }

    fn clear(&self) -> anyhow::Result<()> {
        Self::remove(&self.credential_path())
    }

    fn load_user(&self) -> anyhow::Result<Option<CurrentUser>> {
        Self::load_json(&self.user_path())
    }

    fn save_user(&self, user: &CurrentUser) -> anyhow::Result<()> {
        self.save_json(&self.user_path(), user)
    }

    fn clear_user(&self) -> anyhow::Result<()> {
        Self::remove(&self.user_path())
    }
}

/// Write a file atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) to avoid corruption when
/// concurrent saves race on the same `.tmp` file — a shorter write can
/// leave trailing bytes from a longer previous write.
fn atomic_write(path: &Path, contents: &str) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    cred: Mutex<Option<Credential>>,
    user: Mutex<Option<CurrentUser>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Option<Credential>> {
        Ok(self.cred.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?.clone())
    }

    fn save(&self, cred: &Credential) -> anyhow::Result<()> {
        *self.cred.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))? =
            Some(cred.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.cred.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))? = None;
        Ok(())
    }

    fn load_user(&self) -> anyhow::Result<Option<CurrentUser>> {
        Ok(self.user.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?.clone())
    }

    fn save_user(&self, user: &CurrentUser) -> anyhow::Result<()> {
        *self.user.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))? =
            Some(user.clone());
        Ok(())
    }

    fn clear_user(&self) -> anyhow::Result<()> {
        *self.user.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))? = None;
        Ok(())
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
