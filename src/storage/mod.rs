//! Durable client storage for the session credential.
//!
//! The dashboard keeps exactly one value across restarts: the opaque session
//! token stored under [`AUTH_TOKEN_KEY`]. Its presence at boot makes the
//! store assume an authenticated session until the profile load says
//! otherwise.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::errors::StorageError;

/// Key under which the session token is persisted.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Persistent holder of the session token.
pub trait CredentialStorage: Send + Sync {
    /// Return the stored token, if any.
    fn token(&self) -> Result<Option<String>, StorageError>;

    /// Persist `token`, replacing any previous value.
    fn set_token(&self, token: &str) -> Result<(), StorageError>;

    /// Forget the stored token. Removing an absent token succeeds.
    fn clear_token(&self) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Process-local storage, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStorage {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that starts out holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStorage for MemoryCredentialStorage {
    fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.token.read().clone())
    }

    fn set_token(&self, token: &str) -> Result<(), StorageError> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<(), StorageError> {
        *self.token.write() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// Key/value JSON file on disk.
///
/// The file is a flat JSON object; only [`AUTH_TOKEN_KEY`] is read or
/// written, other keys are preserved untouched.
#[derive(Debug)]
pub struct FileCredentialStorage {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileCredentialStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl CredentialStorage for FileCredentialStorage {
    fn token(&self) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.read();
        Ok(self.read_entries()?.remove(AUTH_TOKEN_KEY))
    }

    fn set_token(&self, token: &str) -> Result<(), StorageError> {
        let _guard = self.lock.write();
        let mut entries = self.read_entries()?;
        entries.insert(AUTH_TOKEN_KEY.to_string(), token.to_string());
        self.write_entries(&entries)
    }

    fn clear_token(&self) -> Result<(), StorageError> {
        let _guard = self.lock.write();
        let mut entries = self.read_entries()?;
        if entries.remove(AUTH_TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}
