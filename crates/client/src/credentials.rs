//! Durable storage for the bearer credential.
//!
//! The portal hands out a single bearer token per sign-in. It is the only
//! piece of session state that survives a restart; everything else is
//! rebuilt from `/users/me/`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to write credential to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove credential at {path:?}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Storage for the bearer credential.
pub trait CredentialStore: Send + Sync + core::fmt::Debug {
    /// The stored token, if any.
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str) -> Result<(), CredentialError>;

    fn clear(&self) -> Result<(), CredentialError>;

    /// Whether `token` is still usable. Only the embedded expiry is checked;
    /// the signature is the backend's concern.
    fn is_valid(&self, token: &str) -> bool {
        workportal_auth::is_token_valid(token, Utc::now())
    }

    /// The stored token when it is present and unexpired.
    fn get_valid(&self) -> Option<String> {
        self.get().filter(|token| self.is_valid(token))
    }
}

/// File-backed credential store (survives restarts).
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "failed to read stored credential");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), CredentialError> {
        let write_err = |source| CredentialError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, token.trim()).map_err(write_err)
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CredentialError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// In-memory credential store for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, token: &str) -> Result<(), CredentialError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.trim().to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("workportal-cred-{}", uuid::Uuid::now_v7()))
            .join("access_token")
    }

    #[test]
    fn file_store_persists_across_instances() {
        let path = scratch_path();
        FileCredentialStore::new(&path).set("abc.def.ghi\n").unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.get().as_deref(), Some("abc.def.ghi"));

        reopened.clear().unwrap();
        assert_eq!(reopened.get(), None);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn clearing_a_missing_file_is_fine() {
        let store = FileCredentialStore::new(scratch_path());
        assert!(store.clear().is_ok());
        assert_eq!(store.get(), None);
    }

    #[test]
    fn opaque_tokens_are_not_valid() {
        let store = MemoryCredentialStore::with_token("not-a-jwt");
        assert_eq!(store.get().as_deref(), Some("not-a-jwt"));
        assert_eq!(store.get_valid(), None);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryCredentialStore::new();
        store.set(" t ").unwrap();
        assert_eq!(store.get().as_deref(), Some("t"));
        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }
}
