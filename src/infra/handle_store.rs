//! Persistence of the current identity handle.
//!
//! The store keeps a single preference: the alias of the identity the user
//! last selected or bound. An absent entry means no identity is selected.

use crate::identity::IdentityHandle;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Name of the preference store holding the current identity.
pub const PREFS_NAME: &str = "certificate_picker_prefs";

/// Preference key of the current identity handle.
pub const PREF_CERTIFICATE_ALIAS: &str = "certificate_alias";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Preference I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Preference file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable slot for the current identity handle.
pub trait IdentityHandleStore: Send + Sync {
    fn load(&self) -> Result<Option<IdentityHandle>, StoreError>;

    fn save(&self, handle: &IdentityHandle) -> Result<(), StoreError>;

    /// Removes the stored handle. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

/// On-disk preference document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    certificate_alias: Option<IdentityHandle>,
}

/// Preference store backed by a small JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash never leaves a half-written document behind.
#[derive(Debug)]
pub struct FileHandleStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileHandleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Preferences, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, prefs: &Preferences) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(prefs)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl IdentityHandleStore for FileHandleStore {
    fn load(&self) -> Result<Option<IdentityHandle>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.certificate_alias)
    }

    fn save(&self, handle: &IdentityHandle) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut prefs = self.read().unwrap_or_default();
        prefs.certificate_alias = Some(handle.clone());
        self.write(&prefs)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.path.exists() {
            return Ok(());
        }
        let mut prefs = self.read().unwrap_or_default();
        prefs.certificate_alias = None;
        self.write(&prefs)
    }
}

/// Process-local store, for hosts without durable storage and for tests.
#[derive(Debug, Default)]
pub struct MemoryHandleStore {
    slot: Mutex<Option<IdentityHandle>>,
}

impl MemoryHandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle(handle: IdentityHandle) -> Self {
        Self {
            slot: Mutex::new(Some(handle)),
        }
    }
}

impl IdentityHandleStore for MemoryHandleStore {
    fn load(&self) -> Result<Option<IdentityHandle>, StoreError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, handle: &IdentityHandle) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHandleStore::new(dir.path().join("prefs.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let store = FileHandleStore::new(&path);

        store.save(&IdentityHandle::new("client-cert")).unwrap();
        assert_eq!(store.load().unwrap(), Some(IdentityHandle::new("client-cert")));

        // A fresh store over the same file sees the persisted value.
        let reopened = FileHandleStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(IdentityHandle::new("client-cert")));

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains(PREF_CERTIFICATE_ALIAS));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHandleStore::new(dir.path().join("prefs.json"));

        store.clear().unwrap();
        store.save(&IdentityHandle::new("client-cert")).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_corrupt_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{broken json").unwrap();

        let store = FileHandleStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));

        // Saving over a corrupt document replaces it.
        store.save(&IdentityHandle::new("client-cert")).unwrap();
        assert_eq!(store.load().unwrap(), Some(IdentityHandle::new("client-cert")));
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryHandleStore::with_handle(IdentityHandle::new("a"));
        assert_eq!(store.load().unwrap(), Some(IdentityHandle::new("a")));
        store.save(&IdentityHandle::new("b")).unwrap();
        assert_eq!(store.load().unwrap(), Some(IdentityHandle::new("b")));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
