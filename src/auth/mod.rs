//! Process-wide access/refresh token state.
//!
//! The pair is persisted as one JSON blob so a write never leaves only one
//! token behind. A stored blob that is missing a token reads back as absent.

use crate::api::AuthTokenPair;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

const KEYRING_SERVICE: &str = "savdhaan";
const KEYRING_USER: &str = "tokens";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Keychain error: {0}")]
    KeyringError(#[from] keyring::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Token store lock poisoned")]
    Poisoned,
    #[error("Token pair is missing a token")]
    IncompletePair,
}

/// Durable key-value slot holding the serialized token pair.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, blob: &str) -> Result<(), StoreError>;
    fn remove(&self) -> Result<(), StoreError>;
}

/// OS keychain backend.
pub struct KeyringStorage {
    service: String,
    user: String,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self::with_entry(KEYRING_SERVICE, KEYRING_USER)
    }

    pub fn with_entry(service: &str, user: &str) -> Self {
        Self {
            service: service.to_string(),
            user: user.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, StoreError> {
        Ok(keyring::Entry::new(&self.service, &self.user)?)
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStorage for KeyringStorage {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match self.entry()?.get_password() {
            Ok(blob) => Ok(Some(blob)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        self.entry()?.set_password(blob)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// JSON file backend, written via a temp file and rename. On unix the file
/// is only readable by its owner.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<config_dir>/savdhaan/tokens.json`
    pub fn default_location() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
        Self::new(config_dir.join("savdhaan").join("tokens.json"))
    }
}

impl TokenStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&self.path)?))
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp)?;
        // A stale temp file keeps its old mode when reopened.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(blob.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process backend. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(blob.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

/// Single source of truth for the current token pair.
pub struct AuthTokenStore {
    backend: Box<dyn TokenStorage>,
}

impl AuthTokenStore {
    pub fn new(backend: Box<dyn TokenStorage>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Current pair, or `None`. Backend failures and partial blobs read as
    /// absent; the caller then proceeds unauthenticated.
    pub fn get(&self) -> Option<AuthTokenPair> {
        let blob = match self.backend.load() {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read stored tokens: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<AuthTokenPair>(&blob) {
            Ok(pair) if pair.is_complete() => Some(pair),
            Ok(_) => {
                log::warn!("Stored token pair is incomplete, ignoring it");
                None
            }
            Err(e) => {
                log::warn!("Stored token pair is unreadable: {}", e);
                None
            }
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.get().map(|pair| pair.access_token)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get().map(|pair| pair.refresh_token)
    }

    /// Replace the stored pair. An incomplete pair is rejected and the
    /// previous pair stays in place.
    pub fn set(&self, pair: &AuthTokenPair) -> Result<(), StoreError> {
        if !pair.is_complete() {
            log::warn!("Refusing to store an incomplete token pair");
            return Err(StoreError::IncompletePair);
        }

        let blob = serde_json::to_string(pair)?;
        self.backend.save(&blob)?;
        log::info!("Auth tokens stored");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove()?;
        log::info!("Auth tokens cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> AuthTokenPair {
        AuthTokenPair::new("access-1", "refresh-1", 3600)
    }

    #[test]
    fn test_set_then_get_returns_equal_pair() {
        let store = AuthTokenStore::in_memory();
        assert_eq!(store.get(), None);

        store.set(&pair()).unwrap();
        assert_eq!(store.get(), Some(pair()));
        assert_eq!(store.access_token().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_clear_removes_both_tokens() {
        let store = AuthTokenStore::in_memory();
        store.set(&pair()).unwrap();
        store.clear().unwrap();

        assert_eq!(store.get(), None);
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn test_clear_on_empty_store_is_ok() {
        let store = AuthTokenStore::in_memory();
        assert!(store.clear().is_ok());
    }

    #[test]
    fn test_incomplete_pair_is_rejected_and_previous_kept() {
        let store = AuthTokenStore::in_memory();
        store.set(&pair()).unwrap();

        let result = store.set(&AuthTokenPair::new("access-2", "", 60));
        assert!(matches!(result, Err(StoreError::IncompletePair)));
        assert_eq!(store.get(), Some(pair()));

        let empty = AuthTokenStore::in_memory();
        assert!(empty.set(&AuthTokenPair::new("", "refresh-2", 60)).is_err());
        assert_eq!(empty.get(), None);
    }

    #[test]
    fn test_partial_blob_reads_as_absent() {
        let backend = MemoryStorage::new();
        backend.save(r#"{"access_token": "only-access"}"#).unwrap();
        let store = AuthTokenStore::new(Box::new(backend));

        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tokens.json");

        let store = AuthTokenStore::new(Box::new(FileStorage::new(path.clone())));
        store.set(&pair()).unwrap();

        let reopened = AuthTokenStore::new(Box::new(FileStorage::new(path.clone())));
        assert_eq!(reopened.get(), Some(pair()));

        reopened.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(store.get(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        // Leftover temp file from an interrupted write, world-readable.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, "stale").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = AuthTokenStore::new(Box::new(FileStorage::new(path.clone())));
        store.set(&pair()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!tmp.exists());
    }
}
