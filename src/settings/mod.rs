use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::auth::{AuthTokenStore, FileStorage, KeyringStorage, MemoryStorage};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

const ENV_API_URL: &str = "SAVDHAAN_API_URL";
const ENV_API_KEY: &str = "SAVDHAAN_API_KEY";
const ENV_TOKEN_BACKEND: &str = "SAVDHAAN_TOKEN_BACKEND";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    Keyring,
    #[default]
    File,
    Memory,
}

impl TokenBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyring" => Some(TokenBackend::Keyring),
            "file" => Some(TokenBackend::File),
            "memory" => Some(TokenBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub token_backend: TokenBackend,
    /// Per-request deadline. Unset means a single attempt with no deadline.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: None,
            token_backend: TokenBackend::default(),
            timeout_secs: None,
        }
    }
}

impl ClientSettings {
    /// Apply `SAVDHAAN_*` environment overrides on top of the loaded file.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(raw) = lookup(ENV_TOKEN_BACKEND) {
            match TokenBackend::parse(&raw) {
                Some(backend) => self.token_backend = backend,
                None => log::warn!("Ignoring unknown {} value '{}'", ENV_TOKEN_BACKEND, raw),
            }
        }
        self
    }

    /// Base address with trailing slashes removed.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn token_store(&self) -> AuthTokenStore {
        match self.token_backend {
            TokenBackend::Keyring => AuthTokenStore::new(Box::new(KeyringStorage::new())),
            TokenBackend::File => AuthTokenStore::new(Box::new(FileStorage::default_location())),
            TokenBackend::Memory => AuthTokenStore::new(Box::new(MemoryStorage::new())),
        }
    }
}

fn get_settings_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
    config_dir.join("savdhaan").join("settings.json")
}

pub fn load_settings() -> Result<ClientSettings, SettingsError> {
    load_settings_from(&get_settings_path())
}

pub fn load_settings_from(path: &Path) -> Result<ClientSettings, SettingsError> {
    if !path.exists() {
        return Ok(ClientSettings::default());
    }

    let contents = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&contents)?;
    Ok(settings)
}

pub fn save_settings(settings: &ClientSettings) -> Result<(), SettingsError> {
    save_settings_to(settings, &get_settings_path())
}

pub fn save_settings_to(settings: &ClientSettings, path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, contents)?;

    log::info!("Settings saved to {:?}", path);
    Ok(())
}

/// Persist `key` as the scan API key in the settings file. A blank or
/// missing key removes the stored one. Env and CLI overrides are not written.
pub fn remember_api_key(key: Option<&str>) -> Result<ClientSettings, SettingsError> {
    remember_api_key_at(key, &get_settings_path())
}

pub fn remember_api_key_at(key: Option<&str>, path: &Path) -> Result<ClientSettings, SettingsError> {
    let mut settings = load_settings_from(path)?;
    settings.api_key = key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string);
    save_settings_to(&settings, path)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json")).unwrap();

        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.token_backend, TokenBackend::File);
        assert_eq!(settings.timeout_secs, None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("savdhaan").join("settings.json");

        let settings = ClientSettings {
            api_base_url: "https://api.savdhaan.test/api/v1".to_string(),
            api_key: Some("svd_abc".to_string()),
            token_backend: TokenBackend::Memory,
            timeout_secs: Some(10),
        };
        save_settings_to(&settings, &path).unwrap();

        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, settings.api_base_url);
        assert_eq!(loaded.api_key.as_deref(), Some("svd_abc"));
        assert_eq!(loaded.token_backend, TokenBackend::Memory);
        assert_eq!(loaded.timeout_secs, Some(10));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"api_key": "svd_xyz"}"#).unwrap();

        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(loaded.api_key.as_deref(), Some("svd_xyz"));
    }

    #[test]
    fn test_remember_api_key_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"api_base_url": "https://api.savdhaan.test/api/v1", "timeout_secs": 5}"#)
            .unwrap();

        let saved = remember_api_key_at(Some(" svd_new "), &path).unwrap();
        assert_eq!(saved.api_key.as_deref(), Some("svd_new"));

        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("svd_new"));
        assert_eq!(loaded.api_base_url, "https://api.savdhaan.test/api/v1");
        assert_eq!(loaded.timeout_secs, Some(5));

        remember_api_key_at(None, &path).unwrap();
        assert_eq!(load_settings_from(&path).unwrap().api_key, None);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, "https://example.test/api/v1/"),
            (ENV_API_KEY, "svd_env"),
            (ENV_TOKEN_BACKEND, "Keyring"),
        ]);

        let settings =
            ClientSettings::default().with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.base_url(), "https://example.test/api/v1");
        assert_eq!(settings.api_key.as_deref(), Some("svd_env"));
        assert_eq!(settings.token_backend, TokenBackend::Keyring);
    }

    #[test]
    fn test_unknown_backend_is_ignored() {
        let settings = ClientSettings::default().with_overrides(|key| {
            (key == ENV_TOKEN_BACKEND).then(|| "redis".to_string())
        });
        assert_eq!(settings.token_backend, TokenBackend::File);
    }
}
