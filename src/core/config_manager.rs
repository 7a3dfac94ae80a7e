// src/core/config_manager.rs
//! Client configuration: API location, timeouts, where the credential lives.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const API_URL_ENV: &str = "DEVCONNECT_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_LOG_FILE: &str = "/tmp/devconnect.log";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub client: ClientConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout_seconds: u64,
    pub default_page_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub credential_path: PathBuf,
    pub log_file: PathBuf,
}

/// Optional YAML overlay; every field may be omitted.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_url: Option<String>,
    timeout_seconds: Option<u64>,
    default_page_size: Option<u32>,
    credential_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from defaults and the environment
    pub fn load() -> Result<Self> {
        Self::load_with_file(None)
    }

    /// Load configuration, overlaying a YAML file when given.
    /// `DEVCONNECT_API_URL` still wins over the file.
    pub fn load_with_file(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Self::read_file(path)?,
            None => ConfigFile::default(),
        };
        let config = Self::resolve(file, std::env::var(API_URL_ENV).ok());
        info!("Using DevConnect API at {}", config.client.api_url);
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn resolve(file: ConfigFile, env_api_url: Option<String>) -> Self {
        let api_url = env_api_url
            .filter(|url| !url.trim().is_empty())
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            client: ClientConfig {
                api_url: api_url.trim_end_matches('/').to_string(),
                timeout_seconds: file.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
                default_page_size: file
                    .default_page_size
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_PAGE_SIZE),
            },
            storage: StorageConfig {
                credential_path: file
                    .credential_path
                    .unwrap_or_else(Self::default_credential_path),
                log_file: file
                    .log_file
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            },
        }
    }

    fn default_credential_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("devconnect")
            .join("credentials.json")
    }

    pub fn with_api_url(mut self, url: String) -> Self {
        self.client.api_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_credential_path(mut self, path: PathBuf) -> Self {
        self.storage.credential_path = path;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigManager::resolve(ConfigFile::default(), None);
        assert_eq!(config.client, ClientConfig::default());
        assert!(config.storage.credential_path.ends_with("devconnect/credentials.json"));
    }

    #[test]
    fn test_env_url_wins_over_file() {
        let file = ConfigFile {
            api_url: Some("http://file:1/api".into()),
            ..Default::default()
        };
        let config = ConfigManager::resolve(file, Some("https://api.devconnect.io/".into()));
        assert_eq!(config.client.api_url, "https://api.devconnect.io");
    }

    #[test]
    fn test_yaml_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devconnect.yaml");
        std::fs::write(
            &path,
            "api_url: http://staging:8080/api\ntimeout_seconds: 5\ndefault_page_size: 0\ncredential_path: /tmp/dc.json\n",
        )
        .unwrap();

        let file = ConfigManager::read_file(&path).unwrap();
        let config = ConfigManager::resolve(file, None);
        assert_eq!(config.client.api_url, "http://staging:8080/api");
        assert_eq!(config.client.timeout_seconds, 5);
        assert_eq!(config.client.default_page_size, 10);
        assert_eq!(config.storage.credential_path, PathBuf::from("/tmp/dc.json"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(ConfigManager::read_file(Path::new("/definitely/not/here.yaml")).is_err());
    }
}
