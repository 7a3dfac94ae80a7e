// src/core/credential_store.rs
//! Persistence for the bearer credential between process restarts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::utils::lock;

/// Fixed key the credential is stored under.
pub const CREDENTIAL_KEY: &str = "accessToken";

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StoreError>;
    async fn save(&self, token: &str) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// JSON key/value file; only `CREDENTIAL_KEY` is touched, other entries survive.
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

    fn io_error(&self, e: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| StoreError::Format {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let content = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Format {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| self.io_error(e))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        let entries = self.read_entries().await?;
        Ok(entries.get(CREDENTIAL_KEY).filter(|t| !t.is_empty()).cloned())
    }

    async fn save(&self, token: &str) -> Result<(), StoreError> {
        let mut entries = self.read_entries().await.unwrap_or_default();
        entries.insert(CREDENTIAL_KEY.to_string(), token.to_string());
        self.write_entries(&entries).await?;
        info!("Stored credential in {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = match self.read_entries().await {
            Ok(entries) => entries,
            // Unreadable file: overwrite it rather than keep a stale credential around
            Err(StoreError::Format { .. }) => BTreeMap::new(),
            Err(e) => return Err(e),
        };

        if entries.remove(CREDENTIAL_KEY).is_none() && !self.path.exists() {
            return Ok(());
        }
        self.write_entries(&entries).await?;
        debug!("Cleared credential in {}", self.path.display());
        Ok(())
    }
}

#[derive(Default)]
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

    pub fn token(&self) -> Option<String> {
        lock(&self.token).clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.token())
    }

    async fn save(&self, token: &str) -> Result<(), StoreError> {
        *lock(&self.token) = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *lock(&self.token) = None;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Expiry of a JWT credential, read without verifying the signature.
/// Opaque (non-JWT) tokens yield `None`. Display only: the backend stays the
/// authority on whether a credential is valid.
pub fn credential_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp?, 0)
}
