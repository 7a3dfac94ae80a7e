//! DevConnect client: session management, filtered list pagination and typed
//! access to the DevConnect job-board REST API.

pub mod api;
pub mod cli;
pub mod core;
pub mod dashboard;
pub mod error;
pub mod pagination;
pub mod session;
pub mod types;
pub mod utils;

use std::sync::Arc;

pub use api::DevConnectApi;
pub use crate::core::{ConfigManager, CredentialStore, FileCredentialStore, Notifier, ServiceClient};
pub use error::{ApiError, AuthError, PaginationError};
pub use pagination::{ListController, ListSnapshot, ListStatus, ResourceSpec, CANDIDATES, JOBS};
pub use session::SessionManager;
pub use types::{Role, User};

/// Everything a front end needs, wired to one shared client and credential.
pub struct DevConnect {
    pub session: Arc<SessionManager>,
    pub api: DevConnectApi,
    pub page_size: u32,
}

impl DevConnect {
    pub fn new(
        client: ServiceClient,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        page_size: u32,
    ) -> Self {
        Self {
            session: Arc::new(SessionManager::new(client.clone(), store, notifier)),
            api: DevConnectApi::new(client),
            page_size,
        }
    }

    /// reqwest transport, file credential store and log notifications from `config`.
    pub fn from_config(config: &ConfigManager) -> anyhow::Result<Self> {
        let client = ServiceClient::from_config(&config.client)?;
        let store = Arc::new(FileCredentialStore::new(config.storage.credential_path.clone()));
        Ok(Self::new(
            client,
            store,
            Arc::new(crate::core::TracingNotifier),
            config.client.default_page_size,
        ))
    }
}
