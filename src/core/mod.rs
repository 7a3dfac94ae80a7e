// src/core/mod.rs
//! Infrastructure shared by the session manager, list controllers and endpoint wrappers

pub mod config_manager;
pub mod credential_store;
#[cfg(any(test, feature = "testing"))]
pub mod mock_transport;
pub mod notify;
pub mod service_client;
pub mod transport;

pub use config_manager::{ClientConfig, ConfigManager};
pub use credential_store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
#[cfg(any(test, feature = "testing"))]
pub use mock_transport::MockTransport;
pub use notify::{MemoryNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use service_client::ServiceClient;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport};
