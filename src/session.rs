// src/session.rs
//! Session manager: single source of truth for who is logged in.
//!
//! Construct one `SessionManager` at startup, wrap it in an `Arc` and hand it to
//! everything that needs to gate on authentication or branch on role.
//!
//! The user record and the bearer credential always change together. A
//! credential that fails validation is discarded along with the user, so
//! `current_user().is_some()` holds exactly when the last validation succeeded.

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use tokio::sync::{watch, Mutex, OnceCell};
use tracing::{debug, error, info, warn};

use crate::core::credential_store::{credential_expiry, CredentialStore};
use crate::core::notify::{Notification, Notifier};
use crate::core::ServiceClient;
use crate::error::{ApiError, AuthError};
use crate::types::response::{AuthResponse, Envelope, LoginRequest};
use crate::types::user::RawUser;
use crate::types::{Role, SignupData, User};
use crate::utils::{read_lock, write_lock};

const CURRENT_USER_ENDPOINT: &str = "/users/me";
const LOGIN_ENDPOINT: &str = "/auth/login";
const SIGNUP_ENDPOINT: &str = "/auth/signup";
const LOGOUT_ENDPOINT: &str = "/auth/logout";

pub struct SessionManager {
    client: ServiceClient,
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    user: RwLock<Option<User>>,
    // Serialises publish/clear so the store, the credential slot and the
    // user record are never left half-updated by interleaved tasks.
    transition: Mutex<()>,
    initialized: OnceCell<()>,
    loading: watch::Sender<bool>,
}

impl SessionManager {
    pub fn new(
        client: ServiceClient,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (loading, _) = watch::channel(true);
        Self {
            client,
            store,
            notifier,
            user: RwLock::new(None),
            transition: Mutex::new(()),
            initialized: OnceCell::new(),
            loading,
        }
    }

    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    // ===== Accessors =====

    pub fn current_user(&self) -> Option<User> {
        read_lock(&self.user).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        read_lock(&self.user).is_some()
    }

    /// True until the first `initialize()` has resolved.
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Resolves once `initialize()` has completed (immediately if it already has).
    pub async fn wait_until_ready(&self) {
        let mut rx = self.loading.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|loading| !*loading).await;
    }

    /// Expiry of the active credential when it is a JWT.
    pub fn credential_expiry(&self) -> Option<DateTime<Utc>> {
        self.client.credential().as_deref().and_then(credential_expiry)
    }

    pub fn require_user(&self) -> Result<User, AuthError> {
        self.current_user().ok_or(AuthError::NotAuthenticated)
    }

    pub fn require_role(&self, role: Role) -> Result<User, AuthError> {
        let user = self.require_user()?;
        if user.role() == role {
            Ok(user)
        } else {
            Err(AuthError::Forbidden { required: role })
        }
    }

    // ===== Lifecycle =====

    /// Restore the session from the persisted credential. The restore runs once
    /// per manager; later calls just report the current state. Failures are not
    /// errors: an expired credential on first load simply means logged out.
    pub async fn initialize(&self) -> Option<User> {
        self.initialized
            .get_or_init(|| async {
                self.restore().await;
                self.loading.send_replace(false);
            })
            .await;
        self.current_user()
    }

    async fn restore(&self) {
        let token = match self.store.load().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No stored credential, starting logged out");
                return;
            }
            Err(e) => {
                warn!("Failed to read stored credential: {}", e);
                self.clear_session().await;
                return;
            }
        };

        let _guard = self.transition.lock().await;
        self.client.set_credential(token);

        match self
            .client
            .get::<Envelope<RawUser>>(CURRENT_USER_ENDPOINT)
            .await
        {
            Ok(envelope) => {
                let user = User::from(envelope.data);
                info!("Restored session for {} ({})", user.email, user.role());
                *write_lock(&self.user) = Some(user);
            }
            Err(e) => {
                debug!("Stored credential rejected, clearing session: {}", e);
                self.clear_locked().await;
            }
        }
    }

    /// Every failure, including a blank field, is also reported through the notifier.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let result = self.attempt_login(email, password).await;
        if result.is_err() {
            self.notifier.notify(Notification::destructive(
                "Login Failed",
                "Invalid credentials. Please try again.",
            ));
        }
        result
    }

    pub async fn signup(&self, data: &SignupData) -> Result<User, AuthError> {
        let result = self.attempt_signup(data).await;
        match &result {
            Ok(_) => self.notifier.notify(
                Notification::info("Account created successfully")
                    .with_description("You can now log in to your account"),
            ),
            Err(_) => self
                .notifier
                .notify(Notification::destructive("Error", "Failed to sign up")),
        }
        result
    }

    /// Always ends logged out; a failing backend logout is only logged.
    pub async fn logout(&self) {
        if let Err(e) = self.client.post_empty(LOGOUT_ENDPOINT).await {
            warn!("Logout error: {}", e);
        }
        self.clear_session().await;
        self.notifier
            .notify(Notification::info("Logged out successfully"));
    }

    async fn attempt_login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let request = LoginRequest { email, password };
        match self
            .client
            .post_json::<_, AuthResponse>(LOGIN_ENDPOINT, &request)
            .await
        {
            Ok(response) => self.establish(response).await,
            Err(e) if e.is_client_error() => {
                warn!("Login rejected for {}: {}", email, e);
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                error!("Login request failed: {}", e);
                Err(AuthError::Backend(e))
            }
        }
    }

    async fn attempt_signup(&self, data: &SignupData) -> Result<User, AuthError> {
        if let Some(field) = data.missing_field() {
            return Err(AuthError::MissingField(field));
        }

        match self
            .client
            .post_json::<_, AuthResponse>(SIGNUP_ENDPOINT, data)
            .await
        {
            Ok(response) => self.establish(response).await,
            Err(ApiError::Status { status, body }) if (400..500).contains(&status) => {
                warn!("Signup rejected for {}: {} {}", data.email, status, body);
                Err(AuthError::SignupRejected(body))
            }
            Err(e) => {
                error!("Signup error: {}", e);
                Err(AuthError::Backend(e))
            }
        }
    }

    // ===== Transitions =====

    /// Persist the new credential, then publish credential and user together.
    async fn establish(&self, response: AuthResponse) -> Result<User, AuthError> {
        let user = User::from(response.data.user);
        let _guard = self.transition.lock().await;

        if let Err(e) = self.store.save(&response.access_token).await {
            error!("Failed to persist credential: {}", e);
            return Err(AuthError::Storage(e));
        }

        {
            let mut slot = write_lock(&self.user);
            self.client.set_credential(response.access_token);
            *slot = Some(user.clone());
        }

        info!("Logged in as {} ({})", user.email, user.role());
        Ok(user)
    }

    async fn clear_session(&self) {
        let _guard = self.transition.lock().await;
        self.clear_locked().await;
    }

    // Caller holds `transition`.
    async fn clear_locked(&self) {
        {
            let mut slot = write_lock(&self.user);
            self.client.clear_credential();
            *slot = None;
        }
        if let Err(e) = self.store.clear().await {
            error!("Failed to remove stored credential: {}", e);
        }
    }
}
