//! Error types for the DevConnect client.

use thiserror::Error;

use crate::types::Role;

/// Failure talking to the backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection, DNS, TLS or timeout failure; no HTTP status was received.
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} error: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Rejected locally before anything was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }
}

/// Credential persistence failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Corrupt credential file {path}: {message}")]
    Format { path: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Signup rejected: {0}")]
    SignupRejected(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Only {required} accounts can do this")]
    Forbidden { required: Role },

    #[error("Credential storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("Backend error: {0}")]
    Backend(#[from] ApiError),
}

impl AuthError {
    /// User-facing text; backend detail is never surfaced here.
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingField(_) => "Please fill in all required fields.",
            AuthError::InvalidCredentials => "Invalid credentials. Please try again.",
            AuthError::SignupRejected(_) => "Failed to sign up",
            AuthError::NotAuthenticated => "Please log in to continue.",
            AuthError::Forbidden { required: Role::Employer } => {
                "Only employers can access this page"
            }
            AuthError::Forbidden { required: Role::Employee } => {
                "Only developers can access this page"
            }
            AuthError::Storage(_) => "Could not save your session. Please try again.",
            AuthError::Backend(_) => "Something went wrong. Please try again.",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaginationError {
    #[error("Unknown filter '{key}' for {resource}")]
    UnknownFilter { resource: &'static str, key: String },

    #[error("Page {requested} out of range (1..={total_pages})")]
    PageOutOfRange { requested: u32, total_pages: u32 },

    #[error("Page size must be at least 1")]
    InvalidLimit,
}
