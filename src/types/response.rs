// src/types/response.rs
use serde::{Deserialize, Serialize};

use super::user::RawUser;

// ===== Envelopes =====

/// `{ "data": ... }` wrapper used by single-record endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// `{ "data": [...] }` wrapper used by unpaginated list endpoints; a missing or
/// null `data` is an empty list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Option::default")]
    pub data: Option<Vec<T>>,
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        self.data.unwrap_or_default()
    }
}

/// Raw paginated response: `{ data, page, limit, total }`, every field optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Option::default")]
    pub data: Option<Vec<T>>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Paginated response after the page/limit/total fallbacks have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl<T> Paginated<T> {
    /// Zero or missing page/limit fall back to 1 / `requested_limit`; missing total is 0.
    pub fn normalize(self, requested_limit: u32) -> PageResult<T> {
        PageResult {
            items: self.data.unwrap_or_default(),
            page: self.page.filter(|p| *p > 0).unwrap_or(1),
            limit: self
                .limit
                .filter(|l| *l > 0)
                .unwrap_or(requested_limit.max(1)),
            total: self.total.unwrap_or(0),
        }
    }
}

// ===== Auth =====

#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub user: RawUser,
}

/// Response of `POST /auth/login` and `POST /auth/signup`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub data: AuthPayload,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

// ===== Misc =====

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileViews {
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCheck {
    #[serde(default)]
    pub has_applied: bool,
}
