// src/types/mod.rs
//! Wire and domain records shared by the session, list and endpoint layers

pub mod application;
pub mod job;
pub mod response;
pub mod user;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub use application::{Application, ApplicationStatus};
pub use job::{Candidate, Job, NewJob, ProgrammingLanguage};
pub use response::{AuthPayload, AuthResponse, Envelope, ListEnvelope, Paginated};
pub use user::{
    EmployeeProfile, EmployerProfile, ExperienceLevel, Role, RoleProfile, SignupData,
    SignupProfile, User,
};

/// Backend identifier. The API mixes numeric and string ids, so both are accepted
/// and kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

/// Case-insensitive substring match used by the client-side search box.
pub trait Searchable {
    fn matches(&self, term: &str) -> bool;
}

pub(crate) fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_accepts_numbers_and_strings() {
        let ids: Vec<ResourceId> = serde_json::from_str(r#"[7, "abc-1", -3]"#).unwrap();
        assert_eq!(ids[0].as_str(), "7");
        assert_eq!(ids[1].as_str(), "abc-1");
        assert_eq!(ids[2].as_str(), "-3");
    }

    #[test]
    fn test_resource_id_serializes_as_string() {
        let id = ResourceId::from(42u64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }
}
