// src/types/application.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Accepted,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Unknown => "unknown",
        };
        f.pad(label)
    }
}

/// Job summary embedded in an application listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationJob {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ResourceId,
    #[serde(default = "default_status")]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub job: Option<ApplicationJob>,
    #[serde(default)]
    pub employee: Option<Applicant>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_status() -> ApplicationStatus {
    ApplicationStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_application_status_tolerates_unknown_values() {
        let apps: Vec<Application> = serde_json::from_value(json!([
            {"id": 1, "status": "accepted", "createdAt": "2026-10-01T10:00:00Z"},
            {"id": 2, "status": "shortlisted"},
            {"id": 3}
        ]))
        .unwrap();

        assert_eq!(apps[0].status, ApplicationStatus::Accepted);
        assert!(apps[0].created_at.is_some());
        assert_eq!(apps[1].status, ApplicationStatus::Unknown);
        assert_eq!(apps[2].status, ApplicationStatus::Pending);
    }
}
