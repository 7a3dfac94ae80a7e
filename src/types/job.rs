// src/types/job.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::ExperienceLevel;
use super::{contains_ci, ResourceId, Searchable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgrammingLanguage {
    #[serde(default)]
    pub id: Option<ResourceId>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEmployer {
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: ResourceId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub languages: Vec<ProgrammingLanguage>,
    #[serde(default)]
    pub employer: Option<JobEmployer>,
    #[serde(default)]
    pub posted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub applications_count: Option<u32>,
}

impl Job {
    pub fn company_name(&self) -> &str {
        self.employer
            .as_ref()
            .and_then(|e| e.company_name.as_deref())
            .unwrap_or("Unknown Company")
    }

    pub fn language_names(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.name.as_str()).collect()
    }
}

impl Searchable for Job {
    fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        contains_ci(&self.title, &term)
            || contains_ci(&self.description, &term)
            || self.languages.iter().any(|l| contains_ci(&l.name, &term))
    }
}

/// Developer profile as listed in the employer's candidate search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: ResourceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub languages: Vec<ProgrammingLanguage>,
}

impl Searchable for Candidate {
    fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        contains_ci(&self.name, &term)
            || contains_ci(&self.email, &term)
            || self.bio.as_deref().is_some_and(|b| contains_ci(b, &term))
            || self.city.as_deref().is_some_and(|c| contains_ci(c, &term))
            || self.languages.iter().any(|l| contains_ci(&l.name, &term))
    }
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub city: String,
    pub experience_level: ExperienceLevel,
    pub language_names: Vec<String>,
}

impl NewJob {
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            Some("title")
        } else if self.description.trim().is_empty() {
            Some("description")
        } else if self.city.trim().is_empty() {
            Some("city")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> Job {
        serde_json::from_value(json!({
            "id": 1,
            "title": "Senior Rust Engineer",
            "description": "Build async services",
            "city": "Cairo",
            "experienceLevel": "senior",
            "languages": [{"id": 1, "name": "Rust"}, {"id": 2, "name": "TypeScript"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_job_search_matches_title_description_and_languages() {
        let job = job();
        assert!(job.matches("rust engineer"));
        assert!(job.matches("ASYNC"));
        assert!(job.matches("typescript"));
        assert!(job.matches(""));
        assert!(!job.matches("python"));
    }

    #[test]
    fn test_job_defaults_for_sparse_payload() {
        let job: Job = serde_json::from_value(json!({"id": "j-2"})).unwrap();
        assert_eq!(job.company_name(), "Unknown Company");
        assert!(job.languages.is_empty());
        assert!(job.posted_date.is_none());
    }

    #[test]
    fn test_candidate_search_includes_bio() {
        let candidate: Candidate = serde_json::from_value(json!({
            "id": 3,
            "name": "Omar",
            "email": "omar@example.com",
            "bio": "Embedded systems tinkerer"
        }))
        .unwrap();
        assert!(candidate.matches("embedded"));
        assert!(!candidate.matches("cairo"));
    }

    #[test]
    fn test_new_job_requires_title() {
        let job = NewJob {
            title: "".into(),
            description: "d".into(),
            city: "c".into(),
            experience_level: ExperienceLevel::Junior,
            language_names: vec![],
        };
        assert_eq!(job.missing_field(), Some("title"));
    }
}
