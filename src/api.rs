// src/api.rs
//! Typed wrappers for the DevConnect endpoints outside auth and list search.

use std::path::Path;
use tracing::{info, warn};

use crate::core::transport::{FormField, FormValue};
use crate::core::ServiceClient;
use crate::error::ApiError;
use crate::pagination::{CandidateList, JobList, ListController, CANDIDATES, JOBS};
use crate::types::response::{ApplicationCheck, Envelope, ListEnvelope, ProfileViews};
use crate::types::{Application, Job, NewJob, ProgrammingLanguage, ResourceId};
use crate::utils::resume_content_type;

const EMPLOYEE_APPLICATIONS_ENDPOINT: &str = "/applications/employee";
const EMPLOYER_APPLICATIONS_ENDPOINT: &str = "/applications/employer";
const EMPLOYER_JOBS_ENDPOINT: &str = "/jobs/employer";
const RECOMMENDATIONS_ENDPOINT: &str = "/jobs/employee/recommendations";
const PROFILE_VIEWS_ENDPOINT: &str = "/users/views";
const LANGUAGES_ENDPOINT: &str = "/programming-languages";
const CANDIDATES_ENDPOINT: &str = "/users/candidates";
const JOBS_ENDPOINT: &str = "/jobs";

#[derive(Clone)]
pub struct DevConnectApi {
    client: ServiceClient,
}

impl DevConnectApi {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    pub fn job_list(&self, limit: u32) -> JobList {
        ListController::new(self.client.clone(), JOBS, limit)
    }

    pub fn candidate_list(&self, limit: u32) -> CandidateList {
        ListController::new(self.client.clone(), CANDIDATES, limit)
    }

    // ===== Employee =====

    pub async fn employee_applications(&self) -> Result<Vec<Application>, ApiError> {
        self.list(EMPLOYEE_APPLICATIONS_ENDPOINT).await
    }

    pub async fn recommended_jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.list(RECOMMENDATIONS_ENDPOINT).await
    }

    pub async fn has_applied(&self, job_id: &ResourceId) -> Result<bool, ApiError> {
        let check: ApplicationCheck = self
            .client
            .get(&format!("/applications/check/{}", job_id))
            .await?;
        Ok(check.has_applied)
    }

    /// Submit an application with a PDF resume and an optional cover letter.
    pub async fn apply(
        &self,
        job_id: &ResourceId,
        resume_path: &Path,
        cover_letter: Option<&str>,
    ) -> Result<(), ApiError> {
        let file_name = resume_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidRequest(format!("Bad resume path: {}", resume_path.display())))?
            .to_string();
        let mime = resume_content_type(&file_name)?;

        let bytes = tokio::fs::read(resume_path).await.map_err(|e| {
            ApiError::InvalidRequest(format!(
                "Failed to read resume {}: {}",
                resume_path.display(),
                e
            ))
        })?;

        let mut fields = vec![FormField {
            name: "resume".to_string(),
            value: FormValue::File {
                file_name,
                mime: mime.to_string(),
                bytes,
            },
        }];
        if let Some(letter) = cover_letter.filter(|l| !l.trim().is_empty()) {
            fields.push(FormField {
                name: "coverLetter".to_string(),
                value: FormValue::Text(letter.to_string()),
            });
        }

        self.client
            .post_multipart(&format!("/applications/apply/{}", job_id), fields)
            .await?;
        info!("Application submitted for job {}", job_id);
        Ok(())
    }

    // ===== Employer =====

    pub async fn employer_jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.list(EMPLOYER_JOBS_ENDPOINT).await
    }

    pub async fn employer_applications(&self) -> Result<Vec<Application>, ApiError> {
        self.list(EMPLOYER_APPLICATIONS_ENDPOINT).await
    }

    pub async fn job_applications(&self, job_id: &ResourceId) -> Result<Vec<Application>, ApiError> {
        self.list(&format!("/applications/job/{}", job_id)).await
    }

    pub async fn accept_application(&self, application_id: &ResourceId) -> Result<(), ApiError> {
        self.client
            .post_empty(&format!("/applications/{}/accept", application_id))
            .await
    }

    pub async fn reject_application(&self, application_id: &ResourceId) -> Result<(), ApiError> {
        self.client
            .post_empty(&format!("/applications/{}/reject", application_id))
            .await
    }

    pub async fn create_job(&self, job: &NewJob) -> Result<(), ApiError> {
        if let Some(field) = job.missing_field() {
            return Err(ApiError::InvalidRequest(format!("Missing required field: {}", field)));
        }
        self.client.post_json_discard(JOBS_ENDPOINT, job).await?;
        info!("Job posted: {}", job.title);
        Ok(())
    }

    /// Number of candidates visible to the employer (unfiltered first page).
    pub async fn candidate_count(&self) -> Result<usize, ApiError> {
        let candidates: ListEnvelope<serde_json::Value> = self.client.get(CANDIDATES_ENDPOINT).await?;
        Ok(candidates.into_items().len())
    }

    // ===== Shared =====

    pub async fn job(&self, job_id: &ResourceId) -> Result<Job, ApiError> {
        let envelope: Envelope<Job> = self.client.get(&format!("/jobs/{}", job_id)).await?;
        Ok(envelope.data)
    }

    pub async fn user_profile(&self, user_id: &ResourceId) -> Result<serde_json::Value, ApiError> {
        let envelope: Envelope<serde_json::Value> =
            self.client.get(&format!("/users/{}", user_id)).await?;
        Ok(envelope.data)
    }

    pub async fn profile_views(&self) -> Result<u64, ApiError> {
        let views: ProfileViews = self.client.get(PROFILE_VIEWS_ENDPOINT).await?;
        Ok(views.count.unwrap_or(0))
    }

    pub async fn programming_languages(&self) -> Result<Vec<String>, ApiError> {
        let languages: Vec<ProgrammingLanguage> = self.list(LANGUAGES_ENDPOINT).await?;
        if languages.is_empty() {
            warn!("Backend returned no programming languages");
        }
        Ok(languages.into_iter().map(|l| l.name).collect())
    }

    async fn list<T>(&self, endpoint: &str) -> Result<Vec<T>, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let envelope: ListEnvelope<T> = self.client.get(endpoint).await?;
        Ok(envelope.into_items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::{Method, RequestBody};
    use crate::core::MockTransport;
    use crate::types::ExperienceLevel;
    use serde_json::json;
    use std::sync::Arc;

    fn api() -> (Arc<MockTransport>, DevConnectApi) {
        let mock = Arc::new(MockTransport::new());
        (mock.clone(), DevConnectApi::new(ServiceClient::new(mock)))
    }

    #[tokio::test]
    async fn test_list_endpoints_unwrap_envelope() {
        let (mock, api) = api();
        mock.respond_json(
            Method::Get,
            "/applications/employee",
            200,
            json!({"data": [{"id": 1, "status": "reviewed", "job": {"title": "Rust dev"}}]}),
        )
        .respond_json(Method::Get, "/jobs/employee/recommendations", 200, json!({}));

        let apps = api.employee_applications().await.unwrap();
        assert_eq!(apps[0].job.as_ref().unwrap().title, "Rust dev");
        assert!(api.recommended_jobs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accept_and_reject_paths() {
        let (mock, api) = api();
        mock.respond_json(Method::Post, "/applications/9/accept", 200, json!({}))
            .respond_json(Method::Post, "/applications/9/reject", 200, json!({}));

        let id = ResourceId::from(9u64);
        api.accept_application(&id).await.unwrap();
        api.reject_application(&id).await.unwrap();
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_create_job_validates_before_sending() {
        let (mock, api) = api();
        let job = NewJob {
            title: "Backend Engineer".into(),
            description: "".into(),
            city: "Cairo".into(),
            experience_level: ExperienceLevel::Senior,
            language_names: vec!["Rust".into()],
        };
        assert!(matches!(
            api.create_job(&job).await,
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_apply_sends_pdf_and_cover_letter() {
        let (mock, api) = api();
        mock.respond_json(Method::Post, "/applications/apply/4", 201, json!({}));

        let dir = tempfile::tempdir().unwrap();
        let resume = dir.path().join("resume.pdf");
        tokio::fs::write(&resume, b"%PDF-1.7").await.unwrap();

        api.apply(&ResourceId::from(4u64), &resume, Some("Hire me"))
            .await
            .unwrap();

        let sent = mock.last_request().unwrap();
        let RequestBody::Multipart(fields) = sent.body else {
            panic!("expected multipart body");
        };
        assert_eq!(fields[0].name, "resume");
        assert!(matches!(
            &fields[0].value,
            FormValue::File { mime, bytes, .. } if mime == "application/pdf" && bytes == b"%PDF-1.7"
        ));
        assert_eq!(fields[1].value, FormValue::Text("Hire me".into()));
    }

    #[tokio::test]
    async fn test_apply_rejects_non_pdf() {
        let (mock, api) = api();
        let err = api
            .apply(&ResourceId::from(4u64), Path::new("/tmp/resume.docx"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_profile_views_defaults_to_zero() {
        let (mock, api) = api();
        mock.respond_json(Method::Get, "/users/views", 200, json!({}));
        assert_eq!(api.profile_views().await.unwrap(), 0);
    }
}
