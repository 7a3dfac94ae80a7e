// src/dashboard.rs
//! Role-specific dashboard aggregation. Every section degrades to empty on its
//! own; a dashboard load never fails as a whole.

use std::future::Future;
use tracing::error;

use crate::api::DevConnectApi;
use crate::error::ApiError;
use crate::types::{Application, Job, RoleProfile, User};

#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    Employee {
        profile_views: u64,
        applications: Vec<Application>,
        recommended_jobs: Vec<Job>,
    },
    Employer {
        profile_views: u64,
        jobs: Vec<Job>,
        applicants: Vec<Application>,
        candidate_count: usize,
    },
}

impl Dashboard {
    pub fn profile_views(&self) -> u64 {
        match self {
            Dashboard::Employee { profile_views, .. } | Dashboard::Employer { profile_views, .. } => {
                *profile_views
            }
        }
    }
}

async fn or_empty<T, F>(section: &str, fetch: F) -> T
where
    T: Default,
    F: Future<Output = Result<T, ApiError>>,
{
    fetch.await.unwrap_or_else(|e| {
        error!("Error fetching dashboard {}: {}", section, e);
        T::default()
    })
}

pub async fn load_dashboard(api: &DevConnectApi, user: &User) -> Dashboard {
    let profile_views = or_empty("profile views", api.profile_views()).await;

    match &user.profile {
        RoleProfile::Employee(_) => {
            let (applications, recommended_jobs) = tokio::join!(
                or_empty("applications", api.employee_applications()),
                or_empty("recommendations", api.recommended_jobs()),
            );
            Dashboard::Employee {
                profile_views,
                applications,
                recommended_jobs,
            }
        }
        RoleProfile::Employer(_) => {
            let (jobs, applicants, candidate_count) = tokio::join!(
                or_empty("jobs", api.employer_jobs()),
                or_empty("applicants", api.employer_applications()),
                or_empty("candidates", api.candidate_count()),
            );
            Dashboard::Employer {
                profile_views,
                jobs,
                applicants,
                candidate_count,
            }
        }
    }
}
