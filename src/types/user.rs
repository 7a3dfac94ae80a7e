// src/types/user.rs
//! Authenticated user record and signup payload

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::job::ProgrammingLanguage;
use super::ResourceId;

// ===== Domain Types =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Employer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Employer => "employer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "employer" => Ok(Role::Employer),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Ok(ExperienceLevel::Junior),
            "mid" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            other => Err(format!("Unknown experience level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    pub national_id: String,
    pub city: String,
    pub bio: String,
    pub experience_level: Option<ExperienceLevel>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerProfile {
    pub company_name: String,
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Employee(EmployeeProfile),
    Employer(EmployerProfile),
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Employee(_) => Role::Employee,
            RoleProfile::Employer(_) => Role::Employer,
        }
    }
}

/// The currently authenticated user, flattened from the backend's nested
/// `employee` / `employer` payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: ResourceId,
    pub email: String,
    pub display_name: String,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn employee(&self) -> Option<&EmployeeProfile> {
        match &self.profile {
            RoleProfile::Employee(p) => Some(p),
            RoleProfile::Employer(_) => None,
        }
    }

    pub fn employer(&self) -> Option<&EmployerProfile> {
        match &self.profile {
            RoleProfile::Employer(p) => Some(p),
            RoleProfile::Employee(_) => None,
        }
    }
}

// ===== Wire Types =====

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    pub id: ResourceId,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub employee: Option<RawEmployee>,
    #[serde(default)]
    pub employer: Option<RawEmployer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEmployee {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub languages: Option<Vec<ProgrammingLanguage>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEmployer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        let employer_name = raw.employer.as_ref().and_then(|e| non_empty(e.name.clone()));
        let employee_name = raw.employee.as_ref().and_then(|e| non_empty(e.name.clone()));
        let display_name = employer_name.or(employee_name).unwrap_or_default();

        let profile = match raw.role {
            Role::Employee => {
                let employee = raw.employee.unwrap_or_default();
                RoleProfile::Employee(EmployeeProfile {
                    national_id: employee.national_id.unwrap_or_default(),
                    city: employee.city.unwrap_or_default(),
                    bio: employee.bio.unwrap_or_default(),
                    experience_level: employee
                        .experience_level
                        .and_then(|level| level.parse().ok()),
                    skills: employee
                        .languages
                        .unwrap_or_default()
                        .into_iter()
                        .map(|lang| lang.name)
                        .collect(),
                })
            }
            Role::Employer => {
                let employer = raw.employer.unwrap_or_default();
                RoleProfile::Employer(EmployerProfile {
                    company_name: employer.company_name.unwrap_or_default(),
                    bio: employer.bio.unwrap_or_default(),
                })
            }
        };

        Self {
            id: raw.id,
            email: raw.email.unwrap_or_default(),
            display_name,
            profile,
        }
    }
}

// ===== Signup =====

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SignupProfile {
    Employee {
        national_id: String,
        city: String,
        experience_level: ExperienceLevel,
        bio: String,
        language_names: Vec<String>,
    },
    Employer {
        company_name: String,
    },
}

/// Body of `POST /auth/signup`: common fields plus the role-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignupData {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(flatten)]
    pub profile: SignupProfile,
}

impl SignupData {
    pub fn role(&self) -> Role {
        match self.profile {
            SignupProfile::Employee { .. } => Role::Employee,
            SignupProfile::Employer { .. } => Role::Employer,
        }
    }

    /// First required field left blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        let blank = |s: &str| s.trim().is_empty();

        if blank(&self.email) {
            return Some("email");
        }
        if blank(&self.password) {
            return Some("password");
        }
        if blank(&self.name) {
            return Some("name");
        }

        match &self.profile {
            SignupProfile::Employee {
                national_id,
                city,
                bio,
                ..
            } => {
                if blank(national_id) {
                    Some("nationalId")
                } else if blank(city) {
                    Some("city")
                } else if blank(bio) {
                    Some("bio")
                } else {
                    None
                }
            }
            SignupProfile::Employer { company_name } => {
                if blank(company_name) {
                    Some("companyName")
                } else {
                    None
                }
            }
        }
    }
}
