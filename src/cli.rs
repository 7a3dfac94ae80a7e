// src/cli.rs
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use chrono::Utc;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use crate::core::ConfigManager;
use crate::dashboard::{load_dashboard, Dashboard};
use crate::pagination::{ListController, ListSnapshot, ListStatus};
use crate::types::{
    Candidate, ExperienceLevel, Job, NewJob, ResourceId, Role, RoleProfile, Searchable,
    SignupData, SignupProfile, User,
};
use crate::utils::relative_date;
use crate::DevConnect;

pub const PASSWORD_ENV: &str = "DEVCONNECT_PASSWORD";

#[derive(Parser)]
#[command(name = "devconnect")]
#[command(about = "DevConnect job board client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// API base URL (overrides DEVCONNECT_API_URL and the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// YAML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where the session credential is stored
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Log in and store the session credential.
    /// The password is read from DEVCONNECT_PASSWORD or, failing that, stdin.
    Login { email: String },
    /// Create an account
    Signup(SignupArgs),
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Search job listings
    Jobs {
        #[arg(long)]
        experience_level: Option<String>,
        #[arg(long)]
        city: Option<String>,
        /// Comma-separated language names
        #[arg(long)]
        languages: Option<String>,
        #[command(flatten)]
        paging: PagingArgs,
    },
    /// Search candidates (employers only)
    Candidates {
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        languages: Option<String>,
        #[arg(long)]
        experience_level: Option<String>,
        #[command(flatten)]
        paging: PagingArgs,
    },
    /// Show one job posting
    Job { id: String },
    /// Apply to a job with a PDF resume (developers only)
    Apply {
        id: String,
        #[arg(long)]
        resume: PathBuf,
        #[arg(long)]
        cover_letter: Option<String>,
    },
    /// List applications for one of your postings (employers only)
    Applications { job_id: String },
    /// Accept an application (employers only)
    Accept { id: String },
    /// Reject an application (employers only)
    Reject { id: String },
    /// Publish a job posting (employers only)
    PostJob {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        city: String,
        #[arg(long, default_value = "junior")]
        experience_level: ExperienceLevel,
        #[arg(long, value_delimiter = ',')]
        languages: Vec<String>,
    },
    /// Role-specific overview
    Dashboard,
    /// Known programming languages
    Languages,
    /// Public profile of a user
    Profile { id: String },
}

#[derive(Args)]
pub struct PagingArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long)]
    pub limit: Option<u32>,
    /// Narrow the fetched page by a search term
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct SignupArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "employee")]
    pub role: Role,
    #[arg(long)]
    pub national_id: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long, default_value = "junior")]
    pub experience_level: ExperienceLevel,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub languages: Vec<String>,
    #[arg(long)]
    pub company_name: Option<String>,
}

impl SignupArgs {
    pub fn into_signup_data(self, password: String) -> SignupData {
        let profile = match self.role {
            Role::Employee => SignupProfile::Employee {
                national_id: self.national_id.unwrap_or_default(),
                city: self.city.unwrap_or_default(),
                experience_level: self.experience_level,
                bio: self.bio.unwrap_or_default(),
                language_names: self.languages,
            },
            Role::Employer => SignupProfile::Employer {
                company_name: self.company_name.unwrap_or_default(),
            },
        };
        SignupData {
            email: self.email,
            password,
            name: self.name,
            profile,
        }
    }
}

/// Resolve configuration from the config file, environment and CLI overrides.
pub fn resolve_config(cli: &Cli) -> Result<ConfigManager> {
    let mut config = ConfigManager::load_with_file(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url.clone());
    }
    if let Some(path) = &cli.credentials {
        config = config.with_credential_path(path.clone());
    }
    Ok(config)
}

pub async fn handle_command(cli: Cli, config: &ConfigManager) -> Result<()> {
    let app = DevConnect::from_config(config)?;
    let session = app.session.clone();
    session.initialize().await;

    match cli.command {
        Command::Login { email } => {
            let password = read_password(BufReader::new(tokio::io::stdin())).await?;
            let user = session
                .login(&email, &password)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e.message()))?;
            println!("✓ Logged in as {} ({})", display(&user), user.role());
        }

        Command::Signup(args) => {
            let password = read_password(BufReader::new(tokio::io::stdin())).await?;
            let user = session
                .signup(&args.into_signup_data(password))
                .await
                .map_err(|e| anyhow::anyhow!("{} ({})", e.message(), e))?;
            println!("✓ Account created for {} ({})", display(&user), user.role());
        }

        Command::Logout => {
            session.logout().await;
            println!("✓ Logged out successfully");
        }

        Command::Whoami => match session.current_user() {
            Some(user) => print_user(&user, session.credential_expiry()),
            None => println!("Not logged in"),
        },

        Command::Jobs {
            experience_level,
            city,
            languages,
            paging,
        } => {
            let list = app.api.job_list(paging.limit.unwrap_or(app.page_size));
            let list = apply_filters(
                list,
                &[
                    ("experienceLevel", experience_level),
                    ("city", city),
                    ("languageNames", languages),
                ],
            )?;
            let snapshot = fetch_page(&list, paging.page).await?;
            print_jobs(&narrow(&snapshot, paging.search.as_deref()));
            print_paging(&snapshot);
        }

        Command::Candidates {
            bio,
            city,
            languages,
            experience_level,
            paging,
        } => {
            require(&session, Role::Employer)?;
            let list = app.api.candidate_list(paging.limit.unwrap_or(app.page_size));
            let list = apply_filters(
                list,
                &[
                    ("bio", bio),
                    ("city", city),
                    ("languageNames", languages),
                    ("experienceLevel", experience_level),
                ],
            )?;
            let snapshot = fetch_page(&list, paging.page).await?;
            print_candidates(&narrow(&snapshot, paging.search.as_deref()));
            print_paging(&snapshot);
        }

        Command::Job { id } => {
            let id = ResourceId::new(id);
            let job = app.api.job(&id).await.context("Failed to load job details")?;
            print_jobs(&[job]);
            if session.require_role(Role::Employee).is_ok() && app.api.has_applied(&id).await.unwrap_or(false) {
                println!("  You have already applied to this job");
            }
        }

        Command::Apply {
            id,
            resume,
            cover_letter,
        } => {
            require(&session, Role::Employee)?;
            app.api
                .apply(&ResourceId::new(id), &resume, cover_letter.as_deref())
                .await
                .context("There was an error submitting your application")?;
            println!("✓ Application submitted");
        }

        Command::Applications { job_id } => {
            require(&session, Role::Employer)?;
            let applications = app
                .api
                .job_applications(&ResourceId::new(job_id))
                .await
                .context("Failed to load applications")?;
            if applications.is_empty() {
                println!("No applications yet.");
            }
            for application in applications {
                let applicant = application
                    .employee
                    .as_ref()
                    .map(|e| e.name.as_str())
                    .unwrap_or("Unknown applicant");
                println!("{:<8} {:<25} {:<10}", application.id, applicant, application.status);
            }
        }

        Command::Accept { id } => {
            require(&session, Role::Employer)?;
            app.api
                .accept_application(&ResourceId::new(id))
                .await
                .context("Update failed")?;
            println!("✓ Application status changed to accepted");
        }

        Command::Reject { id } => {
            require(&session, Role::Employer)?;
            app.api
                .reject_application(&ResourceId::new(id))
                .await
                .context("Update failed")?;
            println!("✓ Application status changed to rejected");
        }

        Command::PostJob {
            title,
            description,
            city,
            experience_level,
            languages,
        } => {
            require(&session, Role::Employer)?;
            let job = NewJob {
                title,
                description,
                city,
                experience_level,
                language_names: languages,
            };
            app.api
                .create_job(&job)
                .await
                .context("There was an error posting your job")?;
            println!("✓ Job posted successfully");
        }

        Command::Dashboard => {
            let user = session
                .require_user()
                .map_err(|e| anyhow::anyhow!("{}", e.message()))?;
            let dashboard = load_dashboard(&app.api, &user).await;
            print_dashboard(&user, &dashboard);
        }

        Command::Languages => {
            let languages = app
                .api
                .programming_languages()
                .await
                .context("Failed to load programming languages")?;
            println!("{}", languages.join(", "));
        }

        Command::Profile { id } => {
            let profile = app
                .api
                .user_profile(&ResourceId::new(id))
                .await
                .context("Failed to load user profile. The user may not exist or you may not have permission to view this profile")?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }

    Ok(())
}

/// Password from `DEVCONNECT_PASSWORD`, else the first line of `input`.
/// Never taken from argv so it stays out of the process list and shell history.
pub async fn read_password<R>(input: R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    password_from(std::env::var(PASSWORD_ENV).ok(), input).await
}

async fn password_from<R>(env_value: Option<String>, mut input: R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    if let Some(password) = env_value.filter(|p| !p.is_empty()) {
        return Ok(password);
    }

    eprint!("Password: ");
    let mut line = String::new();
    input
        .read_line(&mut line)
        .await
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string();
    if password.is_empty() {
        anyhow::bail!("No password given (set {} or pipe it on stdin)", PASSWORD_ENV);
    }
    Ok(password)
}

fn require(session: &crate::SessionManager, role: Role) -> Result<User> {
    session
        .require_role(role)
        .map_err(|e| anyhow::anyhow!("{}", e.message()))
}

fn apply_filters<T>(
    mut list: ListController<T>,
    filters: &[(&str, Option<String>)],
) -> Result<ListController<T>>
where
    T: serde::de::DeserializeOwned + Clone + Send + Sync,
{
    for (key, value) in filters {
        if let Some(value) = value {
            list = list.with_filter(key, value)?;
        }
    }
    Ok(list)
}

async fn fetch_page<T>(list: &ListController<T>, page: u32) -> Result<ListSnapshot<T>>
where
    T: serde::de::DeserializeOwned + Clone + Send + Sync,
{
    let mut status = list.refresh().await;
    if page > 1 && status == ListStatus::Loaded {
        status = list.set_page(page).await?;
    }
    if status == ListStatus::Failed {
        anyhow::bail!("Failed to load {}", list.spec().name);
    }
    info!("Fetched page {} of {}", list.page(), list.spec().name);
    Ok(list.snapshot())
}

fn narrow<T: Searchable + Clone>(snapshot: &ListSnapshot<T>, term: Option<&str>) -> Vec<T> {
    let term = term.unwrap_or("");
    snapshot
        .items
        .iter()
        .filter(|item| item.matches(term))
        .cloned()
        .collect()
}

fn display(user: &User) -> &str {
    if user.display_name.is_empty() {
        &user.email
    } else {
        &user.display_name
    }
}

fn print_user(user: &User, expiry: Option<chrono::DateTime<Utc>>) {
    println!("{} <{}> [{}]", display(user), user.email, user.role());
    match &user.profile {
        RoleProfile::Employee(p) => {
            println!("  City: {}", p.city);
            if let Some(level) = p.experience_level {
                println!("  Experience: {}", level);
            }
            if !p.skills.is_empty() {
                println!("  Skills: {}", p.skills.join(", "));
            }
            if !p.bio.is_empty() {
                println!("  Bio: {}", p.bio);
            }
        }
        RoleProfile::Employer(p) => {
            println!("  Company: {}", p.company_name);
        }
    }
    if let Some(expiry) = expiry {
        println!("  Session expires: {}", expiry.format("%Y-%m-%d %H:%M UTC"));
    }
}

fn print_jobs(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("No jobs found matching your criteria.");
        return;
    }
    for job in jobs {
        println!("[{}] {} - {}", job.id, job.title, job.company_name());
        println!("  {} | {} | {}", job.city, job.experience_level, job.language_names().join(", "));
        if let Some(posted) = job.posted_date {
            println!("  Posted {}", relative_date(posted, Utc::now()));
        }
    }
}

fn print_candidates(candidates: &[Candidate]) {
    if candidates.is_empty() {
        println!("No candidates found matching your criteria.");
        return;
    }
    for candidate in candidates {
        println!("[{}] {} <{}>", candidate.id, candidate.name, candidate.email);
        println!(
            "  {} | {}",
            candidate.city.as_deref().unwrap_or("Location not specified"),
            candidate
                .experience_level
                .as_deref()
                .unwrap_or("Experience not specified")
        );
    }
}

fn print_paging<T>(snapshot: &ListSnapshot<T>) {
    println!(
        "Page {} of {} ({} total)",
        snapshot.page, snapshot.total_pages, snapshot.total
    );
}

fn print_dashboard(user: &User, dashboard: &Dashboard) {
    println!("Welcome, {}", display(user));
    println!("Profile views: {}", dashboard.profile_views());
    let now = Utc::now();

    match dashboard {
        Dashboard::Employee {
            applications,
            recommended_jobs,
            ..
        } => {
            println!("\nYour applications ({}):", applications.len());
            for application in applications {
                let title = application
                    .job
                    .as_ref()
                    .map(|j| j.title.as_str())
                    .unwrap_or("Untitled job");
                let applied = application
                    .created_at
                    .map(|d| relative_date(d, now))
                    .unwrap_or_default();
                println!("  {:<30} {:<10} {}", title, application.status, applied);
            }
            println!("\nRecommended jobs ({}):", recommended_jobs.len());
            for job in recommended_jobs {
                println!("  [{}] {} - {}", job.id, job.title, job.company_name());
            }
        }
        Dashboard::Employer {
            jobs,
            applicants,
            candidate_count,
            ..
        } => {
            println!("\nYour postings ({}):", jobs.len());
            for job in jobs {
                let count = job.applications_count.unwrap_or(0);
                println!(
                    "  [{}] {} ({} application{})",
                    job.id,
                    job.title,
                    count,
                    if count == 1 { "" } else { "s" }
                );
            }
            println!("\nApplicants: {}", applicants.len());
            println!("Candidates available: {}", candidate_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jobs_command() {
        let cli = Cli::try_parse_from([
            "devconnect",
            "jobs",
            "--city",
            "Cairo",
            "--experience-level",
            "any",
            "--page",
            "2",
        ])
        .unwrap();
        match cli.command {
            Command::Jobs {
                city,
                experience_level,
                paging,
                ..
            } => {
                assert_eq!(city.as_deref(), Some("Cairo"));
                assert_eq!(experience_level.as_deref(), Some("any"));
                assert_eq!(paging.page, 2);
            }
            _ => panic!("expected jobs command"),
        }
    }

    #[test]
    fn test_signup_args_build_employer_payload() {
        let cli = Cli::try_parse_from([
            "devconnect",
            "signup",
            "--email",
            "hr@acme.io",
            "--name",
            "Acme HR",
            "--role",
            "employer",
            "--company-name",
            "Acme",
        ])
        .unwrap();
        let Command::Signup(args) = cli.command else {
            panic!("expected signup command");
        };
        let data = args.into_signup_data("pw".into());
        assert_eq!(data.password, "pw");
        assert_eq!(data.role(), Role::Employer);
        assert_eq!(data.missing_field(), None);
    }

    #[test]
    fn test_invalid_experience_level_is_rejected() {
        let result = Cli::try_parse_from([
            "devconnect",
            "post-job",
            "--title",
            "t",
            "--description",
            "d",
            "--city",
            "c",
            "--experience-level",
            "wizard",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_login_does_not_accept_password_flag() {
        assert!(Cli::try_parse_from(["devconnect", "login", "a@b.c", "--password", "pw"]).is_err());
        assert!(Cli::try_parse_from(["devconnect", "login", "a@b.c"]).is_ok());
    }

    #[tokio::test]
    async fn test_password_prefers_environment() {
        let password = password_from(Some("from-env".into()), &b"from-stdin\n"[..])
            .await
            .unwrap();
        assert_eq!(password, "from-env");
    }

    #[tokio::test]
    async fn test_password_read_from_input_line() {
        let password = password_from(None, &b"s3cret\r\nignored\n"[..]).await.unwrap();
        assert_eq!(password, "s3cret");
    }

    #[tokio::test]
    async fn test_empty_password_is_an_error() {
        assert!(password_from(Some(String::new()), &b"\n"[..]).await.is_err());
    }
}
