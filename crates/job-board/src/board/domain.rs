use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::BoardError;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

identifier!(
    /// Identifier wrapper for directory accounts.
    UserId
);
identifier!(
    /// Identifier wrapper for registered companies.
    CompanyId
);
identifier!(
    /// Identifier wrapper for posted jobs.
    JobId
);
identifier!(
    /// Identifier wrapper for submitted applications.
    ApplicationId
);

/// Account role assigned at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Recruiter,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Recruiter => "recruiter",
        }
    }
}

impl FromStr for Role {
    type Err = BoardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "recruiter" => Ok(Role::Recruiter),
            other => Err(BoardError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

/// Profile sub-record owned by a single user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub resume_url: Option<String>,
    pub resume_original_name: Option<String>,
    pub photo_url: Option<String>,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user attached to application listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantSummary {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile: Profile,
}

impl From<&User> for ApplicantSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            profile: user.profile.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub logo: Option<String>,
    pub is_active: bool,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Rejected,
    Closed,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Rejected => "rejected",
            JobStatus::Closed => "closed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = BoardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(JobStatus::Active),
            "rejected" => Ok(JobStatus::Rejected),
            "closed" => Ok(JobStatus::Closed),
            "" => Err(BoardError::Validation("job status is required".to_string())),
            other => Err(BoardError::Validation(format!(
                "unknown job status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub salary: u64,
    pub location: String,
    pub job_type: String,
    pub experience_level: u32,
    pub position: u32,
    pub company: CompanyId,
    pub created_by: UserId,
    pub status: JobStatus,
    pub applications: Vec<ApplicationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Status of an application as tracked by the recruiter.
///
/// Recruiters may record labels outside the well-known set; those are kept lower-cased
/// in `Custom` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Custom(String),
}

impl ApplicationStatus {
    pub fn label(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Custom(label) => label,
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = BoardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "" => Err(BoardError::Validation("status is required".to_string())),
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Ok(ApplicationStatus::Custom(normalized)),
        }
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApplicationStatus> for String {
    fn from(status: ApplicationStatus) -> Self {
        status.label().to_string()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job: JobId,
    pub applicant: UserId,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Job with its owning company resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    pub company_details: Option<Company>,
}

/// Job with its applications resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub company_details: Option<Company>,
    pub application_details: Vec<Application>,
}

/// Application with its job (and the job's company) resolved, as shown to applicants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedJob {
    #[serde(flatten)]
    pub application: Application,
    pub job_details: Option<JobListing>,
}

/// Application with the applicant resolved, as shown to recruiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Applicant {
    #[serde(flatten)]
    pub application: Application,
    pub applicant_details: Option<ApplicantSummary>,
}

/// Input accepting either a delimited string or an already structured list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    Items(Vec<String>),
    Delimited(String),
}

impl ListInput {
    /// Normalize into the structured form. Delimited strings split on commas with blank
    /// entries dropped; lists pass through untouched.
    pub fn into_items(self) -> Vec<String> {
        match self {
            ListInput::Items(items) => items,
            ListInput::Delimited(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<&str> for ListInput {
    fn from(value: &str) -> Self {
        ListInput::Delimited(value.to_string())
    }
}

impl From<Vec<String>> for ListInput {
    fn from(value: Vec<String>) -> Self {
        ListInput::Items(value)
    }
}

/// Numeric input that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumberInput {
    pub fn to_u64(&self, field: &str) -> Result<u64, BoardError> {
        let invalid = || BoardError::Validation(format!("{field} must be a non-negative integer"));
        match self {
            NumberInput::Number(number) => number.as_u64().ok_or_else(invalid),
            NumberInput::Text(raw) => raw.trim().parse::<u64>().map_err(|_| invalid()),
        }
    }

    pub fn to_u32(&self, field: &str) -> Result<u32, BoardError> {
        let value = self.to_u64(field)?;
        u32::try_from(value)
            .map_err(|_| BoardError::Validation(format!("{field} is out of range")))
    }
}

impl From<u64> for NumberInput {
    fn from(value: u64) -> Self {
        NumberInput::Number(value.into())
    }
}

impl From<&str> for NumberInput {
    fn from(value: &str) -> Self {
        NumberInput::Text(value.to_string())
    }
}
