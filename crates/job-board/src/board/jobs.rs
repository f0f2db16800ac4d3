use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Company, CompanyId, Job, JobDetail, JobId, JobListing, JobStatus, ListInput, NumberInput,
    UserId,
};
use super::error::BoardError;
use super::next_id;
use super::notify::{dispatch, Notification, NotificationPublisher, Recipient};
use super::store::{BoardStore, BoardTransaction};

/// Raw job fields as submitted by a recruiter. Every field is required; they are optional
/// here so that a missing one is reported as a validation failure instead of a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<ListInput>,
    #[serde(default)]
    pub salary: Option<NumberInput>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<NumberInput>,
    #[serde(default)]
    pub position: Option<NumberInput>,
}

/// Validated, normalized job fields.
#[derive(Debug, Clone, PartialEq, Eq)]
struct JobFields {
    title: String,
    description: String,
    requirements: Vec<String>,
    salary: u64,
    location: String,
    job_type: String,
    experience_level: u32,
    position: u32,
}

fn required_text(value: Option<String>, field: &str) -> Result<String, BoardError> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| BoardError::missing(field))
}

impl JobDraft {
    fn validate(self) -> Result<JobFields, BoardError> {
        let title = required_text(self.title, "title")?;
        let description = required_text(self.description, "description")?;
        let requirements = self
            .requirements
            .ok_or_else(|| BoardError::missing("requirements"))?
            .into_items();
        if requirements.is_empty() {
            return Err(BoardError::missing("requirements"));
        }
        let salary = self
            .salary
            .ok_or_else(|| BoardError::missing("salary"))?
            .to_u64("salary")?;
        let location = required_text(self.location, "location")?;
        let job_type = required_text(self.job_type, "job_type")?;
        let experience_level = self
            .experience_level
            .ok_or_else(|| BoardError::missing("experience_level"))?
            .to_u32("experience_level")?;
        let position = self
            .position
            .ok_or_else(|| BoardError::missing("position"))?
            .to_u32("position")?;

        Ok(JobFields {
            title,
            description,
            requirements,
            salary,
            location,
            job_type,
            experience_level,
            position,
        })
    }
}

fn next_job_id() -> JobId {
    JobId(next_id("job"))
}

/// Resolve the target company and make sure it accepts postings.
fn active_company(
    tx: &dyn BoardTransaction,
    company_id: &CompanyId,
) -> Result<Company, BoardError> {
    let company = tx
        .company(company_id)?
        .ok_or_else(|| BoardError::NotFound(format!("company {company_id}")))?;
    if !company.is_active {
        return Err(BoardError::Precondition(format!(
            "company {} is inactive; jobs cannot be posted or updated",
            company.name
        )));
    }
    Ok(company)
}

fn with_company(tx: &dyn BoardTransaction, job: Job) -> Result<JobListing, BoardError> {
    let company_details = tx.company(&job.company)?;
    Ok(JobListing {
        job,
        company_details,
    })
}

pub struct JobCatalog<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> JobCatalog<S, N>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Create a job under an active company and broadcast it to all users.
    pub fn post(
        &self,
        draft: JobDraft,
        company_id: &CompanyId,
        creator: &UserId,
    ) -> Result<Job, BoardError> {
        let fields = draft.validate()?;

        let (job, company) = self.store.transaction(|tx| {
            let company = active_company(tx, company_id)?;
            let now = Utc::now();
            let job = Job {
                id: next_job_id(),
                title: fields.title,
                description: fields.description,
                requirements: fields.requirements,
                salary: fields.salary,
                location: fields.location,
                job_type: fields.job_type,
                experience_level: fields.experience_level,
                position: fields.position,
                company: company.id.clone(),
                created_by: creator.clone(),
                status: JobStatus::Active,
                applications: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            tx.insert_job(job.clone())?;
            Ok::<_, BoardError>((job, company))
        })?;

        info!(job = %job.id, company = %company.id, creator = %creator, "job posted");

        dispatch(
            self.notifier.as_ref(),
            Notification {
                recipient: Recipient::AllUsers,
                subject: format!("New job posted: {}", job.title),
                body: format!(
                    "{} is hiring a {} ({}) in {}. Salary: {}.",
                    company.name, job.title, job.job_type, job.location, job.salary
                ),
            },
        );

        Ok(job)
    }

    /// Overwrite every mutable field of a job. The target company must exist and be active.
    pub fn update(
        &self,
        job_id: &JobId,
        draft: JobDraft,
        company_id: &CompanyId,
        status: Option<&str>,
    ) -> Result<Job, BoardError> {
        let fields = draft.validate()?;
        let status = status.map(str::parse::<JobStatus>).transpose()?;

        let job = self.store.transaction(|tx| {
            let mut job = tx
                .job(job_id)?
                .ok_or_else(|| BoardError::NotFound(format!("job {job_id}")))?;
            let company = active_company(tx, company_id)?;

            job.title = fields.title;
            job.description = fields.description;
            job.requirements = fields.requirements;
            job.salary = fields.salary;
            job.location = fields.location;
            job.job_type = fields.job_type;
            job.experience_level = fields.experience_level;
            job.position = fields.position;
            job.company = company.id;
            if let Some(status) = status {
                job.status = status;
            }
            job.updated_at = Utc::now();

            tx.save_job(job.clone())?;
            Ok::<_, BoardError>(job)
        })?;

        info!(job = %job.id, status = job.status.label(), "job updated");
        Ok(job)
    }

    /// Jobs whose title or description contains `keyword`, newest first.
    pub fn list_all(&self, keyword: &str) -> Result<Vec<JobListing>, BoardError> {
        self.store.transaction(|tx| {
            tx.jobs()?
                .into_iter()
                .filter(|job| job.matches_keyword(keyword))
                .map(|job| with_company(tx, job))
                .collect::<Result<Vec<_>, BoardError>>()
        })
    }

    pub fn get_by_id(&self, job_id: &JobId) -> Result<JobDetail, BoardError> {
        self.store.transaction(|tx| {
            let job = tx
                .job(job_id)?
                .ok_or_else(|| BoardError::NotFound(format!("job {job_id}")))?;
            let company_details = tx.company(&job.company)?;
            let mut application_details = Vec::with_capacity(job.applications.len());
            for application_id in &job.applications {
                if let Some(application) = tx.application(application_id)? {
                    application_details.push(application);
                }
            }
            Ok::<_, BoardError>(JobDetail {
                job,
                company_details,
                application_details,
            })
        })
    }

    pub fn list_by_creator(&self, creator: &UserId) -> Result<Vec<JobListing>, BoardError> {
        self.store.transaction(|tx| {
            tx.jobs()?
                .into_iter()
                .filter(|job| &job.created_by == creator)
                .map(|job| with_company(tx, job))
                .collect::<Result<Vec<_>, BoardError>>()
        })
    }
}
