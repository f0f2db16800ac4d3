use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    Applicant, ApplicantSummary, Application, ApplicationId, ApplicationStatus, AppliedJob,
    JobId, JobListing, UserId,
};
use super::error::BoardError;
use super::next_id;
use super::notify::{dispatch, Notification, NotificationPublisher, Recipient};
use super::store::BoardStore;

fn next_application_id() -> ApplicationId {
    ApplicationId(next_id("app"))
}

/// Ledger of (job, applicant) join records.
pub struct ApplicationLedger<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> ApplicationLedger<S, N>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Record an application and link it from the job in one transaction, then notify the
    /// recruiter who owns the job's company.
    pub fn apply(&self, job_id: &JobId, applicant: &UserId) -> Result<Application, BoardError> {
        let (application, recruiter, job_title) = self.store.transaction(|tx| {
            if tx.application_for(job_id, applicant)?.is_some() {
                return Err(BoardError::Conflict(
                    "you have already applied for this job".to_string(),
                ));
            }

            let mut job = tx
                .job(job_id)?
                .ok_or_else(|| BoardError::NotFound(format!("job {job_id}")))?;
            let company = tx
                .company(&job.company)?
                .ok_or_else(|| BoardError::NotFound(format!("company {}", job.company)))?;
            let recruiter = tx
                .user(&company.owner)?
                .ok_or_else(|| BoardError::NotFound(format!("recruiter {}", company.owner)))?;

            let now = Utc::now();
            let application = Application {
                id: next_application_id(),
                job: job.id.clone(),
                applicant: applicant.clone(),
                status: ApplicationStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            tx.insert_application(application.clone())?;

            job.applications.push(application.id.clone());
            tx.save_job(job.clone())?;

            Ok::<_, BoardError>((application, recruiter, job.title))
        })?;

        info!(
            application = %application.id,
            job = %application.job,
            applicant = %applicant,
            "application submitted"
        );

        dispatch(
            self.notifier.as_ref(),
            Notification {
                recipient: Recipient::User(recruiter.id.clone()),
                subject: format!("New application for {job_title}"),
                body: format!(
                    "Hello {}, a candidate has applied for {}. Review the applicant list to respond.",
                    recruiter.full_name, job_title
                ),
            },
        );

        Ok(application)
    }

    /// Applications submitted by `applicant`, each with its job and company, newest first.
    pub fn list_for_applicant(&self, applicant: &UserId) -> Result<Vec<AppliedJob>, BoardError> {
        self.store.transaction(|tx| {
            let mut applied = Vec::new();
            for application in tx.applications_by_applicant(applicant)? {
                let job_details = match tx.job(&application.job)? {
                    Some(job) => {
                        let company_details = tx.company(&job.company)?;
                        Some(JobListing {
                            job,
                            company_details,
                        })
                    }
                    None => None,
                };
                applied.push(AppliedJob {
                    application,
                    job_details,
                });
            }
            Ok::<_, BoardError>(applied)
        })
    }

    /// Applicants of a job with their profile details, newest first.
    pub fn list_for_job(&self, job_id: &JobId) -> Result<Vec<Applicant>, BoardError> {
        self.store.transaction(|tx| {
            if tx.job(job_id)?.is_none() {
                return Err(BoardError::NotFound(format!("job {job_id}")));
            }

            let mut applicants = Vec::new();
            for application in tx.applications_for_job(job_id)? {
                let applicant_details = tx
                    .user(&application.applicant)?
                    .as_ref()
                    .map(ApplicantSummary::from);
                applicants.push(Applicant {
                    application,
                    applicant_details,
                });
            }
            Ok(applicants)
        })
    }

    pub fn get(&self, application_id: &ApplicationId) -> Result<Application, BoardError> {
        self.store.transaction(|tx| {
            tx.application(application_id)?
                .ok_or_else(|| BoardError::NotFound(format!("application {application_id}")))
        })
    }

    /// Store a recruiter-assigned status, lower-cased.
    pub fn update_status(
        &self,
        application_id: &ApplicationId,
        status: &str,
    ) -> Result<Application, BoardError> {
        let status: ApplicationStatus = status.parse()?;

        let application = self.store.transaction(|tx| {
            let mut application = tx
                .application(application_id)?
                .ok_or_else(|| BoardError::NotFound(format!("application {application_id}")))?;
            application.status = status;
            application.updated_at = Utc::now();
            tx.save_application(application.clone())?;
            Ok::<_, BoardError>(application)
        })?;

        info!(
            application = %application.id,
            status = application.status.label(),
            "application status updated"
        );
        Ok(application)
    }
}
