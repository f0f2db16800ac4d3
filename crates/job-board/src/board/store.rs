//! Persistence seam for the four board collections.
//!
//! Every read and write goes through [`BoardStore::transaction`]. Implementations must
//! enforce the unique indexes (company name, user email, and the `(job, applicant)` pair)
//! inside the transaction and discard all staged writes when the closure returns an error.

use super::domain::{
    Application, ApplicationId, Company, CompanyId, Job, JobId, JobStatus, User, UserId,
};

mod memory;

pub use memory::MemoryBoardStore;

/// Error enumeration for datastore failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Missing(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction so the board services can be exercised in isolation.
pub trait BoardStore: Send + Sync {
    /// Run `work` against a consistent view of the store, committing only on `Ok`.
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn BoardTransaction) -> Result<T, E>,
        E: From<RepositoryError>;
}

/// Operations available inside a single store transaction.
pub trait BoardTransaction {
    fn user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn insert_user(&mut self, user: User) -> Result<(), RepositoryError>;
    fn save_user(&mut self, user: User) -> Result<(), RepositoryError>;

    fn company(&self, id: &CompanyId) -> Result<Option<Company>, RepositoryError>;
    fn company_named(&self, name: &str) -> Result<Option<Company>, RepositoryError>;
    fn companies_owned_by(&self, owner: &UserId) -> Result<Vec<Company>, RepositoryError>;
    fn insert_company(&mut self, company: Company) -> Result<(), RepositoryError>;
    fn save_company(&mut self, company: Company) -> Result<(), RepositoryError>;
    fn delete_company(&mut self, id: &CompanyId) -> Result<(), RepositoryError>;

    fn job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn jobs(&self) -> Result<Vec<Job>, RepositoryError>;
    fn jobs_for_company(&self, company: &CompanyId) -> Result<Vec<Job>, RepositoryError>;
    fn insert_job(&mut self, job: Job) -> Result<(), RepositoryError>;
    fn save_job(&mut self, job: Job) -> Result<(), RepositoryError>;
    /// Set-based status transition over one company's jobs; returns the number changed.
    fn transition_jobs(
        &mut self,
        company: &CompanyId,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<usize, RepositoryError>;
    fn delete_jobs(&mut self, ids: &[JobId]) -> Result<usize, RepositoryError>;

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn application_for(
        &self,
        job: &JobId,
        applicant: &UserId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn applications_by_applicant(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn applications_for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError>;
    fn insert_application(&mut self, application: Application) -> Result<(), RepositoryError>;
    fn save_application(&mut self, application: Application) -> Result<(), RepositoryError>;
    fn delete_applications_for_jobs(&mut self, jobs: &[JobId]) -> Result<usize, RepositoryError>;
}
