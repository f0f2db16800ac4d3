use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::{BoardStore, BoardTransaction, RepositoryError};
use crate::board::domain::{
    Application, ApplicationId, Company, CompanyId, Job, JobId, JobStatus, User, UserId,
};

#[derive(Debug, Clone, Default)]
struct BoardTables {
    users: HashMap<UserId, User>,
    companies: HashMap<CompanyId, Company>,
    jobs: HashMap<JobId, Job>,
    applications: HashMap<ApplicationId, Application>,
}

/// In-process store. Transactions run against a staged copy of the tables and swap it in
/// on success, so a failed closure leaves no partial writes behind.
#[derive(Debug, Default, Clone)]
pub struct MemoryBoardStore {
    tables: Arc<Mutex<BoardTables>>,
    #[cfg(test)]
    fail_job_deletes: Arc<std::sync::atomic::AtomicBool>,
    #[cfg(test)]
    fail_job_saves: Arc<std::sync::atomic::AtomicBool>,
}

impl MemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `delete_jobs` call fail, to exercise rollback.
    #[cfg(test)]
    pub(crate) fn fail_job_deletes(&self) {
        self.fail_job_deletes
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Make every subsequent `save_job` call fail.
    #[cfg(test)]
    pub(crate) fn fail_job_saves(&self) {
        self.fail_job_saves
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl BoardStore for MemoryBoardStore {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn BoardTransaction) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))?;

        let mut staged = MemoryTransaction {
            tables: guard.clone(),
            #[cfg(test)]
            fail_job_deletes: self
                .fail_job_deletes
                .load(std::sync::atomic::Ordering::SeqCst),
            #[cfg(test)]
            fail_job_saves: self
                .fail_job_saves
                .load(std::sync::atomic::Ordering::SeqCst),
        };
        let value = work(&mut staged)?;
        *guard = staged.tables;
        Ok(value)
    }
}

struct MemoryTransaction {
    tables: BoardTables,
    #[cfg(test)]
    fail_job_deletes: bool,
    #[cfg(test)]
    fail_job_saves: bool,
}

fn newest_first<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

impl BoardTransaction for MemoryTransaction {
    fn user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.users.get(id).cloned())
    }

    fn insert_user(&mut self, user: User) -> Result<(), RepositoryError> {
        let email = user.email.to_lowercase();
        if self
            .tables
            .users
            .values()
            .any(|existing| existing.email.to_lowercase() == email)
        {
            return Err(RepositoryError::Duplicate(format!(
                "a user with email '{}' already exists",
                user.email
            )));
        }
        if self.tables.users.contains_key(&user.id) {
            return Err(RepositoryError::Duplicate(format!(
                "user {} already exists",
                user.id
            )));
        }
        self.tables.users.insert(user.id.clone(), user);
        Ok(())
    }

    fn save_user(&mut self, user: User) -> Result<(), RepositoryError> {
        let email = user.email.to_lowercase();
        if self
            .tables
            .users
            .values()
            .any(|existing| existing.id != user.id && existing.email.to_lowercase() == email)
        {
            return Err(RepositoryError::Duplicate(format!(
                "a user with email '{}' already exists",
                user.email
            )));
        }
        match self.tables.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                Ok(())
            }
            None => Err(RepositoryError::Missing(format!("user {}", user.id))),
        }
    }

    fn company(&self, id: &CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.tables.companies.get(id).cloned())
    }

    fn company_named(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        Ok(self
            .tables
            .companies
            .values()
            .find(|company| company.name == name)
            .cloned())
    }

    fn companies_owned_by(&self, owner: &UserId) -> Result<Vec<Company>, RepositoryError> {
        let rows = self
            .tables
            .companies
            .values()
            .filter(|company| &company.owner == owner)
            .cloned()
            .collect();
        Ok(newest_first(rows, |company: &Company| {
            (company.created_at, company.id.clone())
        }))
    }

    fn insert_company(&mut self, company: Company) -> Result<(), RepositoryError> {
        if self
            .tables
            .companies
            .values()
            .any(|existing| existing.name == company.name)
        {
            return Err(RepositoryError::Duplicate(format!(
                "company '{}' is already registered",
                company.name
            )));
        }
        self.tables.companies.insert(company.id.clone(), company);
        Ok(())
    }

    fn save_company(&mut self, company: Company) -> Result<(), RepositoryError> {
        if self
            .tables
            .companies
            .values()
            .any(|existing| existing.id != company.id && existing.name == company.name)
        {
            return Err(RepositoryError::Duplicate(format!(
                "company '{}' is already registered",
                company.name
            )));
        }
        match self.tables.companies.get_mut(&company.id) {
            Some(slot) => {
                *slot = company;
                Ok(())
            }
            None => Err(RepositoryError::Missing(format!("company {}", company.id))),
        }
    }

    fn delete_company(&mut self, id: &CompanyId) -> Result<(), RepositoryError> {
        self.tables
            .companies
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::Missing(format!("company {id}")))
    }

    fn job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.tables.jobs.get(id).cloned())
    }

    fn jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let rows = self.tables.jobs.values().cloned().collect();
        Ok(newest_first(rows, |job: &Job| (job.created_at, job.id.clone())))
    }

    fn jobs_for_company(&self, company: &CompanyId) -> Result<Vec<Job>, RepositoryError> {
        let rows = self
            .tables
            .jobs
            .values()
            .filter(|job| &job.company == company)
            .cloned()
            .collect();
        Ok(newest_first(rows, |job: &Job| (job.created_at, job.id.clone())))
    }

    fn insert_job(&mut self, job: Job) -> Result<(), RepositoryError> {
        if self.tables.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Duplicate(format!(
                "job {} already exists",
                job.id
            )));
        }
        self.tables.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    fn save_job(&mut self, job: Job) -> Result<(), RepositoryError> {
        #[cfg(test)]
        {
            if self.fail_job_saves {
                return Err(RepositoryError::Unavailable(
                    "job collection read-only".to_string(),
                ));
            }
        }

        match self.tables.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                Ok(())
            }
            None => Err(RepositoryError::Missing(format!("job {}", job.id))),
        }
    }

    fn transition_jobs(
        &mut self,
        company: &CompanyId,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<usize, RepositoryError> {
        let now = Utc::now();
        let mut changed = 0;
        for job in self
            .tables
            .jobs
            .values_mut()
            .filter(|job| &job.company == company && job.status == from)
        {
            job.status = to;
            job.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    fn delete_jobs(&mut self, ids: &[JobId]) -> Result<usize, RepositoryError> {
        #[cfg(test)]
        {
            if self.fail_job_deletes {
                return Err(RepositoryError::Unavailable(
                    "job collection offline".to_string(),
                ));
            }
        }

        Ok(ids
            .iter()
            .filter(|id| self.tables.jobs.remove(*id).is_some())
            .count())
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.tables.applications.get(id).cloned())
    }

    fn application_for(
        &self,
        job: &JobId,
        applicant: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self
            .tables
            .applications
            .values()
            .find(|application| &application.job == job && &application.applicant == applicant)
            .cloned())
    }

    fn applications_by_applicant(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let rows = self
            .tables
            .applications
            .values()
            .filter(|application| &application.applicant == applicant)
            .cloned()
            .collect();
        Ok(newest_first(rows, |application: &Application| {
            (application.created_at, application.id.clone())
        }))
    }

    fn applications_for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError> {
        let rows = self
            .tables
            .applications
            .values()
            .filter(|application| &application.job == job)
            .cloned()
            .collect();
        Ok(newest_first(rows, |application: &Application| {
            (application.created_at, application.id.clone())
        }))
    }

    fn insert_application(&mut self, application: Application) -> Result<(), RepositoryError> {
        if self.application_for(&application.job, &application.applicant)?.is_some() {
            return Err(RepositoryError::Duplicate(format!(
                "user {} has already applied to job {}",
                application.applicant, application.job
            )));
        }
        self.tables
            .applications
            .insert(application.id.clone(), application);
        Ok(())
    }

    fn save_application(&mut self, application: Application) -> Result<(), RepositoryError> {
        match self.tables.applications.get_mut(&application.id) {
            Some(slot) => {
                *slot = application;
                Ok(())
            }
            None => Err(RepositoryError::Missing(format!(
                "application {}",
                application.id
            ))),
        }
    }

    fn delete_applications_for_jobs(&mut self, jobs: &[JobId]) -> Result<usize, RepositoryError> {
        let before = self.tables.applications.len();
        self.tables
            .applications
            .retain(|_, application| !jobs.contains(&application.job));
        Ok(before - self.tables.applications.len())
    }
}
