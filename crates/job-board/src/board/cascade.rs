use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use super::domain::{CompanyId, JobId, JobStatus};
use super::error::BoardError;
use super::store::{BoardStore, BoardTransaction, RepositoryError};

/// Result of removing a company together with everything hanging off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionSummary {
    pub company_id: CompanyId,
    pub jobs_removed: usize,
    pub applications_removed: usize,
}

/// Propagates company lifecycle changes into the job catalog and application ledger.
pub struct CascadeCoordinator<S> {
    store: Arc<S>,
}

impl<S> CascadeCoordinator<S>
where
    S: BoardStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Reject every still-active job of the company. Running it again is a no-op.
    pub fn deactivation_sweep(&self, company_id: &CompanyId) -> Result<usize, BoardError> {
        self.store
            .transaction(|tx| reject_active_jobs(tx, company_id).map_err(BoardError::from))
    }

    /// Remove the company's applications, then its jobs, then the company itself, as one
    /// transaction.
    pub fn deletion_sweep(&self, company_id: &CompanyId) -> Result<DeletionSummary, BoardError> {
        let result = self.store.transaction(|tx| purge_company(tx, company_id));
        match &result {
            Ok(summary) => info!(
                company = %summary.company_id,
                jobs = summary.jobs_removed,
                applications = summary.applications_removed,
                "company deleted"
            ),
            Err(BoardError::Repository(err)) => {
                error!(company = %company_id, error = %err, "deletion sweep aborted")
            }
            Err(_) => {}
        }
        result
    }
}

pub(crate) fn reject_active_jobs(
    tx: &mut dyn BoardTransaction,
    company_id: &CompanyId,
) -> Result<usize, RepositoryError> {
    let rejected = tx.transition_jobs(company_id, JobStatus::Active, JobStatus::Rejected)?;
    if rejected > 0 {
        info!(company = %company_id, rejected, "rejected active jobs of deactivated company");
    }
    Ok(rejected)
}

pub(crate) fn purge_company(
    tx: &mut dyn BoardTransaction,
    company_id: &CompanyId,
) -> Result<DeletionSummary, BoardError> {
    if tx.company(company_id)?.is_none() {
        return Err(BoardError::NotFound(format!("company {company_id}")));
    }

    let job_ids: Vec<JobId> = tx
        .jobs_for_company(company_id)?
        .into_iter()
        .map(|job| job.id)
        .collect();

    // applications before jobs, jobs before the company
    let applications_removed = tx.delete_applications_for_jobs(&job_ids)?;
    let jobs_removed = tx.delete_jobs(&job_ids)?;
    tx.delete_company(company_id)?;

    Ok(DeletionSummary {
        company_id: company_id.clone(),
        jobs_removed,
        applications_removed,
    })
}
