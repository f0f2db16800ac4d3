use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::assets::{AssetStore, AssetUpload};
use super::cascade::{self, CascadeCoordinator, DeletionSummary};
use super::domain::{Company, CompanyId, UserId};
use super::error::BoardError;
use super::next_id;
use super::store::BoardStore;

/// Fields accepted when registering a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRegistration {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Response of an activation change, noting whether dependent jobs were swept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationOutcome {
    pub company: Company,
    pub jobs_rejected: Option<usize>,
    pub message: String,
}

pub struct CompanyRegistry<S, A> {
    store: Arc<S>,
    assets: Arc<A>,
    cascade: CascadeCoordinator<S>,
}

fn next_company_id() -> CompanyId {
    CompanyId(next_id("co"))
}

impl<S, A> CompanyRegistry<S, A>
where
    S: BoardStore + 'static,
    A: AssetStore + 'static,
{
    pub fn new(store: Arc<S>, assets: Arc<A>) -> Self {
        let cascade = CascadeCoordinator::new(store.clone());
        Self {
            store,
            assets,
            cascade,
        }
    }

    pub fn register(
        &self,
        registration: CompanyRegistration,
        owner: &UserId,
    ) -> Result<Company, BoardError> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(BoardError::missing("company name"));
        }

        let now = Utc::now();
        let company = Company {
            id: next_company_id(),
            name: name.to_string(),
            description: registration.description,
            website: registration.website,
            location: registration.location,
            logo: None,
            is_active: true,
            owner: owner.clone(),
            created_at: now,
            updated_at: now,
        };

        self.store.transaction(|tx| {
            tx.insert_company(company.clone())?;
            Ok::<_, BoardError>(())
        })?;

        info!(company = %company.id, owner = %owner, "company registered");
        Ok(company)
    }

    pub fn get(&self, company_id: &CompanyId) -> Result<Company, BoardError> {
        self.store.transaction(|tx| {
            tx.company(company_id)?
                .ok_or_else(|| BoardError::NotFound(format!("company {company_id}")))
        })
    }

    pub fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Company>, BoardError> {
        self.store
            .transaction(|tx| tx.companies_owned_by(owner).map_err(BoardError::from))
    }

    /// Merge scalar fields and, when supplied, replace the logo with a freshly uploaded asset.
    pub fn update(
        &self,
        company_id: &CompanyId,
        update: CompanyUpdate,
        logo: Option<AssetUpload>,
    ) -> Result<Company, BoardError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(BoardError::missing("company name"));
            }
        }

        // settle existence and the rename before anything reaches asset storage
        let existing = self.store.transaction(|tx| {
            let existing = tx
                .company(company_id)?
                .ok_or_else(|| BoardError::NotFound(format!("company {company_id}")))?;
            if let Some(name) = update.name.as_deref().map(str::trim) {
                if let Some(other) = tx.company_named(name)? {
                    if other.id != existing.id {
                        return Err(BoardError::Conflict(format!(
                            "company '{name}' is already registered"
                        )));
                    }
                }
            }
            Ok::<_, BoardError>(existing)
        })?;

        let logo_url = match logo {
            Some(upload) => Some(self.assets.upload(upload)?),
            None => None,
        };

        self.store.transaction(|tx| {
            // re-read inside the transaction so a concurrent delete is not resurrected
            let mut company = tx
                .company(&existing.id)?
                .ok_or_else(|| BoardError::NotFound(format!("company {company_id}")))?;

            if let Some(name) = update.name {
                company.name = name.trim().to_string();
            }
            if let Some(description) = update.description {
                company.description = Some(description);
            }
            if let Some(website) = update.website {
                company.website = Some(website);
            }
            if let Some(location) = update.location {
                company.location = Some(location);
            }
            if let Some(url) = logo_url {
                company.logo = Some(url);
            }
            company.updated_at = Utc::now();

            tx.save_company(company.clone())?;
            Ok::<_, BoardError>(company)
        })
    }

    /// Flip the activation flag. Deactivating an active company rejects its active jobs in
    /// the same transaction; reactivating never restores them.
    pub fn set_active(
        &self,
        company_id: &CompanyId,
        is_active: bool,
    ) -> Result<ActivationOutcome, BoardError> {
        let outcome = self.store.transaction(|tx| {
            let mut company = tx
                .company(company_id)?
                .ok_or_else(|| BoardError::NotFound(format!("company {company_id}")))?;

            let deactivating = company.is_active && !is_active;
            company.is_active = is_active;
            company.updated_at = Utc::now();
            tx.save_company(company.clone())?;

            let jobs_rejected = if deactivating {
                Some(cascade::reject_active_jobs(tx, company_id)?)
            } else {
                None
            };

            let message = match (is_active, jobs_rejected) {
                (false, Some(count)) => {
                    format!("Company deactivated; {count} active job(s) marked as rejected")
                }
                (false, None) => "Company is already inactive".to_string(),
                (true, _) => "Company activated".to_string(),
            };

            Ok::<_, BoardError>(ActivationOutcome {
                company,
                jobs_rejected,
                message,
            })
        })?;

        info!(
            company = %company_id,
            is_active,
            jobs_rejected = outcome.jobs_rejected.unwrap_or(0),
            "company activation updated"
        );
        Ok(outcome)
    }

    pub fn delete(&self, company_id: &CompanyId) -> Result<DeletionSummary, BoardError> {
        self.cascade.deletion_sweep(company_id)
    }
}
