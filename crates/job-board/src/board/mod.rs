//! Company, job, and application lifecycle with cascade consistency.
//!
//! Each component is a thin service over a shared [`BoardStore`]; multi-record writes run
//! inside a single store transaction so a failure cannot leave dangling references.

pub mod applications;
pub mod assets;
pub mod cascade;
pub mod companies;
pub mod domain;
pub mod error;
pub mod jobs;
pub mod notify;
pub mod router;
pub mod store;
pub mod users;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use applications::ApplicationLedger;
pub use assets::{AssetError, AssetStore, AssetUpload};
pub use cascade::{CascadeCoordinator, DeletionSummary};
pub use companies::{ActivationOutcome, CompanyRegistration, CompanyRegistry, CompanyUpdate};
pub use domain::{
    Applicant, ApplicantSummary, Application, ApplicationId, ApplicationStatus, AppliedJob,
    Company, CompanyId, Job, JobDetail, JobId, JobListing, JobStatus, ListInput, NumberInput,
    Profile, Role, User, UserId,
};
pub use error::BoardError;
pub use jobs::{JobCatalog, JobDraft};
pub use notify::{
    Notification, NotificationError, NotificationPublisher, QueuedNotifier, Recipient,
    TracingNotifier,
};
pub use router::board_router;
pub use store::{BoardStore, BoardTransaction, MemoryBoardStore, RepositoryError};
pub use users::{
    ProfileAsset, ProfileUpdate, ProfileUpdateOutcome, UploadFailure, UserDirectory,
    UserRegistration,
};

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Render a record id. The sequence is padded to the width of `u64::MAX` so that string
/// order always matches creation order.
pub(crate) fn sequenced_id(prefix: &str, sequence: u64) -> String {
    format!("{prefix}-{sequence:020}")
}

/// Next id from the monotonic counter shared by every record kind.
pub(crate) fn next_id(prefix: &str) -> String {
    sequenced_id(prefix, RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// All board components wired over one store, notifier, and asset backend.
pub struct JobBoard<S, N, A> {
    pub users: UserDirectory<S, A>,
    pub companies: CompanyRegistry<S, A>,
    pub jobs: JobCatalog<S, N>,
    pub applications: ApplicationLedger<S, N>,
    pub cascade: CascadeCoordinator<S>,
}

impl<S, N, A> JobBoard<S, N, A>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, assets: Arc<A>) -> Self {
        Self {
            users: UserDirectory::new(store.clone(), assets.clone()),
            companies: CompanyRegistry::new(store.clone(), assets),
            jobs: JobCatalog::new(store.clone(), notifier.clone()),
            applications: ApplicationLedger::new(store.clone(), notifier),
            cascade: CascadeCoordinator::new(store),
        }
    }
}
