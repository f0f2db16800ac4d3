use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::board::assets::{AssetError, AssetStore, AssetUpload};
use crate::board::companies::CompanyRegistration;
use crate::board::domain::{Company, Job, NumberInput, Role, User};
use crate::board::jobs::JobDraft;
use crate::board::notify::{Notification, NotificationError, NotificationPublisher};
use crate::board::store::{BoardStore, BoardTransaction, MemoryBoardStore, RepositoryError};
use crate::board::users::UserRegistration;
use crate::board::JobBoard;

pub(super) type MemoryBoard = JobBoard<MemoryBoardStore, MemoryNotifier, MemoryAssets>;

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<Notification>>,
    offline: bool,
}

impl MemoryNotifier {
    pub(super) fn offline() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            offline: true,
        }
    }

    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        if self.offline {
            return Err(NotificationError::Transport("smtp relay down".to_string()));
        }
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryAssets {
    uploads: Mutex<Vec<AssetUpload>>,
    offline: bool,
}

impl MemoryAssets {
    pub(super) fn offline() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            offline: true,
        }
    }

    pub(super) fn uploads(&self) -> Vec<AssetUpload> {
        self.uploads.lock().expect("asset mutex poisoned").clone()
    }
}

impl AssetStore for MemoryAssets {
    fn upload(&self, upload: AssetUpload) -> Result<String, AssetError> {
        if self.offline {
            return Err(AssetError::Unavailable("bucket unreachable".to_string()));
        }
        let url = format!("https://assets.test/{}", upload.file_name);
        self.uploads
            .lock()
            .expect("asset mutex poisoned")
            .push(upload);
        Ok(url)
    }
}

/// Store whose every transaction fails before running.
pub(super) struct UnavailableStore;

impl BoardStore for UnavailableStore {
    fn transaction<T, E, F>(&self, _work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn BoardTransaction) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }
}

pub(super) fn build_board() -> (
    MemoryBoard,
    Arc<MemoryBoardStore>,
    Arc<MemoryNotifier>,
    Arc<MemoryAssets>,
) {
    build_board_with(MemoryNotifier::default(), MemoryAssets::default())
}

pub(super) fn build_board_with(
    notifier: MemoryNotifier,
    assets: MemoryAssets,
) -> (
    MemoryBoard,
    Arc<MemoryBoardStore>,
    Arc<MemoryNotifier>,
    Arc<MemoryAssets>,
) {
    let store = Arc::new(MemoryBoardStore::new());
    let notifier = Arc::new(notifier);
    let assets = Arc::new(assets);
    let board = JobBoard::new(store.clone(), notifier.clone(), assets.clone());
    (board, store, notifier, assets)
}

pub(super) fn register(board: &MemoryBoard, name: &str, role: Role) -> User {
    board
        .users
        .register(UserRegistration {
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: None,
            role,
        })
        .expect("user registers")
}

pub(super) fn recruiter(board: &MemoryBoard) -> User {
    register(board, "Rita Recruiter", Role::Recruiter)
}

pub(super) fn student(board: &MemoryBoard, name: &str) -> User {
    register(board, name, Role::Student)
}

pub(super) fn company(board: &MemoryBoard, owner: &User, name: &str) -> Company {
    board
        .companies
        .register(
            CompanyRegistration {
                name: name.to_string(),
                description: Some("Builds developer tooling".to_string()),
                website: None,
                location: Some("Remote".to_string()),
            },
            &owner.id,
        )
        .expect("company registers")
}

pub(super) fn draft(title: &str) -> JobDraft {
    JobDraft {
        title: Some(title.to_string()),
        description: Some("Ship features across the stack".to_string()),
        requirements: Some("React,Node,SQL".into()),
        salary: Some(NumberInput::from(120_000u64)),
        location: Some("Berlin".to_string()),
        job_type: Some("Full-time".to_string()),
        experience_level: Some(NumberInput::from(3u64)),
        position: Some(NumberInput::from(2u64)),
    }
}

pub(super) fn post(board: &MemoryBoard, company: &Company, owner: &User, title: &str) -> Job {
    board
        .jobs
        .post(draft(title), &company.id, &owner.id)
        .expect("job posts")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
