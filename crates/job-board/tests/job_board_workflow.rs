use std::sync::{Arc, Mutex};

use job_board::board::{
    AssetError, AssetStore, AssetUpload, BoardError, CompanyRegistration, JobBoard, JobDraft,
    JobStatus, MemoryBoardStore, Notification, NotificationError, NotificationPublisher,
    QueuedNotifier, Recipient, Role, User, UserRegistration,
};

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex").clone()
    }
}

impl NotificationPublisher for RecordingNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent.lock().expect("notifier mutex").push(notification);
        Ok(())
    }
}

struct LocalAssets;

impl AssetStore for LocalAssets {
    fn upload(&self, upload: AssetUpload) -> Result<String, AssetError> {
        Ok(format!("https://cdn.example.com/{}", upload.file_name))
    }
}

type Board<N> = JobBoard<MemoryBoardStore, N, LocalAssets>;

fn board_with<N: NotificationPublisher + 'static>(notifier: Arc<N>) -> Board<N> {
    JobBoard::new(
        Arc::new(MemoryBoardStore::new()),
        notifier,
        Arc::new(LocalAssets),
    )
}

fn user<N: NotificationPublisher + 'static>(board: &Board<N>, email: &str, role: Role) -> User {
    board
        .users
        .register(UserRegistration {
            full_name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            phone: None,
            role,
        })
        .expect("user registers")
}

fn draft(title: &str) -> JobDraft {
    JobDraft {
        title: Some(title.to_string()),
        description: Some("Build and run the hiring platform".to_string()),
        requirements: Some("Rust, Postgres".into()),
        salary: Some("90000".into()),
        location: Some("Remote".to_string()),
        job_type: Some("Contract".to_string()),
        experience_level: Some(1u64.into()),
        position: Some(1u64.into()),
    }
}

#[test]
fn company_lifecycle_cascades_through_jobs_and_applications() {
    let notifier = Arc::new(RecordingNotifier::default());
    let board = board_with(notifier.clone());
    let rita = user(&board, "rita@acme.test", Role::Recruiter);
    let ada = user(&board, "ada@uni.test", Role::Student);

    let acme = board
        .companies
        .register(
            CompanyRegistration {
                name: "Acme".to_string(),
                ..CompanyRegistration::default()
            },
            &rita.id,
        )
        .expect("company registers");

    let backend = board
        .jobs
        .post(draft("Backend Engineer"), &acme.id, &rita.id)
        .expect("backend posted");
    let frontend = board
        .jobs
        .post(draft("Frontend Engineer"), &acme.id, &rita.id)
        .expect("frontend posted");
    assert_eq!(backend.requirements, vec!["Rust", "Postgres"]);

    let application = board
        .applications
        .apply(&backend.id, &ada.id)
        .expect("ada applies");
    assert!(matches!(
        board.applications.apply(&backend.id, &ada.id),
        Err(BoardError::Conflict(_))
    ));

    let sent = notifier.sent();
    assert_eq!(
        sent.iter()
            .filter(|n| n.recipient == Recipient::AllUsers)
            .count(),
        2
    );
    assert!(sent
        .iter()
        .any(|n| n.recipient == Recipient::User(rita.id.clone())));

    let outcome = board
        .companies
        .set_active(&acme.id, false)
        .expect("deactivated");
    assert_eq!(outcome.jobs_rejected, Some(2));
    for job in [&backend, &frontend] {
        let stored = board.jobs.get_by_id(&job.id).expect("job kept");
        assert_eq!(stored.job.status, JobStatus::Rejected);
    }
    assert!(matches!(
        board.jobs.post(draft("Ops Engineer"), &acme.id, &rita.id),
        Err(BoardError::Precondition(_))
    ));

    let applied = board
        .applications
        .list_for_applicant(&ada.id)
        .expect("ada's applications");
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].application.id, application.id);

    let summary = board.companies.delete(&acme.id).expect("deleted");
    assert_eq!(summary.jobs_removed, 2);
    assert_eq!(summary.applications_removed, 1);
    assert!(board.jobs.list_all("").expect("jobs").is_empty());
    assert!(board
        .applications
        .list_for_applicant(&ada.id)
        .expect("ada's applications")
        .is_empty());
    assert!(matches!(
        board.companies.get(&acme.id),
        Err(BoardError::NotFound(_))
    ));
}

#[tokio::test]
async fn queued_notifications_reach_delivery_after_commit() {
    let delivery = Arc::new(RecordingNotifier::default());
    let (queue, handle) = QueuedNotifier::spawn(delivery.clone());
    let queue = Arc::new(queue);
    let board = board_with(queue.clone());
    let rita = user(&board, "rita@acme.test", Role::Recruiter);
    let acme = board
        .companies
        .register(
            CompanyRegistration {
                name: "Acme".to_string(),
                ..CompanyRegistration::default()
            },
            &rita.id,
        )
        .expect("company registers");

    board
        .jobs
        .post(draft("Backend Engineer"), &acme.id, &rita.id)
        .expect("posted");

    drop(board);
    drop(queue);
    handle.await.expect("delivery drained");

    let sent = delivery.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New job posted: Backend Engineer");
}
