use crate::infra::InMemoryAssetStore;
use clap::Args;
use job_board::board::{
    AssetUpload, BoardError, CompanyRegistration, CompanyUpdate, JobBoard, JobDraft,
    MemoryBoardStore, ProfileUpdate, Role, TracingNotifier, User, UserRegistration,
};
use job_board::error::AppError;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of students who apply to the posted jobs
    #[arg(long, default_value_t = 2)]
    pub(crate) students: usize,
    /// Stop after deactivation instead of deleting the company
    #[arg(long)]
    pub(crate) keep_company: bool,
}

type DemoBoard = JobBoard<MemoryBoardStore, TracingNotifier, InMemoryAssetStore>;

fn demo_draft(title: &str, requirements: &str, salary: &str) -> JobDraft {
    JobDraft {
        title: Some(title.to_string()),
        description: Some(format!("{title} for the platform team")),
        requirements: Some(requirements.into()),
        salary: Some(salary.into()),
        location: Some("Remote".to_string()),
        job_type: Some("Full-time".to_string()),
        experience_level: Some(2u64.into()),
        position: Some(1u64.into()),
    }
}

fn register(board: &DemoBoard, full_name: &str, email: &str, role: Role) -> Result<User, AppError> {
    let user = board.users.register(UserRegistration {
        full_name: full_name.to_string(),
        email: email.to_string(),
        phone: None,
        role,
    })?;
    println!("- Registered {} {} ({})", role.label(), user.full_name, user.id);
    Ok(user)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        students,
        keep_company,
    } = args;

    let board: DemoBoard = JobBoard::new(
        Arc::new(MemoryBoardStore::new()),
        Arc::new(TracingNotifier::new("no-reply@jobboard.local")),
        Arc::new(InMemoryAssetStore::new("http://localhost:8080/assets")),
    );

    println!("Job board lifecycle demo");
    let recruiter = register(&board, "Rita Recruiter", "rita@acme.test", Role::Recruiter)?;
    let company = board.companies.register(
        CompanyRegistration {
            name: "Acme Robotics".to_string(),
            description: Some("Warehouse automation".to_string()),
            website: Some("https://acme.test".to_string()),
            location: Some("Berlin".to_string()),
        },
        &recruiter.id,
    )?;
    let company = board.companies.update(
        &company.id,
        CompanyUpdate::default(),
        Some(AssetUpload::new("acme-logo.png", vec![0x89, 0x50, 0x4e, 0x47])),
    )?;
    println!(
        "- Company {} registered (logo {})",
        company.name,
        company.logo.as_deref().unwrap_or("none")
    );

    let backend = board.jobs.post(
        demo_draft("Backend Engineer", "Rust, Postgres, Kafka", "95000"),
        &company.id,
        &recruiter.id,
    )?;
    let firmware = board.jobs.post(
        demo_draft("Firmware Engineer", "C, RTOS", "88000"),
        &company.id,
        &recruiter.id,
    )?;
    for job in [&backend, &firmware] {
        println!(
            "- Posted {} [{}] requirements: {}",
            job.title,
            job.id,
            job.requirements.join(" | ")
        );
    }

    println!("\nApplications");
    for index in 1..=students {
        let student = register(
            &board,
            &format!("Student {index}"),
            &format!("student{index}@uni.test"),
            Role::Student,
        )?;
        board.users.update_profile(
            &student.id,
            ProfileUpdate {
                skills: Some("Rust, SQL, Rust".into()),
                ..ProfileUpdate::default()
            },
            Some(AssetUpload::new(format!("student{index}-cv.pdf"), b"%PDF".to_vec())),
            None,
        )?;
        let application = board.applications.apply(&backend.id, &student.id)?;
        println!("  {} applied -> {}", student.full_name, application.status);

        if let Err(err) = board.applications.apply(&backend.id, &student.id) {
            println!("  Second attempt refused: {err}");
        }
    }

    for applicant in board.applications.list_for_job(&backend.id)? {
        let application = board
            .applications
            .update_status(&applicant.application.id, "Shortlisted")?;
        let name = applicant
            .applicant_details
            .map(|summary| summary.full_name)
            .unwrap_or_else(|| "unknown".to_string());
        println!("  {name}: {}", application.status);
    }

    println!("\nDeactivation");
    let outcome = board.companies.set_active(&company.id, false)?;
    println!("- {}", outcome.message);
    match board.jobs.post(
        demo_draft("Ops Engineer", "Linux", "70000"),
        &company.id,
        &recruiter.id,
    ) {
        Err(BoardError::Precondition(reason)) => println!("- Posting refused: {reason}"),
        Err(err) => return Err(err.into()),
        Ok(job) => println!("- Unexpectedly posted {}", job.id),
    }

    if keep_company {
        return Ok(());
    }

    println!("\nDeletion");
    let summary = board.companies.delete(&company.id)?;
    println!(
        "- Removed {} with {} job(s) and {} application(s)",
        summary.company_id, summary.jobs_removed, summary.applications_removed
    );
    println!(
        "- Remaining jobs on the board: {}",
        board.jobs.list_all("")?.len()
    );

    Ok(())
}
