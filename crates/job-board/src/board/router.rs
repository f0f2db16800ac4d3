use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::assets::{AssetStore, AssetUpload};
use super::companies::{CompanyRegistration, CompanyUpdate};
use super::domain::{ApplicationId, CompanyId, JobId, Role, UserId};
use super::error::BoardError;
use super::jobs::JobDraft;
use super::notify::NotificationPublisher;
use super::store::BoardStore;
use super::users::{ProfileUpdate, UserRegistration};
use super::JobBoard;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

type BoardState<S, N, A> = State<Arc<JobBoard<S, N, A>>>;

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let status = match &self {
            BoardError::Validation(_) => StatusCode::BAD_REQUEST,
            BoardError::NotFound(_) => StatusCode::NOT_FOUND,
            BoardError::Conflict(_) => StatusCode::CONFLICT,
            BoardError::Precondition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BoardError::Upload(_) => StatusCode::BAD_GATEWAY,
            BoardError::Repository(err) => {
                error!(error = %err, "datastore failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

const NOT_OWNER: &str = "company belongs to another recruiter";

/// Whether `caller` owns the company. A missing company surfaces as not found.
fn owns_company<S, N, A>(
    board: &JobBoard<S, N, A>,
    caller: &Caller,
    company_id: &CompanyId,
) -> Result<bool, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    Ok(board.companies.get(company_id)?.owner == caller.user_id)
}

/// Whether `caller` owns the company the job is posted under.
fn owns_job<S, N, A>(
    board: &JobBoard<S, N, A>,
    caller: &Caller,
    job_id: &JobId,
) -> Result<bool, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let detail = board.jobs.get_by_id(job_id)?;
    owns_company(board, caller, &detail.job.company)
}

/// Identity supplied by the upstream authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    fn from_headers(headers: &HeaderMap) -> Result<Self, Response> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };
        let user_id = header(USER_ID_HEADER)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "user not authenticated"))?;
        let role = header(USER_ROLE_HEADER)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "user not authenticated"))?
            .parse::<Role>()
            .map_err(|err| reject(StatusCode::UNAUTHORIZED, &err.to_string()))?;
        Ok(Self {
            user_id: UserId(user_id.to_string()),
            role,
        })
    }
}

#[async_trait]
impl<St> FromRequestParts<St> for Caller
where
    St: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        Caller::from_headers(&parts.headers)
    }
}

/// Caller holding the recruiter role.
#[derive(Debug, Clone)]
pub struct Recruiter(pub Caller);

#[async_trait]
impl<St> FromRequestParts<St> for Recruiter
where
    St: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_headers(&parts.headers)?;
        if caller.role != Role::Recruiter {
            return Err(reject(StatusCode::FORBIDDEN, "recruiter role required"));
        }
        Ok(Recruiter(caller))
    }
}

/// Caller holding the student role.
#[derive(Debug, Clone)]
pub struct Student(pub Caller);

#[async_trait]
impl<St> FromRequestParts<St> for Student
where
    St: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_headers(&parts.headers)?;
        if caller.role != Role::Student {
            return Err(reject(StatusCode::FORBIDDEN, "student role required"));
        }
        Ok(Student(caller))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileRequest {
    #[serde(flatten)]
    update: ProfileUpdate,
    #[serde(default)]
    resume: Option<AssetUpload>,
    #[serde(default)]
    photo: Option<AssetUpload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompanyUpdateRequest {
    #[serde(flatten)]
    update: CompanyUpdate,
    #[serde(default)]
    logo: Option<AssetUpload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivationRequest {
    is_active: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobRequest {
    #[serde(flatten)]
    draft: JobDraft,
    #[serde(default)]
    company_id: Option<CompanyId>,
    #[serde(default)]
    status: Option<String>,
}

impl JobRequest {
    fn company_id(&self) -> Result<CompanyId, BoardError> {
        self.company_id
            .clone()
            .filter(|id| !id.as_str().trim().is_empty())
            .ok_or_else(|| BoardError::missing("company_id"))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct KeywordQuery {
    #[serde(default)]
    keyword: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    #[serde(default)]
    status: String,
}

/// Router builder exposing the board operations over HTTP.
pub fn board_router<S, N, A>(board: Arc<JobBoard<S, N, A>>) -> Router
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    Router::new()
        .route("/api/v1/users", post(register_user::<S, N, A>))
        .route("/api/v1/users/:user_id", get(get_user::<S, N, A>))
        .route("/api/v1/profile", put(update_profile::<S, N, A>))
        .route(
            "/api/v1/companies",
            post(register_company::<S, N, A>).get(list_companies::<S, N, A>),
        )
        .route(
            "/api/v1/companies/:company_id",
            get(get_company::<S, N, A>)
                .put(update_company::<S, N, A>)
                .delete(delete_company::<S, N, A>),
        )
        .route(
            "/api/v1/companies/:company_id/status",
            put(set_company_active::<S, N, A>),
        )
        .route(
            "/api/v1/jobs",
            post(post_job::<S, N, A>).get(list_jobs::<S, N, A>),
        )
        .route(
            "/api/v1/jobs/:job_id",
            get(get_job::<S, N, A>).put(update_job::<S, N, A>),
        )
        .route("/api/v1/recruiter/jobs", get(list_recruiter_jobs::<S, N, A>))
        .route(
            "/api/v1/jobs/:job_id/applications",
            post(apply_to_job::<S, N, A>).get(list_job_applicants::<S, N, A>),
        )
        .route(
            "/api/v1/applications",
            get(list_applied_jobs::<S, N, A>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(update_application_status::<S, N, A>),
        )
        .with_state(board)
}

pub(crate) async fn register_user<S, N, A>(
    State(board): BoardState<S, N, A>,
    Json(registration): Json<UserRegistration>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let user = board.users.register(registration)?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub(crate) async fn get_user<S, N, A>(
    State(board): BoardState<S, N, A>,
    Path(user_id): Path<String>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let user = board.users.get(&UserId(user_id))?;
    Ok(Json(user).into_response())
}

pub(crate) async fn update_profile<S, N, A>(
    State(board): BoardState<S, N, A>,
    caller: Caller,
    Json(request): Json<ProfileRequest>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let outcome = board.users.update_profile(
        &caller.user_id,
        request.update,
        request.resume,
        request.photo,
    )?;
    Ok(Json(outcome).into_response())
}

pub(crate) async fn register_company<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
    Json(registration): Json<CompanyRegistration>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let company = board.companies.register(registration, &caller.user_id)?;
    Ok((StatusCode::CREATED, Json(company)).into_response())
}

pub(crate) async fn list_companies<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let companies = board.companies.list_for_owner(&caller.user_id)?;
    Ok(Json(companies).into_response())
}

pub(crate) async fn get_company<S, N, A>(
    State(board): BoardState<S, N, A>,
    Path(company_id): Path<String>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let company = board.companies.get(&CompanyId(company_id))?;
    Ok(Json(company).into_response())
}

pub(crate) async fn update_company<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
    Path(company_id): Path<String>,
    Json(request): Json<CompanyUpdateRequest>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let company_id = CompanyId(company_id);
    if !owns_company(&board, &caller, &company_id)? {
        return Ok(reject(StatusCode::FORBIDDEN, NOT_OWNER));
    }
    let company = board
        .companies
        .update(&company_id, request.update, request.logo)?;
    Ok(Json(company).into_response())
}

pub(crate) async fn set_company_active<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
    Path(company_id): Path<String>,
    Json(request): Json<ActivationRequest>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let company_id = CompanyId(company_id);
    if !owns_company(&board, &caller, &company_id)? {
        return Ok(reject(StatusCode::FORBIDDEN, NOT_OWNER));
    }
    let outcome = board.companies.set_active(&company_id, request.is_active)?;
    Ok(Json(outcome).into_response())
}

pub(crate) async fn delete_company<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
    Path(company_id): Path<String>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let company_id = CompanyId(company_id);
    if !owns_company(&board, &caller, &company_id)? {
        return Ok(reject(StatusCode::FORBIDDEN, NOT_OWNER));
    }
    let summary = board.companies.delete(&company_id)?;
    Ok(Json(summary).into_response())
}

pub(crate) async fn post_job<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
    Json(request): Json<JobRequest>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let company_id = request.company_id()?;
    if !owns_company(&board, &caller, &company_id)? {
        return Ok(reject(StatusCode::FORBIDDEN, NOT_OWNER));
    }
    let job = board
        .jobs
        .post(request.draft, &company_id, &caller.user_id)?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

pub(crate) async fn update_job<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
    Path(job_id): Path<String>,
    Json(request): Json<JobRequest>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let job_id = JobId(job_id);
    let company_id = request.company_id()?;
    // the job may only move between companies the caller owns
    if !owns_job(&board, &caller, &job_id)? || !owns_company(&board, &caller, &company_id)? {
        return Ok(reject(StatusCode::FORBIDDEN, NOT_OWNER));
    }
    let job = board.jobs.update(
        &job_id,
        request.draft,
        &company_id,
        request.status.as_deref(),
    )?;
    Ok(Json(job).into_response())
}

pub(crate) async fn list_jobs<S, N, A>(
    State(board): BoardState<S, N, A>,
    Query(query): Query<KeywordQuery>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let jobs = board.jobs.list_all(&query.keyword)?;
    Ok(Json(jobs).into_response())
}

pub(crate) async fn get_job<S, N, A>(
    State(board): BoardState<S, N, A>,
    Path(job_id): Path<String>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let job = board.jobs.get_by_id(&JobId(job_id))?;
    Ok(Json(job).into_response())
}

pub(crate) async fn list_recruiter_jobs<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let jobs = board.jobs.list_by_creator(&caller.user_id)?;
    Ok(Json(jobs).into_response())
}

pub(crate) async fn apply_to_job<S, N, A>(
    State(board): BoardState<S, N, A>,
    Student(caller): Student,
    Path(job_id): Path<String>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let application = board
        .applications
        .apply(&JobId(job_id), &caller.user_id)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

pub(crate) async fn list_job_applicants<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
    Path(job_id): Path<String>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let job_id = JobId(job_id);
    if !owns_job(&board, &caller, &job_id)? {
        return Ok(reject(StatusCode::FORBIDDEN, NOT_OWNER));
    }
    let applicants = board.applications.list_for_job(&job_id)?;
    Ok(Json(applicants).into_response())
}

pub(crate) async fn list_applied_jobs<S, N, A>(
    State(board): BoardState<S, N, A>,
    caller: Caller,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let applied = board.applications.list_for_applicant(&caller.user_id)?;
    Ok(Json(applied).into_response())
}

pub(crate) async fn update_application_status<S, N, A>(
    State(board): BoardState<S, N, A>,
    Recruiter(caller): Recruiter,
    Path(application_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Response, BoardError>
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
    A: AssetStore + 'static,
{
    let application_id = ApplicationId(application_id);
    let target = board.applications.get(&application_id)?;
    if !owns_job(&board, &caller, &target.job)? {
        return Ok(reject(StatusCode::FORBIDDEN, NOT_OWNER));
    }
    let application = board
        .applications
        .update_status(&application_id, &request.status)?;
    Ok(Json(application).into_response())
}
