use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::backend::{FileStore, JobBoardBackend, NotificationPublisher};
use super::domain::{
    ApplicationId, ApplicationScope, ApplicationStatus, JobId, JobRecord, SavedJob,
};
use super::filter::FilterCriteria;
use super::service::BoardService;
use super::validation::{ApplicationForm, CompanyForm, FileUpload, JobDraft, ValidationErrors};
use super::views::{JobCardView, JobDetailView};
use crate::request::{ActionError, ActionErrorKind, RequestState};
use crate::session::{require_recruiter, require_user, AccessToken, GuardRejection};

/// Router builder exposing the job board over HTTP.
pub fn board_router<B, F, N>(service: Arc<BoardService<B, F, N>>) -> Router
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            get(list_jobs_handler::<B, F, N>).post(create_job_handler::<B, F, N>),
        )
        .route(
            "/api/v1/jobs/:job_id",
            get(job_detail_handler::<B, F, N>).delete(delete_job_handler::<B, F, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/status",
            patch(hiring_status_handler::<B, F, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/save",
            post(toggle_saved_handler::<B, F, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/applications",
            get(job_applications_handler::<B, F, N>).post(apply_handler::<B, F, N>),
        )
        .route("/api/v1/saved-jobs", get(saved_jobs_handler::<B, F, N>))
        .route("/api/v1/my-jobs", get(my_jobs_handler::<B, F, N>))
        .route(
            "/api/v1/applications",
            get(my_applications_handler::<B, F, N>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            patch(application_status_handler::<B, F, N>),
        )
        .route(
            "/api/v1/companies",
            get(companies_handler::<B, F, N>).post(create_company_handler::<B, F, N>),
        )
        .with_state(service)
}

/// File attached to a JSON form, with its bytes base64 encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct FilePayload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub data_base64: String,
}

impl FilePayload {
    /// Undecodable payloads are treated as a missing file.
    fn into_upload(self) -> Option<FileUpload> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.data_base64.trim())
            .ok()?;
        Some(FileUpload {
            file_name: self.file_name,
            content_type: self.content_type,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HiringStatusRequest {
    pub is_open: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationStatusRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationPayload {
    pub experience: Option<i64>,
    pub why_hire: String,
    pub resume: Option<FilePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompanyPayload {
    pub name: String,
    pub about: String,
    pub logo: Option<FilePayload>,
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<AccessToken> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| AccessToken::new(token))
}

pub(crate) async fn list_jobs_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Query(criteria): Query<FilterCriteria>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    if let Err(rejection) = require_user(&session).await {
        return guard_response(&rejection);
    }

    let listing = service.list_jobs(&session);
    let saved = service.list_saved_jobs(&session);
    let filters = criteria.clone();
    tokio::join!(listing.trigger(criteria), saved.trigger(()));

    let bookmarks = saved.snapshot();
    render(listing.snapshot(), StatusCode::OK, |jobs| {
        listing_body(&jobs, bookmarks, &filters, Utc::now())
    })
}

/// Listing payload. A failed bookmark lookup does not fail the listing; it is flagged
/// with `saved_unavailable` and every card reports `saved: false`.
pub(crate) fn listing_body(
    jobs: &[JobRecord],
    bookmarks: RequestState<Vec<SavedJob>>,
    filters: &FilterCriteria,
    now: DateTime<Utc>,
) -> serde_json::Value {
    let saved_unavailable = bookmarks.error.is_some();
    let saved = bookmarks.data.unwrap_or_default();
    json!({
        "jobs": JobCardView::listing(jobs, &saved, now),
        "filters": filters,
        "active_filters": filters.active_count(),
        "saved_unavailable": saved_unavailable,
    })
}

pub(crate) async fn create_job_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Json(draft): Json<JobDraft>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    let user = match service.guard_post_job(&session).await {
        Ok(user) => user,
        Err(rejection) => return guard_response(&rejection),
    };
    let job = match draft.validate() {
        Ok(job) => job,
        Err(errors) => return validation_response(&errors),
    };

    let action = service.create_job(&session);
    action.trigger(job).await;
    render(action.snapshot(), StatusCode::CREATED, |job| {
        JobDetailView::for_viewer(&job, &user.id, Utc::now())
    })
}

pub(crate) async fn job_detail_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    let user = match require_user(&session).await {
        Ok(user) => user,
        Err(rejection) => return guard_response(&rejection),
    };

    let action = service.get_job(&session, JobId(job_id));
    action.trigger(()).await;
    render(action.snapshot(), StatusCode::OK, |job| {
        JobDetailView::for_viewer(&job, &user.id, Utc::now())
    })
}

pub(crate) async fn delete_job_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    if let Err(rejection) = require_user(&session).await {
        return guard_response(&rejection);
    }

    let action = service.delete_job(&session, JobId(job_id));
    action.trigger(()).await;
    render(action.snapshot(), StatusCode::OK, |job| {
        json!({ "deleted": job.id, "title": job.title })
    })
}

pub(crate) async fn hiring_status_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
    Json(request): Json<HiringStatusRequest>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    let user = match require_user(&session).await {
        Ok(user) => user,
        Err(rejection) => return guard_response(&rejection),
    };

    let action = service.update_hiring_status(&session, JobId(job_id));
    action.trigger(request.is_open).await;
    render(action.snapshot(), StatusCode::OK, |job| {
        JobDetailView::for_viewer(&job, &user.id, Utc::now())
    })
}

pub(crate) async fn toggle_saved_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    if let Err(rejection) = require_user(&session).await {
        return guard_response(&rejection);
    }

    let job_id = JobId(job_id);
    let saved = service.list_saved_jobs(&session);
    if saved.trigger(()).await.is_none() {
        return render(saved.snapshot(), StatusCode::OK, |_| json!({}));
    }
    let already_saved = saved
        .snapshot()
        .data
        .unwrap_or_default()
        .iter()
        .any(|entry| entry.job_id == job_id);

    let action = service.toggle_saved_job(&session, already_saved);
    action.trigger(job_id).await;
    render(action.snapshot(), StatusCode::OK, |outcome| outcome)
}

pub(crate) async fn saved_jobs_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    if let Err(rejection) = require_user(&session).await {
        return guard_response(&rejection);
    }

    let action = service.list_saved_jobs(&session);
    action.trigger(()).await;
    render(action.snapshot(), StatusCode::OK, |saved| {
        json!({ "jobs": JobCardView::saved(&saved, Utc::now()) })
    })
}

pub(crate) async fn my_jobs_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    if let Err(rejection) = require_recruiter(&session).await {
        return guard_response(&rejection);
    }

    let action = service.list_my_jobs(&session);
    action.trigger(()).await;
    render(action.snapshot(), StatusCode::OK, |jobs| {
        json!({ "jobs": JobCardView::listing(&jobs, &[], Utc::now()) })
    })
}

pub(crate) async fn job_applications_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    if let Err(rejection) = require_user(&session).await {
        return guard_response(&rejection);
    }

    let action = service.list_applications(&session, ApplicationScope::Job(JobId(job_id)));
    action.trigger(()).await;
    render(action.snapshot(), StatusCode::OK, |applications| {
        json!({ "applications": applications })
    })
}

pub(crate) async fn apply_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
    Json(payload): Json<ApplicationPayload>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    let user = match require_user(&session).await {
        Ok(user) => user,
        Err(rejection) => return guard_response(&rejection),
    };

    let form = ApplicationForm {
        experience: payload.experience,
        why_hire: payload.why_hire,
        resume: payload.resume.and_then(FilePayload::into_upload),
    };
    let submission = match form.validate(JobId(job_id), &user) {
        Ok(submission) => submission,
        Err(errors) => return validation_response(&errors),
    };

    let action = service.apply_to_job(&session);
    action.trigger(submission).await;
    render(action.snapshot(), StatusCode::CREATED, |application| {
        application
    })
}

pub(crate) async fn my_applications_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    let user = match require_user(&session).await {
        Ok(user) => user,
        Err(rejection) => return guard_response(&rejection),
    };

    let action = service.list_applications(&session, ApplicationScope::Candidate(user.id));
    action.trigger(()).await;
    render(action.snapshot(), StatusCode::OK, |applications| {
        json!({ "applications": applications })
    })
}

pub(crate) async fn application_status_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    Json(request): Json<ApplicationStatusRequest>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    if let Err(rejection) = require_user(&session).await {
        return guard_response(&rejection);
    }

    let action = service.update_application_status(&session, ApplicationId(application_id));
    action.trigger(request.status).await;
    render(action.snapshot(), StatusCode::OK, |application| application)
}

pub(crate) async fn companies_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    if let Err(rejection) = require_user(&session).await {
        return guard_response(&rejection);
    }

    let action = service.list_companies(&session);
    action.trigger(()).await;
    render(action.snapshot(), StatusCode::OK, |companies| {
        json!({ "companies": companies })
    })
}

pub(crate) async fn create_company_handler<B, F, N>(
    State(service): State<Arc<BoardService<B, F, N>>>,
    headers: HeaderMap,
    Json(payload): Json<CompanyPayload>,
) -> Response
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    let session = service.session(bearer_token(&headers));
    if let Err(rejection) = require_recruiter(&session).await {
        return guard_response(&rejection);
    }

    let form = CompanyForm {
        name: payload.name,
        about: payload.about,
        logo: payload.logo.and_then(FilePayload::into_upload),
    };
    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(errors) => return validation_response(&errors),
    };

    let action = service.create_company(&session);
    action.trigger(submission).await;
    render(action.snapshot(), StatusCode::CREATED, |company| company)
}

/// Renders a settled per-request binding.
fn render<T, V, R>(state: RequestState<T>, success: StatusCode, view: V) -> Response
where
    V: FnOnce(T) -> R,
    R: serde::Serialize,
{
    match (state.data, state.error) {
        (_, Some(error)) => error_response(&error),
        (Some(data), None) => (success, Json(view(data))).into_response(),
        (None, None) => {
            let payload = json!({ "error": "request did not settle" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) fn status_for(kind: ActionErrorKind) -> StatusCode {
    match kind {
        ActionErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ActionErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ActionErrorKind::NotFound => StatusCode::NOT_FOUND,
        ActionErrorKind::Conflict => StatusCode::CONFLICT,
        ActionErrorKind::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
        ActionErrorKind::Upload => StatusCode::BAD_GATEWAY,
        ActionErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(error: &ActionError) -> Response {
    let payload = json!({
        "error": error.message,
        "kind": error.kind,
    });
    (status_for(error.kind), Json(payload)).into_response()
}

fn guard_response(rejection: &GuardRejection) -> Response {
    let status = match rejection {
        GuardRejection::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
        GuardRejection::NotRecruiter { .. } => StatusCode::FORBIDDEN,
    };
    let payload = json!({
        "error": rejection.to_string(),
        "redirect": rejection.redirect(),
    });
    (status, Json(payload)).into_response()
}

fn validation_response(errors: &ValidationErrors) -> Response {
    let payload = json!({ "errors": errors.fields() });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}
