use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationScope, ApplicationStatus, Company, JobId,
    JobRecord, NewApplication, NewCompany, NewJob, SavedJob,
};
use super::filter::JobQuery;
use crate::request::{ActionError, ActionErrorKind};
use crate::session::AccessToken;

/// Data-store client for the board tables. Implementations apply row-level rules
/// based on the caller resolved from `token`.
#[async_trait]
pub trait JobBoardBackend: Send + Sync + 'static {
    async fn list_jobs(
        &self,
        token: Option<&AccessToken>,
        query: &JobQuery,
    ) -> Result<Vec<JobRecord>, BackendError>;

    async fn get_job(
        &self,
        token: Option<&AccessToken>,
        id: JobId,
    ) -> Result<JobRecord, BackendError>;

    async fn create_job(
        &self,
        token: Option<&AccessToken>,
        job: NewJob,
    ) -> Result<JobRecord, BackendError>;

    async fn update_hiring_status(
        &self,
        token: Option<&AccessToken>,
        id: JobId,
        is_open: bool,
    ) -> Result<JobRecord, BackendError>;

    async fn delete_job(
        &self,
        token: Option<&AccessToken>,
        id: JobId,
    ) -> Result<JobRecord, BackendError>;

    /// Jobs posted by the caller.
    async fn list_recruiter_jobs(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<Vec<JobRecord>, BackendError>;

    async fn list_saved_jobs(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<Vec<SavedJob>, BackendError>;

    async fn save_job(
        &self,
        token: Option<&AccessToken>,
        job_id: JobId,
    ) -> Result<SavedJob, BackendError>;

    /// Removes the caller's bookmark, returning the deleted row if there was one.
    async fn unsave_job(
        &self,
        token: Option<&AccessToken>,
        job_id: JobId,
    ) -> Result<Option<SavedJob>, BackendError>;

    async fn list_applications(
        &self,
        token: Option<&AccessToken>,
        scope: &ApplicationScope,
    ) -> Result<Vec<ApplicationRecord>, BackendError>;

    async fn insert_application(
        &self,
        token: Option<&AccessToken>,
        application: NewApplication,
    ) -> Result<ApplicationRecord, BackendError>;

    async fn update_application_status(
        &self,
        token: Option<&AccessToken>,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, BackendError>;

    async fn list_companies(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<Vec<Company>, BackendError>;

    async fn insert_company(
        &self,
        token: Option<&AccessToken>,
        company: NewCompany,
    ) -> Result<Company, BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("no valid session token")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Rejected(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl From<BackendError> for ActionError {
    fn from(value: BackendError) -> Self {
        let kind = match &value {
            BackendError::Unauthenticated => ActionErrorKind::Unauthenticated,
            BackendError::Forbidden(_) => ActionErrorKind::Forbidden,
            BackendError::NotFound(_) => ActionErrorKind::NotFound,
            BackendError::Conflict(_) => ActionErrorKind::Conflict,
            BackendError::Rejected(_) => ActionErrorKind::Invalid,
            BackendError::Unavailable(_) => ActionErrorKind::Unavailable,
        };
        ActionError::new(kind, value.to_string())
    }
}

/// Binary payload headed for file storage.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadBlob {
    pub file_name: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

pub const RESUME_BUCKET: &str = "resumes";
pub const LOGO_BUCKET: &str = "company-logo";

/// Durable object storage returning public URLs.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    async fn upload(
        &self,
        token: Option<&AccessToken>,
        bucket: &str,
        object_name: &str,
        blob: &UploadBlob,
    ) -> Result<String, UploadError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("no valid session token for upload")]
    Unauthenticated,
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<UploadError> for ActionError {
    fn from(value: UploadError) -> Self {
        let kind = match &value {
            UploadError::Unauthenticated => ActionErrorKind::Unauthenticated,
            UploadError::Rejected(_) | UploadError::Unavailable(_) => ActionErrorKind::Upload,
        };
        ActionError::new(kind, value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient, auto-dismissed message for cross-cutting actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub dismiss_after_ms: u32,
}

impl Notification {
    pub const DEFAULT_DISMISS_MS: u32 = 3_000;

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            dismiss_after_ms: Self::DEFAULT_DISMISS_MS,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            dismiss_after_ms: Self::DEFAULT_DISMISS_MS,
        }
    }
}

/// Outbound hook for toast-style notifications.
pub trait NotificationPublisher: Send + Sync + 'static {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
