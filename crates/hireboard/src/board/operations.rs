//! One [`BackendOperation`] per board call, each with typed parameters.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::backend::{
    FileStore, JobBoardBackend, Notification, NotificationPublisher, UploadBlob, LOGO_BUCKET,
    RESUME_BUCKET,
};
use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationScope, ApplicationStatus, Company, JobId,
    JobRecord, NewApplication, NewCompany, NewJob, SavedJob,
};
use super::filter::{compose, FilterCriteria};
use crate::request::{ActionError, BackendOperation};
use crate::session::{AccessToken, UserId};

/// Filtered job listing; criteria arrive on every trigger.
pub struct ListJobs<B> {
    backend: Arc<B>,
}

impl<B> ListJobs<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for ListJobs<B> {
    type Params = ();
    type Args = FilterCriteria;
    type Output = Vec<JobRecord>;

    fn name(&self) -> &'static str {
        "list_jobs"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        _params: &(),
        criteria: FilterCriteria,
    ) -> Result<Vec<JobRecord>, ActionError> {
        let query = compose(&criteria);
        Ok(self.backend.list_jobs(token.as_ref(), &query).await?)
    }
}

pub struct GetJob<B> {
    backend: Arc<B>,
}

impl<B> GetJob<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for GetJob<B> {
    type Params = JobId;
    type Args = ();
    type Output = JobRecord;

    fn name(&self) -> &'static str {
        "get_job"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        job_id: &JobId,
        _args: (),
    ) -> Result<JobRecord, ActionError> {
        Ok(self.backend.get_job(token.as_ref(), *job_id).await?)
    }
}

/// Posts a job and announces it; the announcement never fails the post.
pub struct CreateJob<B, N> {
    backend: Arc<B>,
    notifications: Arc<N>,
}

impl<B, N> CreateJob<B, N> {
    pub fn new(backend: Arc<B>, notifications: Arc<N>) -> Self {
        Self {
            backend,
            notifications,
        }
    }
}

#[async_trait]
impl<B: JobBoardBackend, N: NotificationPublisher> BackendOperation for CreateJob<B, N> {
    type Params = ();
    type Args = NewJob;
    type Output = JobRecord;

    fn name(&self) -> &'static str {
        "create_job"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        _params: &(),
        job: NewJob,
    ) -> Result<JobRecord, ActionError> {
        let created = self.backend.create_job(token.as_ref(), job).await?;
        info!(job_id = %created.id, title = %created.title, "job posted");
        if let Err(err) = self
            .notifications
            .publish(Notification::success("Job created successfully!!"))
        {
            warn!(%err, "job created but notification failed");
        }
        Ok(created)
    }
}

pub struct UpdateHiringStatus<B> {
    backend: Arc<B>,
}

impl<B> UpdateHiringStatus<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for UpdateHiringStatus<B> {
    type Params = JobId;
    type Args = bool;
    type Output = JobRecord;

    fn name(&self) -> &'static str {
        "update_hiring_status"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        job_id: &JobId,
        is_open: bool,
    ) -> Result<JobRecord, ActionError> {
        let job = self
            .backend
            .update_hiring_status(token.as_ref(), *job_id, is_open)
            .await?;
        info!(job_id = %job.id, is_open, "hiring status changed");
        Ok(job)
    }
}

pub struct DeleteJob<B> {
    backend: Arc<B>,
}

impl<B> DeleteJob<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for DeleteJob<B> {
    type Params = JobId;
    type Args = ();
    type Output = JobRecord;

    fn name(&self) -> &'static str {
        "delete_job"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        job_id: &JobId,
        _args: (),
    ) -> Result<JobRecord, ActionError> {
        let removed = self.backend.delete_job(token.as_ref(), *job_id).await?;
        info!(job_id = %removed.id, "job deleted");
        Ok(removed)
    }
}

pub struct ListMyJobs<B> {
    backend: Arc<B>,
}

impl<B> ListMyJobs<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for ListMyJobs<B> {
    type Params = ();
    type Args = ();
    type Output = Vec<JobRecord>;

    fn name(&self) -> &'static str {
        "list_my_jobs"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        _params: &(),
        _args: (),
    ) -> Result<Vec<JobRecord>, ActionError> {
        Ok(self.backend.list_recruiter_jobs(token.as_ref()).await?)
    }
}

pub struct ListSavedJobs<B> {
    backend: Arc<B>,
}

impl<B> ListSavedJobs<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for ListSavedJobs<B> {
    type Params = ();
    type Args = ();
    type Output = Vec<SavedJob>;

    fn name(&self) -> &'static str {
        "list_saved_jobs"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        _params: &(),
        _args: (),
    ) -> Result<Vec<SavedJob>, ActionError> {
        Ok(self.backend.list_saved_jobs(token.as_ref()).await?)
    }
}

/// Saved state known to the card when its binding was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedJobToggle {
    pub already_saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SavedJobOutcome {
    Saved { saved_job: SavedJob },
    Removed { job_id: JobId },
}

impl SavedJobOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SavedJobOutcome::Saved { .. })
    }
}

/// Adds or removes a bookmark depending on the bound [`SavedJobToggle`].
pub struct ToggleSavedJob<B> {
    backend: Arc<B>,
}

impl<B> ToggleSavedJob<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for ToggleSavedJob<B> {
    type Params = SavedJobToggle;
    type Args = JobId;
    type Output = SavedJobOutcome;

    fn name(&self) -> &'static str {
        "toggle_saved_job"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        toggle: &SavedJobToggle,
        job_id: JobId,
    ) -> Result<SavedJobOutcome, ActionError> {
        if toggle.already_saved {
            self.backend.unsave_job(token.as_ref(), job_id).await?;
            Ok(SavedJobOutcome::Removed { job_id })
        } else {
            let saved_job = self.backend.save_job(token.as_ref(), job_id).await?;
            Ok(SavedJobOutcome::Saved { saved_job })
        }
    }
}

pub struct ListApplications<B> {
    backend: Arc<B>,
}

impl<B> ListApplications<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for ListApplications<B> {
    type Params = ApplicationScope;
    type Args = ();
    type Output = Vec<ApplicationRecord>;

    fn name(&self) -> &'static str {
        "list_applications"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        scope: &ApplicationScope,
        _args: (),
    ) -> Result<Vec<ApplicationRecord>, ActionError> {
        Ok(self.backend.list_applications(token.as_ref(), scope).await?)
    }
}

/// Validated application ready for upload and insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationSubmission {
    pub job_id: JobId,
    pub candidate_id: UserId,
    pub name: String,
    pub experience: u32,
    pub why_hire: String,
    pub resume: UploadBlob,
}

/// Uploads the resume, then records the application as `applied`.
pub struct ApplyToJob<B, F> {
    backend: Arc<B>,
    files: Arc<F>,
}

impl<B, F> ApplyToJob<B, F> {
    pub fn new(backend: Arc<B>, files: Arc<F>) -> Self {
        Self { backend, files }
    }
}

#[async_trait]
impl<B: JobBoardBackend, F: FileStore> BackendOperation for ApplyToJob<B, F> {
    type Params = ();
    type Args = ApplicationSubmission;
    type Output = ApplicationRecord;

    fn name(&self) -> &'static str {
        "apply_to_job"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        _params: &(),
        submission: ApplicationSubmission,
    ) -> Result<ApplicationRecord, ActionError> {
        let object_name = format!(
            "resume-{}-{}",
            uuid::Uuid::new_v4().simple(),
            submission.candidate_id
        );
        let resume_url = self
            .files
            .upload(
                token.as_ref(),
                RESUME_BUCKET,
                &object_name,
                &submission.resume,
            )
            .await?;

        let application = self
            .backend
            .insert_application(
                token.as_ref(),
                NewApplication {
                    job_id: submission.job_id,
                    candidate_id: submission.candidate_id,
                    name: submission.name,
                    experience: submission.experience,
                    why_hire: submission.why_hire,
                    resume_url,
                    status: ApplicationStatus::Applied,
                },
            )
            .await?;
        info!(
            application_id = %application.id,
            job_id = %application.job_id,
            "application submitted"
        );
        Ok(application)
    }
}

pub struct UpdateApplicationStatus<B> {
    backend: Arc<B>,
}

impl<B> UpdateApplicationStatus<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for UpdateApplicationStatus<B> {
    type Params = ApplicationId;
    type Args = ApplicationStatus;
    type Output = ApplicationRecord;

    fn name(&self) -> &'static str {
        "update_application_status"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, ActionError> {
        let updated = self
            .backend
            .update_application_status(token.as_ref(), *application_id, status)
            .await?;
        info!(application_id = %updated.id, status = status.label(), "application status changed");
        Ok(updated)
    }
}

pub struct ListCompanies<B> {
    backend: Arc<B>,
}

impl<B> ListCompanies<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: JobBoardBackend> BackendOperation for ListCompanies<B> {
    type Params = ();
    type Args = ();
    type Output = Vec<Company>;

    fn name(&self) -> &'static str {
        "list_companies"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        _params: &(),
        _args: (),
    ) -> Result<Vec<Company>, ActionError> {
        Ok(self.backend.list_companies(token.as_ref()).await?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanySubmission {
    pub name: String,
    pub about: String,
    pub logo: UploadBlob,
}

/// Uploads the logo, then inserts the company row.
pub struct CreateCompany<B, F> {
    backend: Arc<B>,
    files: Arc<F>,
}

impl<B, F> CreateCompany<B, F> {
    pub fn new(backend: Arc<B>, files: Arc<F>) -> Self {
        Self { backend, files }
    }
}

#[async_trait]
impl<B: JobBoardBackend, F: FileStore> BackendOperation for CreateCompany<B, F> {
    type Params = ();
    type Args = CompanySubmission;
    type Output = Company;

    fn name(&self) -> &'static str {
        "create_company"
    }

    async fn execute(
        &self,
        token: Option<AccessToken>,
        _params: &(),
        submission: CompanySubmission,
    ) -> Result<Company, ActionError> {
        let object_name = format!(
            "logo-{}-{}",
            uuid::Uuid::new_v4().simple(),
            submission.name.replace(char::is_whitespace, "-")
        );
        let logo_url = self
            .files
            .upload(token.as_ref(), LOGO_BUCKET, &object_name, &submission.logo)
            .await?;

        let company = self
            .backend
            .insert_company(
                token.as_ref(),
                NewCompany {
                    name: submission.name,
                    about: submission.about,
                    logo_url,
                },
            )
            .await?;
        info!(company_id = %company.id, name = %company.name, "company added");
        Ok(company)
    }
}
