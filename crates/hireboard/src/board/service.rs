use std::sync::Arc;

use tracing::warn;

use super::backend::{FileStore, JobBoardBackend, Notification, NotificationPublisher};
use super::domain::{ApplicationId, ApplicationScope, JobId};
use super::feed::ListingFeed;
use super::filter::FilterState;
use super::operations::{
    ApplyToJob, CreateCompany, CreateJob, DeleteJob, GetJob, ListApplications, ListCompanies,
    ListJobs, ListMyJobs, ListSavedJobs, SavedJobToggle, ToggleSavedJob, UpdateApplicationStatus,
    UpdateHiringStatus,
};
use crate::request::{AsyncAction, BackendOperation, SettlementPolicy};
use crate::session::{
    require_recruiter, AccessToken, GuardRejection, IdentityDirectory, SessionContext,
    SessionUser,
};

pub const POST_JOB_DENIED: &str = "You are not allowed to post jobs";

/// Composes the board ports and hands out one request binding per call site.
pub struct BoardService<B, F, N> {
    backend: Arc<B>,
    files: Arc<F>,
    notifications: Arc<N>,
    directory: Arc<dyn IdentityDirectory>,
    settlement: SettlementPolicy,
}

impl<B, F, N> BoardService<B, F, N>
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    pub fn new(
        backend: Arc<B>,
        files: Arc<F>,
        notifications: Arc<N>,
        directory: Arc<dyn IdentityDirectory>,
    ) -> Self {
        Self {
            backend,
            files,
            notifications,
            directory,
            settlement: SettlementPolicy::default(),
        }
    }

    pub fn with_settlement(mut self, settlement: SettlementPolicy) -> Self {
        self.settlement = settlement;
        self
    }

    pub fn settlement(&self) -> SettlementPolicy {
        self.settlement
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn notifications(&self) -> &Arc<N> {
        &self.notifications
    }

    /// Session for a raw bearer token; no token yields an anonymous session.
    pub fn session(&self, token: Option<AccessToken>) -> SessionContext {
        match token {
            Some(token) => SessionContext::from_token(token, self.directory.as_ref()),
            None => SessionContext::anonymous(),
        }
    }

    /// Recruiter guard for the post-job page. Refusals also raise a notification.
    pub async fn guard_post_job(
        &self,
        session: &SessionContext,
    ) -> Result<SessionUser, GuardRejection> {
        let outcome = require_recruiter(session).await;
        if let Err(GuardRejection::NotRecruiter { .. }) = &outcome {
            if let Err(err) = self.notifications.publish(Notification::error(POST_JOB_DENIED)) {
                warn!(%err, "failed to publish post-job refusal");
            }
        }
        outcome
    }

    pub fn bind<O: BackendOperation>(
        &self,
        operation: O,
        params: O::Params,
        session: &SessionContext,
    ) -> AsyncAction<O> {
        AsyncAction::with_policy(
            operation,
            params,
            Arc::new(session.clone()),
            self.settlement,
        )
    }

    pub fn list_jobs(&self, session: &SessionContext) -> AsyncAction<ListJobs<B>> {
        self.bind(ListJobs::new(Arc::clone(&self.backend)), (), session)
    }

    /// Listing binding driven by `filters`; see [`ListingFeed`].
    pub fn listing_feed(&self, session: &SessionContext, filters: &FilterState) -> ListingFeed<B> {
        ListingFeed::spawn(self.list_jobs(session), filters)
    }

    pub fn get_job(&self, session: &SessionContext, job_id: JobId) -> AsyncAction<GetJob<B>> {
        self.bind(GetJob::new(Arc::clone(&self.backend)), job_id, session)
    }

    pub fn create_job(&self, session: &SessionContext) -> AsyncAction<CreateJob<B, N>> {
        self.bind(
            CreateJob::new(Arc::clone(&self.backend), Arc::clone(&self.notifications)),
            (),
            session,
        )
    }

    pub fn update_hiring_status(
        &self,
        session: &SessionContext,
        job_id: JobId,
    ) -> AsyncAction<UpdateHiringStatus<B>> {
        self.bind(
            UpdateHiringStatus::new(Arc::clone(&self.backend)),
            job_id,
            session,
        )
    }

    pub fn delete_job(&self, session: &SessionContext, job_id: JobId) -> AsyncAction<DeleteJob<B>> {
        self.bind(DeleteJob::new(Arc::clone(&self.backend)), job_id, session)
    }

    pub fn list_my_jobs(&self, session: &SessionContext) -> AsyncAction<ListMyJobs<B>> {
        self.bind(ListMyJobs::new(Arc::clone(&self.backend)), (), session)
    }

    pub fn list_saved_jobs(&self, session: &SessionContext) -> AsyncAction<ListSavedJobs<B>> {
        self.bind(ListSavedJobs::new(Arc::clone(&self.backend)), (), session)
    }

    pub fn toggle_saved_job(
        &self,
        session: &SessionContext,
        already_saved: bool,
    ) -> AsyncAction<ToggleSavedJob<B>> {
        self.bind(
            ToggleSavedJob::new(Arc::clone(&self.backend)),
            SavedJobToggle { already_saved },
            session,
        )
    }

    pub fn list_applications(
        &self,
        session: &SessionContext,
        scope: ApplicationScope,
    ) -> AsyncAction<ListApplications<B>> {
        self.bind(
            ListApplications::new(Arc::clone(&self.backend)),
            scope,
            session,
        )
    }

    pub fn apply_to_job(&self, session: &SessionContext) -> AsyncAction<ApplyToJob<B, F>> {
        self.bind(
            ApplyToJob::new(Arc::clone(&self.backend), Arc::clone(&self.files)),
            (),
            session,
        )
    }

    pub fn update_application_status(
        &self,
        session: &SessionContext,
        application_id: ApplicationId,
    ) -> AsyncAction<UpdateApplicationStatus<B>> {
        self.bind(
            UpdateApplicationStatus::new(Arc::clone(&self.backend)),
            application_id,
            session,
        )
    }

    pub fn list_companies(&self, session: &SessionContext) -> AsyncAction<ListCompanies<B>> {
        self.bind(ListCompanies::new(Arc::clone(&self.backend)), (), session)
    }

    pub fn create_company(&self, session: &SessionContext) -> AsyncAction<CreateCompany<B, F>> {
        self.bind(
            CreateCompany::new(Arc::clone(&self.backend), Arc::clone(&self.files)),
            (),
            session,
        )
    }
}
