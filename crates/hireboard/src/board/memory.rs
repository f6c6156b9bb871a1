//! In-process adapters for the board ports, used for local runs, demos, and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::backend::{
    BackendError, FileStore, JobBoardBackend, Notification, NotificationError,
    NotificationPublisher, UploadBlob, UploadError,
};
use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationScope, ApplicationStatus, Company, CompanyId,
    JobId, JobRecord, NewApplication, NewCompany, NewJob, SavedJob, SavedJobId,
};
use super::filter::JobQuery;
use crate::session::{AccessToken, IdentityDirectory, SessionUser, UserId};

#[derive(Default)]
struct Tables {
    jobs: BTreeMap<JobId, JobRecord>,
    companies: BTreeMap<CompanyId, Company>,
    applications: BTreeMap<ApplicationId, ApplicationRecord>,
    saved_jobs: BTreeMap<SavedJobId, SavedJob>,
    next_job: u64,
    next_company: u64,
    next_application: u64,
    next_saved: u64,
}

impl Tables {
    fn next_job_id(&mut self) -> JobId {
        self.next_job += 1;
        JobId(self.next_job)
    }

    fn next_company_id(&mut self) -> CompanyId {
        self.next_company += 1;
        CompanyId(self.next_company)
    }

    fn next_application_id(&mut self) -> ApplicationId {
        self.next_application += 1;
        ApplicationId(self.next_application)
    }

    fn next_saved_id(&mut self) -> SavedJobId {
        self.next_saved += 1;
        SavedJobId(self.next_saved)
    }

    /// Job row with its company and applications embedded.
    fn hydrate(&self, job: &JobRecord) -> JobRecord {
        let mut hydrated = job.clone();
        hydrated.company = self
            .companies
            .get(&job.company_id)
            .map(Company::summary);
        hydrated.applications = self
            .applications
            .values()
            .filter(|application| application.job_id == job.id)
            .cloned()
            .collect();
        hydrated
    }

    fn job(&self, id: JobId) -> Result<&JobRecord, BackendError> {
        self.jobs.get(&id).ok_or(BackendError::NotFound("job"))
    }

    fn owned_job(&self, id: JobId, user: &UserId) -> Result<&JobRecord, BackendError> {
        let job = self.job(id)?;
        if job.is_owned_by(user) {
            Ok(job)
        } else {
            Err(BackendError::Forbidden(
                "only the posting recruiter can manage this job".to_string(),
            ))
        }
    }
}

/// Board tables plus a token directory, guarded by one mutex.
#[derive(Default, Clone)]
pub struct InMemoryBoard {
    tables: Arc<Mutex<Tables>>,
    identities: Arc<RwLock<HashMap<AccessToken, SessionUser>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_user(&self, token: AccessToken, user: SessionUser) {
        self.identities
            .write()
            .expect("identity lock poisoned")
            .insert(token, user);
    }

    /// Makes every backend call fail with `Unavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    pub fn seed_company(&self, name: &str, about: &str, logo_url: &str) -> Company {
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        let existing = tables
            .companies
            .values()
            .find(|company| company.name.eq_ignore_ascii_case(name))
            .cloned();
        if let Some(company) = existing {
            return company;
        }
        let id = tables.next_company_id();
        let company = Company {
            id,
            name: name.to_string(),
            about: about.to_string(),
            logo_url: logo_url.to_string(),
        };
        tables.companies.insert(id, company.clone());
        company
    }

    /// Inserts a posting directly, bypassing role checks.
    pub fn seed_job(
        &self,
        job: NewJob,
        recruiter: UserId,
        created_at: DateTime<Utc>,
    ) -> JobRecord {
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        let id = tables.next_job_id();
        let record = job_record(id, job, recruiter, created_at);
        tables.jobs.insert(id, record);
        let stored = &tables.jobs[&id];
        tables.hydrate(stored)
    }

    pub fn job_count(&self) -> usize {
        self.tables.lock().expect("board mutex poisoned").jobs.len()
    }

    fn caller(&self, token: Option<&AccessToken>) -> Result<SessionUser, BackendError> {
        if self.offline.load(Ordering::Acquire) {
            return Err(BackendError::Unavailable("board store offline".to_string()));
        }
        token
            .and_then(|token| self.resolve(token))
            .ok_or(BackendError::Unauthenticated)
    }
}

impl IdentityDirectory for InMemoryBoard {
    fn resolve(&self, token: &AccessToken) -> Option<SessionUser> {
        self.identities
            .read()
            .expect("identity lock poisoned")
            .get(token)
            .cloned()
    }
}

fn job_record(id: JobId, job: NewJob, recruiter: UserId, created_at: DateTime<Utc>) -> JobRecord {
    JobRecord {
        id,
        title: job.title,
        description: job.description,
        location: job.location,
        salary: job.salary,
        is_remote: job.is_remote,
        is_part_time: job.is_part_time,
        is_open: true,
        recruiter_id: recruiter,
        company_id: job.company_id,
        requirements: job.requirements,
        skills: job.skills,
        minimum_experience: job.minimum_experience,
        openings: job.openings,
        created_at,
        company: None,
        applications: Vec::new(),
    }
}

#[async_trait]
impl JobBoardBackend for InMemoryBoard {
    async fn list_jobs(
        &self,
        token: Option<&AccessToken>,
        query: &JobQuery,
    ) -> Result<Vec<JobRecord>, BackendError> {
        self.caller(token)?;
        let tables = self.tables.lock().expect("board mutex poisoned");
        let jobs: Vec<JobRecord> = tables
            .jobs
            .values()
            .filter(|job| query.matches(job))
            .map(|job| tables.hydrate(job))
            .collect();
        debug!(predicates = query.len(), matched = jobs.len(), "listed jobs");
        Ok(jobs)
    }

    async fn get_job(
        &self,
        token: Option<&AccessToken>,
        id: JobId,
    ) -> Result<JobRecord, BackendError> {
        self.caller(token)?;
        let tables = self.tables.lock().expect("board mutex poisoned");
        let job = tables.job(id)?;
        Ok(tables.hydrate(job))
    }

    async fn create_job(
        &self,
        token: Option<&AccessToken>,
        job: NewJob,
    ) -> Result<JobRecord, BackendError> {
        let user = self.caller(token)?;
        if !user.is_recruiter() {
            return Err(BackendError::Forbidden(
                "only recruiters can post jobs".to_string(),
            ));
        }
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        if !tables.companies.contains_key(&job.company_id) {
            return Err(BackendError::Rejected(format!(
                "company {} does not exist",
                job.company_id
            )));
        }
        let id = tables.next_job_id();
        let record = job_record(id, job, user.id, Utc::now());
        tables.jobs.insert(id, record);
        let stored = &tables.jobs[&id];
        Ok(tables.hydrate(stored))
    }

    async fn update_hiring_status(
        &self,
        token: Option<&AccessToken>,
        id: JobId,
        is_open: bool,
    ) -> Result<JobRecord, BackendError> {
        let user = self.caller(token)?;
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        tables.owned_job(id, &user.id)?;
        if let Some(job) = tables.jobs.get_mut(&id) {
            job.is_open = is_open;
        }
        let job = tables.job(id)?;
        Ok(tables.hydrate(job))
    }

    async fn delete_job(
        &self,
        token: Option<&AccessToken>,
        id: JobId,
    ) -> Result<JobRecord, BackendError> {
        let user = self.caller(token)?;
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        let removed = tables.hydrate(tables.owned_job(id, &user.id)?);
        tables.jobs.remove(&id);
        tables.saved_jobs.retain(|_, saved| saved.job_id != id);
        tables
            .applications
            .retain(|_, application| application.job_id != id);
        Ok(removed)
    }

    async fn list_recruiter_jobs(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<Vec<JobRecord>, BackendError> {
        let user = self.caller(token)?;
        let tables = self.tables.lock().expect("board mutex poisoned");
        Ok(tables
            .jobs
            .values()
            .filter(|job| job.is_owned_by(&user.id))
            .map(|job| tables.hydrate(job))
            .collect())
    }

    async fn list_saved_jobs(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<Vec<SavedJob>, BackendError> {
        let user = self.caller(token)?;
        let tables = self.tables.lock().expect("board mutex poisoned");
        Ok(tables
            .saved_jobs
            .values()
            .filter(|saved| saved.user_id == user.id)
            .map(|saved| SavedJob {
                job: tables.jobs.get(&saved.job_id).map(|job| tables.hydrate(job)),
                ..saved.clone()
            })
            .collect())
    }

    async fn save_job(
        &self,
        token: Option<&AccessToken>,
        job_id: JobId,
    ) -> Result<SavedJob, BackendError> {
        let user = self.caller(token)?;
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        tables.job(job_id)?;
        let duplicate = tables
            .saved_jobs
            .values()
            .any(|saved| saved.user_id == user.id && saved.job_id == job_id);
        if duplicate {
            return Err(BackendError::Conflict("job already saved".to_string()));
        }
        let id = tables.next_saved_id();
        let saved = SavedJob {
            id,
            user_id: user.id,
            job_id,
            job: None,
        };
        tables.saved_jobs.insert(id, saved.clone());
        Ok(saved)
    }

    async fn unsave_job(
        &self,
        token: Option<&AccessToken>,
        job_id: JobId,
    ) -> Result<Option<SavedJob>, BackendError> {
        let user = self.caller(token)?;
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        let key = tables
            .saved_jobs
            .iter()
            .find(|(_, saved)| saved.user_id == user.id && saved.job_id == job_id)
            .map(|(id, _)| *id);
        Ok(key.and_then(|id| tables.saved_jobs.remove(&id)))
    }

    async fn list_applications(
        &self,
        token: Option<&AccessToken>,
        scope: &ApplicationScope,
    ) -> Result<Vec<ApplicationRecord>, BackendError> {
        let user = self.caller(token)?;
        let tables = self.tables.lock().expect("board mutex poisoned");
        match scope {
            ApplicationScope::Candidate(candidate) => {
                if candidate != &user.id {
                    return Err(BackendError::Forbidden(
                        "applications belong to another candidate".to_string(),
                    ));
                }
                Ok(tables
                    .applications
                    .values()
                    .filter(|application| &application.candidate_id == candidate)
                    .cloned()
                    .collect())
            }
            ApplicationScope::Job(job_id) => {
                tables.owned_job(*job_id, &user.id)?;
                Ok(tables
                    .applications
                    .values()
                    .filter(|application| application.job_id == *job_id)
                    .cloned()
                    .collect())
            }
        }
    }

    async fn insert_application(
        &self,
        token: Option<&AccessToken>,
        application: NewApplication,
    ) -> Result<ApplicationRecord, BackendError> {
        let user = self.caller(token)?;
        if application.candidate_id != user.id {
            return Err(BackendError::Forbidden(
                "cannot apply on behalf of another candidate".to_string(),
            ));
        }
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        let job = tables.job(application.job_id)?;
        if !job.is_open {
            return Err(BackendError::Forbidden("hiring is closed".to_string()));
        }
        if job.is_owned_by(&user.id) {
            return Err(BackendError::Forbidden(
                "recruiters cannot apply to their own jobs".to_string(),
            ));
        }
        let duplicate = tables.applications.values().any(|existing| {
            existing.job_id == application.job_id && existing.candidate_id == user.id
        });
        if duplicate {
            return Err(BackendError::Conflict(
                "already applied to this job".to_string(),
            ));
        }
        let id = tables.next_application_id();
        let record = ApplicationRecord {
            id,
            job_id: application.job_id,
            candidate_id: application.candidate_id,
            name: application.name,
            experience: application.experience,
            why_hire: application.why_hire,
            resume_url: application.resume_url,
            status: application.status,
            created_at: Utc::now(),
        };
        tables.applications.insert(id, record.clone());
        Ok(record)
    }

    async fn update_application_status(
        &self,
        token: Option<&AccessToken>,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, BackendError> {
        let user = self.caller(token)?;
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        let job_id = tables
            .applications
            .get(&id)
            .map(|application| application.job_id)
            .ok_or(BackendError::NotFound("application"))?;
        tables.owned_job(job_id, &user.id)?;
        let application = tables
            .applications
            .get_mut(&id)
            .ok_or(BackendError::NotFound("application"))?;
        application.status = status;
        Ok(application.clone())
    }

    async fn list_companies(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<Vec<Company>, BackendError> {
        self.caller(token)?;
        let tables = self.tables.lock().expect("board mutex poisoned");
        Ok(tables.companies.values().cloned().collect())
    }

    async fn insert_company(
        &self,
        token: Option<&AccessToken>,
        company: NewCompany,
    ) -> Result<Company, BackendError> {
        self.caller(token)?;
        let mut tables = self.tables.lock().expect("board mutex poisoned");
        let duplicate = tables
            .companies
            .values()
            .any(|existing| existing.name.eq_ignore_ascii_case(&company.name));
        if duplicate {
            return Err(BackendError::Conflict(format!(
                "company '{}' already exists",
                company.name
            )));
        }
        let id = tables.next_company_id();
        let stored = Company {
            id,
            name: company.name,
            about: company.about,
            logo_url: company.logo_url,
        };
        tables.companies.insert(id, stored.clone());
        Ok(stored)
    }
}

/// Keeps uploaded objects in memory and hands out URLs under `public_base`.
#[derive(Clone)]
pub struct InMemoryFileStore {
    public_base: String,
    objects: Arc<Mutex<BTreeMap<String, UploadBlob>>>,
    directory: Arc<dyn IdentityDirectory>,
}

impl InMemoryFileStore {
    pub fn new(public_base: impl Into<String>, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self {
            public_base: public_base.into().trim_end_matches('/').to_string(),
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            directory,
        }
    }

    pub fn object(&self, bucket: &str, object_name: &str) -> Option<UploadBlob> {
        self.objects
            .lock()
            .expect("file store mutex poisoned")
            .get(&format!("{bucket}/{object_name}"))
            .cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("file store mutex poisoned").len()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn upload(
        &self,
        token: Option<&AccessToken>,
        bucket: &str,
        object_name: &str,
        blob: &UploadBlob,
    ) -> Result<String, UploadError> {
        if token.and_then(|token| self.directory.resolve(token)).is_none() {
            return Err(UploadError::Unauthenticated);
        }
        if blob.bytes.is_empty() {
            return Err(UploadError::Rejected(format!(
                "'{}' is empty",
                blob.file_name
            )));
        }
        let key = format!("{bucket}/{object_name}");
        self.objects
            .lock()
            .expect("file store mutex poisoned")
            .insert(key.clone(), blob.clone());
        debug!(%key, bytes = blob.bytes.len(), "stored upload");
        Ok(format!("{}/object/public/{key}", self.public_base))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotifications {
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for InMemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}
