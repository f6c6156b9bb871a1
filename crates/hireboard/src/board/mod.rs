//! Job board: records, listing filters, backend ports, operations, and the HTTP router.

pub mod backend;
pub mod domain;
pub mod feed;
pub mod filter;
pub mod memory;
pub mod operations;
pub mod router;
pub mod seed;
pub mod service;
pub mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use backend::{
    BackendError, FileStore, JobBoardBackend, Notification, NotificationError, NotificationLevel,
    NotificationPublisher, UploadBlob, UploadError, LOGO_BUCKET, RESUME_BUCKET,
};
pub use domain::{
    ApplicationId, ApplicationRecord, ApplicationScope, ApplicationStatus, Company, CompanyId,
    CompanySummary, JobId, JobRecord, NewApplication, NewCompany, NewJob, SavedJob, SavedJobId,
};
pub use feed::ListingFeed;
pub use filter::{compose, FilterCriteria, FilterState, JobPredicate, JobQuery};
pub use memory::{InMemoryBoard, InMemoryFileStore, InMemoryNotifications};
pub use router::board_router;
pub use seed::{import_jobs, import_jobs_from_path, SeedError, SeedJob};
pub use service::{BoardService, POST_JOB_DENIED};
pub use validation::{ApplicationForm, CompanyForm, FileUpload, JobDraft, ValidationErrors};
pub use views::{ApplyButton, JobCardView, JobDetailView};
