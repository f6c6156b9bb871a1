use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedJobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Company fields embedded in job rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub name: String,
    pub logo_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub about: String,
    pub logo_url: String,
}

impl Company {
    pub fn summary(&self) -> CompanySummary {
        CompanySummary {
            name: self.name.clone(),
            logo_url: self.logo_url.clone(),
        }
    }
}

/// A posted job together with the related rows the listing pages read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub salary: u32,
    pub is_remote: bool,
    pub is_part_time: bool,
    pub is_open: bool,
    pub recruiter_id: UserId,
    pub company_id: CompanyId,
    pub requirements: String,
    pub skills: String,
    pub minimum_experience: u32,
    pub openings: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub company: Option<CompanySummary>,
    #[serde(default)]
    pub applications: Vec<ApplicationRecord>,
}

impl JobRecord {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.recruiter_id == user
    }

    pub fn application_from(&self, candidate: &UserId) -> Option<&ApplicationRecord> {
        self.applications
            .iter()
            .find(|application| &application.candidate_id == candidate)
    }
}

/// Validated fields for a new posting; the owner and open flag are set by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub company_id: CompanyId,
    pub requirements: String,
    pub salary: u32,
    pub minimum_experience: u32,
    pub openings: u32,
    pub skills: String,
    pub is_remote: bool,
    pub is_part_time: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Interviewing,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: UserId,
    pub name: String,
    pub experience: u32,
    pub why_hire: String,
    pub resume_url: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// Row written by the store once the resume is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub job_id: JobId,
    pub candidate_id: UserId,
    pub name: String,
    pub experience: u32,
    pub why_hire: String,
    pub resume_url: String,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub about: String,
    pub logo_url: String,
}

/// A bookmark linking a user to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedJob {
    pub id: SavedJobId,
    pub user_id: UserId,
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobRecord>,
}

/// Which applications to list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationScope {
    Candidate(UserId),
    Job(JobId),
}
