use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicationRecord, CompanyId, JobId, JobRecord, SavedJob};
use crate::session::UserId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobCardView {
    pub id: JobId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    pub company_id: CompanyId,
    pub location_label: String,
    pub salary: u32,
    pub posted: String,
    pub is_part_time: bool,
    pub is_open: bool,
    pub teaser: String,
    pub saved: bool,
}

impl JobCardView {
    pub fn from_job(job: &JobRecord, saved: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            company_name: job.company.as_ref().map(|company| company.name.clone()),
            company_logo: job.company.as_ref().map(|company| company.logo_url.clone()),
            company_id: job.company_id,
            location_label: location_label(job),
            salary: job.salary,
            posted: posted_ago(job.created_at, now),
            is_part_time: job.is_part_time,
            is_open: job.is_open,
            teaser: teaser(&job.description),
            saved,
        }
    }

    /// Cards for a listing, marking the ones the viewer has bookmarked.
    pub fn listing(jobs: &[JobRecord], saved: &[SavedJob], now: DateTime<Utc>) -> Vec<Self> {
        jobs.iter()
            .map(|job| {
                let is_saved = saved.iter().any(|entry| entry.job_id == job.id);
                Self::from_job(job, is_saved, now)
            })
            .collect()
    }

    /// Cards for the saved-jobs page; bookmarks whose job vanished are skipped.
    pub fn saved(saved: &[SavedJob], now: DateTime<Utc>) -> Vec<Self> {
        saved
            .iter()
            .filter_map(|entry| entry.job.as_ref())
            .map(|job| Self::from_job(job, true, now))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyButton {
    Apply,
    Applied,
    HiringClosed,
}

impl ApplyButton {
    pub const fn label(self) -> &'static str {
        match self {
            ApplyButton::Apply => "Apply",
            ApplyButton::Applied => "Applied",
            ApplyButton::HiringClosed => "Hiring Closed",
        }
    }

    pub const fn enabled(self) -> bool {
        matches!(self, ApplyButton::Apply)
    }
}

/// Job page as seen by one viewer: owners manage, everyone else may apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetailView {
    #[serde(flatten)]
    pub card: JobCardView,
    pub description: String,
    pub requirements: String,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_line: Option<String>,
    pub status_label: &'static str,
    pub application_count: usize,
    pub is_owner: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_button: Option<ApplyButton>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<ApplicationRecord>,
}

impl JobDetailView {
    pub fn for_viewer(job: &JobRecord, viewer: &UserId, now: DateTime<Utc>) -> Self {
        let is_owner = job.is_owned_by(viewer);
        let apply_button = (!is_owner).then(|| {
            if !job.is_open {
                ApplyButton::HiringClosed
            } else if job.application_from(viewer).is_some() {
                ApplyButton::Applied
            } else {
                ApplyButton::Apply
            }
        });

        Self {
            card: JobCardView::from_job(job, false, now),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            skills: extract_skills(&job.skills),
            experience_line: (job.minimum_experience > 0).then(|| {
                format!(
                    "Minimum {}+ Years of experience needed for this role",
                    job.minimum_experience
                )
            }),
            status_label: if job.is_open { "Open" } else { "Closed" },
            application_count: job.applications.len(),
            is_owner,
            apply_button,
            applications: if is_owner {
                job.applications.clone()
            } else {
                Vec::new()
            },
        }
    }
}

pub fn location_label(job: &JobRecord) -> String {
    if job.is_remote {
        "Work From Home".to_string()
    } else {
        job.location.clone()
    }
}

/// Comma separated skills, trimmed, empties dropped.
pub fn extract_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

/// First sentence of the description, or all of it when there is no period.
pub fn teaser(description: &str) -> String {
    match description.find('.') {
        Some(end) => description[..=end].trim().to_string(),
        None => description.trim().to_string(),
    }
}

/// Coarse relative age: the largest whole unit among days, hours, minutes, seconds.
pub fn posted_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let (amount, unit) = if days > 0 {
        (days, "day")
    } else if hours > 0 {
        (hours, "hour")
    } else if minutes > 0 {
        (minutes, "minute")
    } else {
        (seconds, "second")
    };

    let plural = if amount > 1 { "s" } else { "" };
    format!("{amount} {unit}{plural} ago")
}
