//! CSV import of job postings for local boards and demos.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{JobRecord, NewJob};
use super::memory::InMemoryBoard;
use crate::session::UserId;

/// One posting parsed from a seed file; the company is referenced by name.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedJob {
    pub company: String,
    pub recruiter_id: UserId,
    pub created_at: Option<DateTime<Utc>>,
    pub title: String,
    pub description: String,
    pub location: String,
    pub requirements: String,
    pub skills: String,
    pub salary: u32,
    pub minimum_experience: u32,
    pub openings: u32,
    pub is_remote: bool,
    pub is_part_time: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed seed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

pub fn import_jobs<R: Read>(reader: R) -> Result<Vec<SeedJob>, SeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut jobs = Vec::new();

    for (index, record) in csv_reader.deserialize::<SeedRow>().enumerate() {
        let row = record?;
        jobs.push(row.into_seed(index + 1)?);
    }

    Ok(jobs)
}

pub fn import_jobs_from_path(path: impl AsRef<Path>) -> Result<Vec<SeedJob>, SeedError> {
    let file = File::open(path)?;
    import_jobs(file)
}

impl InMemoryBoard {
    /// Creates missing companies by name and inserts every posting.
    pub fn load_seed(&self, jobs: Vec<SeedJob>) -> Vec<JobRecord> {
        jobs.into_iter()
            .map(|seed| {
                let company = self.seed_company(&seed.company, "", "");
                let created_at = seed.created_at.unwrap_or_else(Utc::now);
                self.seed_job(
                    NewJob {
                        title: seed.title,
                        description: seed.description,
                        location: seed.location,
                        company_id: company.id,
                        requirements: seed.requirements,
                        salary: seed.salary,
                        minimum_experience: seed.minimum_experience,
                        openings: seed.openings,
                        skills: seed.skills,
                        is_remote: seed.is_remote,
                        is_part_time: seed.is_part_time,
                    },
                    seed.recruiter_id,
                    created_at,
                )
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SeedRow {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    salary: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    remote: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    part_time: Option<String>,
    company: String,
    recruiter_id: String,
    #[serde(default)]
    requirements: String,
    #[serde(default)]
    skills: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    minimum_experience: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    openings: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

impl SeedRow {
    fn into_seed(self, row: usize) -> Result<SeedJob, SeedError> {
        let invalid = |message: String| SeedError::InvalidRow { row, message };

        if self.title.is_empty() {
            return Err(invalid("title is empty".to_string()));
        }
        if self.company.is_empty() {
            return Err(invalid("company is empty".to_string()));
        }

        let number = |field: &str, value: Option<&str>| -> Result<u32, SeedError> {
            value
                .map(|raw| {
                    raw.parse::<u32>()
                        .map_err(|_| invalid(format!("{field} '{raw}' is not a whole number")))
                })
                .transpose()
                .map(Option::unwrap_or_default)
        };
        let flag = |field: &str, value: Option<&str>| -> Result<bool, SeedError> {
            value
                .map(|raw| {
                    parse_flag(raw).ok_or_else(|| invalid(format!("{field} '{raw}' is not a flag")))
                })
                .transpose()
                .map(Option::unwrap_or_default)
        };

        let created_at = match self.created_at.as_deref() {
            Some(raw) => Some(
                parse_timestamp(raw)
                    .ok_or_else(|| invalid(format!("created_at '{raw}' is not a date")))?,
            ),
            None => None,
        };

        Ok(SeedJob {
            salary: number("salary", self.salary.as_deref())?,
            minimum_experience: number("minimum_experience", self.minimum_experience.as_deref())?,
            openings: number("openings", self.openings.as_deref())?,
            is_remote: flag("remote", self.remote.as_deref())?,
            is_part_time: flag("part_time", self.part_time.as_deref())?,
            company: self.company,
            recruiter_id: UserId(self.recruiter_id),
            created_at,
            title: self.title,
            description: self.description,
            location: self.location,
            requirements: self.requirements,
            skills: self.skills,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
