//! Form checks that run before any request binding is triggered.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::backend::UploadBlob;
use super::domain::{CompanyId, JobId, NewJob};
use super::operations::{ApplicationSubmission, CompanySubmission};
use crate::session::SessionUser;

/// Per-field messages, rendered inline next to each offending input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<&'static str, String> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields.keys().copied().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A file as received from a form, before its type is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Declared content type, falling back to a guess from the file extension.
    pub fn resolved_type(&self) -> Option<mime::Mime> {
        self.content_type
            .as_deref()
            .and_then(|raw| raw.trim().parse::<mime::Mime>().ok())
            .or_else(|| mime_guess::from_path(&self.file_name).first())
    }

    fn into_blob(self, allowed: &[&str]) -> Option<UploadBlob> {
        if self.bytes.is_empty() {
            return None;
        }
        let content_type = self.resolved_type()?;
        if !allowed.contains(&content_type.essence_str()) {
            return None;
        }
        Some(UploadBlob {
            file_name: self.file_name,
            content_type,
            bytes: self.bytes,
        })
    }
}

const RESUME_TYPES: &[&str] = &["application/pdf", "application/msword"];
const LOGO_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// Raw "post a job" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub company_id: String,
    pub requirements: String,
    pub salary: Option<i64>,
    pub minimum_experience: Option<i64>,
    pub openings: Option<i64>,
    pub skills: String,
    pub is_remote: Option<bool>,
    pub is_part_time: Option<bool>,
}

impl JobDraft {
    pub fn validate(self) -> Result<NewJob, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        required(&mut errors, "title", &self.title, "Title is required");
        required(
            &mut errors,
            "description",
            &self.description,
            "Description is required",
        );
        required(&mut errors, "location", &self.location, "Select a location");
        required(
            &mut errors,
            "requirements",
            &self.requirements,
            "Requirements are required",
        );

        let company_id = self.company_id.trim().parse::<u64>().ok().map(CompanyId);
        if company_id.is_none() {
            errors.add("company_id", "Select or Add a new Company");
        }

        let salary = non_negative(
            &mut errors,
            "salary",
            self.salary,
            "Salary is required",
            "Salary cannot be negative",
        );
        let minimum_experience = non_negative(
            &mut errors,
            "minimum_experience",
            self.minimum_experience,
            "Experience is required",
            "Experience cannot be negative",
        );
        let openings = non_negative(
            &mut errors,
            "openings",
            self.openings,
            "Number of openings is required",
            "Openings cannot be negative",
        );

        if self.is_remote.is_none() {
            errors.add("is_remote", "Field is required");
        }
        if self.is_part_time.is_none() {
            errors.add("is_part_time", "Field is required");
        }

        errors.into_result(|| NewJob {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            company_id: company_id.unwrap_or(CompanyId(0)),
            requirements: self.requirements.trim().to_string(),
            salary: salary.unwrap_or_default(),
            minimum_experience: minimum_experience.unwrap_or_default(),
            openings: openings.unwrap_or_default(),
            skills: self.skills.trim().to_string(),
            is_remote: self.is_remote.unwrap_or_default(),
            is_part_time: self.is_part_time.unwrap_or_default(),
        })
    }
}

/// Raw "apply for this job" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationForm {
    pub experience: Option<i64>,
    pub why_hire: String,
    pub resume: Option<FileUpload>,
}

impl ApplicationForm {
    pub fn validate(
        self,
        job_id: JobId,
        candidate: &SessionUser,
    ) -> Result<ApplicationSubmission, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let experience = non_negative(
            &mut errors,
            "experience",
            self.experience,
            "Experience must be at least 0",
            "Experience must be at least 0",
        );
        required(
            &mut errors,
            "why_hire",
            &self.why_hire,
            "Why should you be hired for this role?",
        );
        let resume = self.resume.and_then(|file| file.into_blob(RESUME_TYPES));
        if resume.is_none() {
            errors.add("resume", "Only PDF or Word documents are allowed");
        }

        match (errors.is_empty(), resume) {
            (true, Some(resume)) => Ok(ApplicationSubmission {
                job_id,
                candidate_id: candidate.id.clone(),
                name: candidate.full_name.clone(),
                experience: experience.unwrap_or_default(),
                why_hire: self.why_hire.trim().to_string(),
                resume,
            }),
            _ => Err(errors),
        }
    }
}

/// Raw "add company" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyForm {
    pub name: String,
    pub about: String,
    pub logo: Option<FileUpload>,
}

impl CompanyForm {
    pub fn validate(self) -> Result<CompanySubmission, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        required(&mut errors, "name", &self.name, "Company name is required");
        required(&mut errors, "about", &self.about, "About is required");
        let logo = self.logo.and_then(|file| file.into_blob(LOGO_TYPES));
        if logo.is_none() {
            errors.add("logo", "Only images are allowed");
        }

        match (errors.is_empty(), logo) {
            (true, Some(logo)) => Ok(CompanySubmission {
                name: self.name.trim().to_string(),
                about: self.about.trim().to_string(),
                logo,
            }),
            _ => Err(errors),
        }
    }
}

fn required(errors: &mut ValidationErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn non_negative(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<i64>,
    missing: &str,
    negative: &str,
) -> Option<u32> {
    match value {
        None => {
            errors.add(field, missing);
            None
        }
        Some(number) if number < 0 => {
            errors.add(field, negative);
            None
        }
        Some(number) => match u32::try_from(number) {
            Ok(number) => Some(number),
            Err(_) => {
                errors.add(field, format!("{field} is too large"));
                None
            }
        },
    }
}
