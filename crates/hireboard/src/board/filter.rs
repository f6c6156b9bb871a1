//! Listing filters: sparse criteria in, an AND-only predicate query out.

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::watch;

use super::domain::{CompanyId, JobRecord};

/// User-selected narrowing of the job listing. Every field has an "unset" value
/// (empty string, `None`, `0`, `false`) that imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    #[serde(deserialize_with = "loose_text")]
    pub search_query: String,
    #[serde(deserialize_with = "loose_text")]
    pub location: String,
    #[serde(deserialize_with = "optional_company")]
    pub company_id: Option<CompanyId>,
    #[serde(deserialize_with = "salary_floor")]
    pub min_salary: u32,
    #[serde(deserialize_with = "checkbox")]
    pub is_remote: bool,
    #[serde(deserialize_with = "checkbox")]
    pub is_part_time: bool,
}

impl FilterCriteria {
    /// True when at least one criterion is set; drives the "clear filters" control.
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }

    pub fn active_count(&self) -> usize {
        compose(self).len()
    }
}

/// One constraint on a job row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum JobPredicate {
    /// Case-insensitive substring match on the title.
    TitleContains(String),
    LocationEquals(String),
    CompanyEquals(CompanyId),
    SalaryAtLeast(u32),
    RemoteEquals(bool),
    PartTimeEquals(bool),
}

impl JobPredicate {
    pub fn matches(&self, job: &JobRecord) -> bool {
        match self {
            JobPredicate::TitleContains(needle) => job
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            JobPredicate::LocationEquals(location) => &job.location == location,
            JobPredicate::CompanyEquals(company) => job.company_id == *company,
            JobPredicate::SalaryAtLeast(floor) => job.salary >= *floor,
            JobPredicate::RemoteEquals(flag) => job.is_remote == *flag,
            JobPredicate::PartTimeEquals(flag) => job.is_part_time == *flag,
        }
    }
}

/// Conjunction of predicates over the full job table. Equality ignores the order in
/// which predicates were attached.
#[derive(Debug, Clone, Default, Eq, Serialize)]
pub struct JobQuery {
    predicates: Vec<JobPredicate>,
}

impl JobQuery {
    /// The unfiltered base query.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: JobPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[JobPredicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, job: &JobRecord) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(job))
    }

    pub fn apply<'a, I>(&self, jobs: I) -> Vec<JobRecord>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        jobs.into_iter()
            .filter(|job| self.matches(job))
            .cloned()
            .collect()
    }

    fn canonical(&self) -> Vec<&JobPredicate> {
        let mut sorted: Vec<&JobPredicate> = self.predicates.iter().collect();
        sorted.sort();
        sorted.dedup();
        sorted
    }
}

impl PartialEq for JobQuery {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

/// Narrows the base query with one predicate per set criterion.
pub fn compose(criteria: &FilterCriteria) -> JobQuery {
    let mut query = JobQuery::all();

    if !criteria.search_query.is_empty() {
        query = query.filter(JobPredicate::TitleContains(criteria.search_query.clone()));
    }
    if !criteria.location.is_empty() {
        query = query.filter(JobPredicate::LocationEquals(criteria.location.clone()));
    }
    if let Some(company) = criteria.company_id {
        query = query.filter(JobPredicate::CompanyEquals(company));
    }
    if criteria.min_salary > 0 {
        query = query.filter(JobPredicate::SalaryAtLeast(criteria.min_salary));
    }
    if criteria.is_remote {
        query = query.filter(JobPredicate::RemoteEquals(true));
    }
    if criteria.is_part_time {
        query = query.filter(JobPredicate::PartTimeEquals(true));
    }

    query
}

/// Owner of the listing page's criteria. Every mutation is a single published
/// transition, so observers never see a half-applied edit.
#[derive(Debug)]
pub struct FilterState {
    criteria: watch::Sender<FilterCriteria>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(FilterCriteria::default())
    }
}

impl FilterState {
    pub fn new(initial: FilterCriteria) -> Self {
        let (criteria, _) = watch::channel(initial);
        Self { criteria }
    }

    pub fn current(&self) -> FilterCriteria {
        self.criteria.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterCriteria> {
        self.criteria.subscribe()
    }

    /// Applies a batch of edits as one transition. Observers are only notified when
    /// the criteria actually changed.
    pub fn update<F>(&self, edit: F)
    where
        F: FnOnce(&mut FilterCriteria),
    {
        self.criteria.send_if_modified(|criteria| {
            let before = criteria.clone();
            edit(criteria);
            *criteria != before
        });
    }

    /// Submitting an empty search box keeps the previous query.
    pub fn submit_search(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.update(|criteria| criteria.search_query = query.to_string());
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update(|criteria| criteria.search_query = query.trim().to_string());
    }

    pub fn set_location(&self, location: impl Into<String>) {
        let location = location.into();
        self.update(|criteria| criteria.location = location.trim().to_string());
    }

    pub fn set_company(&self, company: Option<CompanyId>) {
        self.update(|criteria| criteria.company_id = company);
    }

    pub fn set_min_salary(&self, floor: u32) {
        self.update(|criteria| criteria.min_salary = floor);
    }

    pub fn set_remote(&self, remote: bool) {
        self.update(|criteria| criteria.is_remote = remote);
    }

    pub fn set_part_time(&self, part_time: bool) {
        self.update(|criteria| criteria.is_part_time = part_time);
    }

    /// Resets every criterion in one transition.
    pub fn clear(&self) {
        self.update(|criteria| *criteria = FilterCriteria::default());
    }
}

/// Accepts both query-string text and typed JSON values.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Flag(bool),
    Number(u64),
    Text(String),
}

impl Loose {
    fn into_text(self) -> String {
        match self {
            Loose::Flag(flag) => flag.to_string(),
            Loose::Number(number) => number.to_string(),
            Loose::Text(text) => text.trim().to_string(),
        }
    }
}

fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<Loose>::deserialize(deserializer)?;
    Ok(opt.map(Loose::into_text).unwrap_or_default())
}

fn optional_company<'de, D>(deserializer: D) -> Result<Option<CompanyId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = loose_text(deserializer)?;
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u64>()
        .map(|id| Some(CompanyId(id)))
        .map_err(|_| serde::de::Error::custom(format!("invalid company id '{raw}'")))
}

fn salary_floor<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = loose_text(deserializer)?;
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>()
        .map_err(|_| serde::de::Error::custom(format!("invalid salary floor '{raw}'")))
}

fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = loose_text(deserializer)?.to_ascii_lowercase();
    match raw.as_str() {
        "" | "false" | "0" | "off" | "no" => Ok(false),
        "true" | "1" | "on" | "yes" => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "invalid checkbox value '{other}'"
        ))),
    }
}
