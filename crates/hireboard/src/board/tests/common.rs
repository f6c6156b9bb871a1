use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::board::domain::{CompanyId, JobId, JobRecord, NewJob};
use crate::board::memory::{InMemoryBoard, InMemoryFileStore, InMemoryNotifications};
use crate::board::service::BoardService;
use crate::request::SettlementPolicy;
use crate::session::{AccessToken, SessionContext, SessionUser, UserId, UserRole};

pub(super) const RECRUITER_TOKEN: &str = "tok-recruiter";
pub(super) const RIVAL_TOKEN: &str = "tok-rival";
pub(super) const CANDIDATE_TOKEN: &str = "tok-candidate";
pub(super) const ONBOARDING_TOKEN: &str = "tok-onboarding";

pub(super) type TestService = BoardService<InMemoryBoard, InMemoryFileStore, InMemoryNotifications>;

pub(super) fn recruiter() -> SessionUser {
    SessionUser {
        id: UserId("user_rec".to_string()),
        full_name: "Priya Nair".to_string(),
        role: Some(UserRole::Recruiter),
    }
}

pub(super) fn rival() -> SessionUser {
    SessionUser {
        id: UserId("user_rival".to_string()),
        full_name: "Sam Ortiz".to_string(),
        role: Some(UserRole::Recruiter),
    }
}

pub(super) fn candidate() -> SessionUser {
    SessionUser {
        id: UserId("user_cand".to_string()),
        full_name: "Ravi Kumar".to_string(),
        role: Some(UserRole::Candidate),
    }
}

/// Signed in but has not picked a role yet.
pub(super) fn onboarding() -> SessionUser {
    SessionUser {
        id: UserId("user_new".to_string()),
        full_name: "Ana Lima".to_string(),
        role: None,
    }
}

pub(super) fn posted_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn new_job(company_id: CompanyId, title: &str) -> NewJob {
    NewJob {
        title: title.to_string(),
        description: format!("{title} wanted. Join a small team."),
        location: "Karnataka".to_string(),
        company_id,
        requirements: "- Ship features".to_string(),
        salary: 20_000,
        minimum_experience: 1,
        openings: 2,
        skills: "rust, sql".to_string(),
        is_remote: false,
        is_part_time: false,
    }
}

/// Detached record for pure filter checks.
pub(super) fn job(
    id: u64,
    title: &str,
    salary: u32,
    is_remote: bool,
    is_part_time: bool,
) -> JobRecord {
    JobRecord {
        id: JobId(id),
        title: title.to_string(),
        description: "Build things.".to_string(),
        location: if id % 2 == 0 { "Goa" } else { "Karnataka" }.to_string(),
        salary,
        is_remote,
        is_part_time,
        is_open: true,
        recruiter_id: recruiter().id,
        company_id: CompanyId(id % 2 + 1),
        requirements: String::new(),
        skills: String::new(),
        minimum_experience: 0,
        openings: 1,
        created_at: posted_at() + Duration::hours(id as i64),
        company: None,
        applications: Vec::new(),
    }
}

pub(super) fn board() -> InMemoryBoard {
    let board = InMemoryBoard::new();
    board.register_user(AccessToken::new(RECRUITER_TOKEN), recruiter());
    board.register_user(AccessToken::new(RIVAL_TOKEN), rival());
    board.register_user(AccessToken::new(CANDIDATE_TOKEN), candidate());
    board.register_user(AccessToken::new(ONBOARDING_TOKEN), onboarding());
    board
}

pub(super) struct Harness {
    pub board: InMemoryBoard,
    pub files: InMemoryFileStore,
    pub notifications: InMemoryNotifications,
    pub service: Arc<TestService>,
    pub acme: CompanyId,
}

pub(super) fn harness() -> Harness {
    harness_with(SettlementPolicy::LastSettledWins)
}

pub(super) fn harness_with(policy: SettlementPolicy) -> Harness {
    let board = board();
    let acme = board
        .seed_company("Acme", "Widgets for everyone", "https://cdn.test/acme.png")
        .id;
    let files = InMemoryFileStore::new("https://storage.test", Arc::new(board.clone()));
    let notifications = InMemoryNotifications::default();
    let service = BoardService::new(
        Arc::new(board.clone()),
        Arc::new(files.clone()),
        Arc::new(notifications.clone()),
        Arc::new(board.clone()),
    )
    .with_settlement(policy);

    Harness {
        board,
        files,
        notifications,
        service: Arc::new(service),
        acme,
    }
}

impl Harness {
    pub fn session(&self, token: &str) -> SessionContext {
        self.service.session(Some(AccessToken::new(token)))
    }

    pub fn post(&self, title: &str) -> JobRecord {
        self.board
            .seed_job(new_job(self.acme, title), recruiter().id, posted_at())
    }
}

pub(super) fn pdf_base64() -> &'static str {
    // "%PDF-1.7"
    "JVBERi0xLjc="
}

pub(super) fn png_base64() -> &'static str {
    // PNG signature bytes
    "iVBORw0KGgo="
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
