use hireboard::board::{
    import_jobs, import_jobs_from_path, BoardService, InMemoryBoard, InMemoryFileStore,
    Notification, NotificationError, NotificationLevel, NotificationPublisher,
};
use hireboard::config::BoardConfig;
use hireboard::error::AppError;
use hireboard::session::{AccessToken, SessionUser, UserId, UserRole};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub(crate) const DEMO_RECRUITER_TOKEN: &str = "demo-recruiter";
pub(crate) const DEMO_CANDIDATE_TOKEN: &str = "demo-candidate";

/// Postings loaded when no seed file is configured.
pub(crate) const SAMPLE_SEED: &str = "\
title,description,location,salary,remote,part_time,company,recruiter_id,requirements,skills,minimum_experience,openings,created_at
Backend Engineer,Build the listing and search APIs. Own reliability.,Karnataka,45000,no,no,Acme,user_demo_recruiter,- Rust or Go,\"rust, postgres, tokio\",2,2,2025-01-10
Frontend Engineer,Ship the candidate experience. Work with design.,Delhi,38000,yes,no,Acme,user_demo_recruiter,- TypeScript,\"react, css\",1,1,2025-01-18
Support Specialist,Answer candidate questions. Triage bugs.,Goa,18000,no,yes,Globex,user_demo_recruiter,,support,0,3,2025-02-02
Content Writer,Write job guides. Edit blog posts.,Maharashtra,15000,yes,yes,Globex,user_demo_recruiter,,writing,0,1,2025-02-20
Data Analyst,Build hiring funnels. Report weekly.,Karnataka,32000,no,no,Initech,user_demo_recruiter,- SQL,\"sql, python\",1,1,2025-03-01
";

pub(crate) type DemoBoardService =
    BoardService<InMemoryBoard, InMemoryFileStore, LoggedNotifications>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps a copy of every notification and mirrors it to the log.
#[derive(Default, Clone)]
pub(crate) struct LoggedNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for LoggedNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        match notification.level {
            NotificationLevel::Success => info!(message = %notification.message, "notification"),
            NotificationLevel::Error => warn!(message = %notification.message, "notification"),
        }
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl LoggedNotifications {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

pub(crate) fn demo_recruiter() -> SessionUser {
    SessionUser {
        id: UserId("user_demo_recruiter".to_string()),
        full_name: "Dana Recruiter".to_string(),
        role: Some(UserRole::Recruiter),
    }
}

pub(crate) fn demo_candidate() -> SessionUser {
    SessionUser {
        id: UserId("user_demo_candidate".to_string()),
        full_name: "Casey Candidate".to_string(),
        role: Some(UserRole::Candidate),
    }
}

/// In-memory board with the demo users registered and postings imported.
pub(crate) fn seeded_board(config: &BoardConfig) -> Result<InMemoryBoard, AppError> {
    let board = InMemoryBoard::new();
    board.register_user(AccessToken::new(DEMO_RECRUITER_TOKEN), demo_recruiter());
    board.register_user(AccessToken::new(DEMO_CANDIDATE_TOKEN), demo_candidate());

    let jobs = match &config.seed_csv {
        Some(path) => import_jobs_from_path(path)?,
        None => import_jobs(SAMPLE_SEED.as_bytes())?,
    };
    let loaded = board.load_seed(jobs);
    info!(
        jobs = loaded.len(),
        source = config
            .seed_csv
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "built-in sample".to_string()),
        "board seeded"
    );

    Ok(board)
}

pub(crate) fn board_service(
    board: InMemoryBoard,
    config: &BoardConfig,
) -> (Arc<DemoBoardService>, LoggedNotifications) {
    let directory = Arc::new(board.clone());
    let files = InMemoryFileStore::new(config.storage_url.clone(), directory.clone());
    let notifications = LoggedNotifications::default();
    let service = BoardService::new(
        Arc::new(board),
        Arc::new(files),
        Arc::new(notifications.clone()),
        directory,
    )
    .with_settlement(config.settlement);

    (Arc::new(service), notifications)
}
