//! End-to-end scenarios for the job board, driven through the public service facade and the
//! HTTP router only.

mod common {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::response::Response;
    use serde_json::Value;

    use hireboard::board::{
        BoardService, InMemoryBoard, InMemoryFileStore, InMemoryNotifications,
    };
    use hireboard::request::SettlementPolicy;
    use hireboard::session::{AccessToken, SessionUser, UserId, UserRole};

    pub(super) const RECRUITER: &str = "tok-recruiter";
    pub(super) const CANDIDATE: &str = "tok-candidate";

    pub(super) const SEED_CSV: &str = "\
title,description,location,salary,remote,part_time,company,recruiter_id,requirements,skills,minimum_experience,openings,created_at
Rust Engineer,Build the matching engine. Pair with product.,Karnataka,30000,no,no,Acme,user_rec,Rust,\"rust, tokio\",2,1,2025-01-15
Remote Rust Engineer,Own the API. Work async.,Goa,45000,yes,no,Acme,user_rec,Rust,rust,3,2,2025-01-20
Support Lead,Help customers.,Goa,18000,no,yes,Globex,user_rec,,,,1,2025-02-01
Part-time Designer,Shape the brand.,Delhi,22000,yes,yes,Globex,user_rec,,figma,1,1,2025-02-03
";

    pub(super) type Service = BoardService<InMemoryBoard, InMemoryFileStore, InMemoryNotifications>;

    pub(super) struct World {
        pub board: InMemoryBoard,
        pub notifications: InMemoryNotifications,
        pub service: Arc<Service>,
    }

    pub(super) fn world(policy: SettlementPolicy) -> World {
        let board = InMemoryBoard::new();
        board.register_user(
            AccessToken::new(RECRUITER),
            SessionUser {
                id: UserId("user_rec".to_string()),
                full_name: "Priya Nair".to_string(),
                role: Some(UserRole::Recruiter),
            },
        );
        board.register_user(
            AccessToken::new(CANDIDATE),
            SessionUser {
                id: UserId("user_cand".to_string()),
                full_name: "Ravi Kumar".to_string(),
                role: Some(UserRole::Candidate),
            },
        );
        let jobs = hireboard::board::import_jobs(SEED_CSV.as_bytes()).expect("seed parses");
        board.load_seed(jobs);

        let files = InMemoryFileStore::new("https://storage.test", Arc::new(board.clone()));
        let notifications = InMemoryNotifications::default();
        let service = BoardService::new(
            Arc::new(board.clone()),
            Arc::new(files),
            Arc::new(notifications.clone()),
            Arc::new(board.clone()),
        )
        .with_settlement(policy);

        World {
            board,
            notifications,
            service: Arc::new(service),
        }
    }

    pub(super) fn request(
        method: &str,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        let built = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        built.expect("request builds")
    }

    pub(super) async fn read_json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }
}

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::*;
use hireboard::board::{board_router, FilterCriteria, FilterState, NotificationLevel};
use hireboard::request::SettlementPolicy;
use hireboard::session::AccessToken;

#[tokio::test]
async fn seeded_board_filters_like_the_listing_page() {
    let world = world(SettlementPolicy::LastSettledWins);
    let session = world.service.session(Some(AccessToken::new(CANDIDATE)));
    let listing = world.service.list_jobs(&session);

    let all = listing
        .trigger(FilterCriteria::default())
        .await
        .expect("full listing");
    assert_eq!(all.len(), 4);

    let remote_part_time = listing
        .trigger(FilterCriteria {
            is_remote: true,
            is_part_time: true,
            ..FilterCriteria::default()
        })
        .await
        .expect("filtered listing");
    let titles: Vec<&str> = remote_part_time
        .iter()
        .map(|job| job.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Part-time Designer"]);

    let well_paid = listing
        .trigger(FilterCriteria {
            min_salary: 30_000,
            search_query: "rust".to_string(),
            ..FilterCriteria::default()
        })
        .await
        .expect("filtered listing");
    assert_eq!(well_paid.len(), 2);
}

#[tokio::test]
async fn filter_state_drives_the_listing_feed() {
    let world = world(SettlementPolicy::LatestDispatchOnly);
    let session = world.service.session(Some(AccessToken::new(CANDIDATE)));
    let filters = FilterState::default();
    let feed = world.service.listing_feed(&session, &filters);
    let mut listing = feed.subscribe();

    filters.set_location("Goa");

    let jobs = tokio::time::timeout(std::time::Duration::from_secs(2), async {
        loop {
            {
                let state = listing.borrow_and_update();
                let goa_only = state.data.as_ref().filter(|jobs| {
                    !jobs.is_empty() && jobs.iter().all(|job| job.location == "Goa")
                });
                if let (false, Some(jobs)) = (state.loading, goa_only) {
                    return jobs.clone();
                }
            }
            listing.changed().await.expect("feed alive");
        }
    })
    .await
    .expect("feed settled");

    assert_eq!(jobs.len(), 2);
    feed.shutdown();
}

#[tokio::test]
async fn recruiter_to_hire_over_http() {
    let world = world(SettlementPolicy::LastSettledWins);
    let router = board_router(world.service.clone());

    let company = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/companies",
            RECRUITER,
            Some(json!({
                "name": "Initech",
                "about": "Enterprise software",
                "logo": { "file_name": "initech.jpg", "data_base64": "/9j/4AAQ" },
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(company.status(), StatusCode::CREATED);
    let company_id = read_json_body(company).await["id"]
        .as_u64()
        .expect("company id");

    let posted = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/jobs",
            RECRUITER,
            Some(json!({
                "title": "Staff Engineer",
                "description": "Lead the platform group. Mentor.",
                "location": "Delhi",
                "company_id": company_id.to_string(),
                "requirements": "- 8 years",
                "salary": 90000,
                "minimum_experience": 8,
                "openings": 1,
                "skills": "rust, leadership",
                "is_remote": false,
                "is_part_time": false,
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(posted.status(), StatusCode::CREATED);
    let job_id = read_json_body(posted).await["id"]
        .as_u64()
        .expect("job id");
    assert_eq!(world.board.job_count(), 5);
    assert!(world
        .notifications
        .events()
        .iter()
        .any(|event| event.level == NotificationLevel::Success));

    let applied = router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/jobs/{job_id}/applications"),
            CANDIDATE,
            Some(json!({
                "experience": 9,
                "why_hire": "I led a platform team of twelve.",
                "resume": {
                    "file_name": "ravi.pdf",
                    "content_type": "application/pdf",
                    "data_base64": "JVBERi0xLjc=",
                },
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(applied.status(), StatusCode::CREATED);
    let application_id = read_json_body(applied).await["id"]
        .as_u64()
        .expect("application id");

    let hired = router
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/applications/{application_id}/status"),
            RECRUITER,
            Some(json!({ "status": "hired" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(hired.status(), StatusCode::OK);

    let closed = router
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/jobs/{job_id}/status"),
            RECRUITER,
            Some(json!({ "is_open": false })),
        ))
        .await
        .expect("route executes");
    assert_eq!(closed.status(), StatusCode::OK);

    let mine = router
        .clone()
        .oneshot(request("GET", "/api/v1/applications", CANDIDATE, None))
        .await
        .expect("route executes");
    let payload = read_json_body(mine).await;
    assert_eq!(payload["applications"][0]["status"], "hired");

    let detail = router
        .oneshot(request(
            "GET",
            &format!("/api/v1/jobs/{job_id}"),
            CANDIDATE,
            None,
        ))
        .await
        .expect("route executes");
    let payload = read_json_body(detail).await;
    assert_eq!(payload["apply_button"], "hiring_closed");
    assert_eq!(payload["application_count"], 1);
}
