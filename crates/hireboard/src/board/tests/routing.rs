use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::board::backend::NotificationLevel;
use crate::board::filter::FilterCriteria;
use crate::board::router::{bearer_token, board_router, listing_body, status_for};
use crate::request::{ActionError, ActionErrorKind, RequestState};
use crate::session::AccessToken;

fn router(harness: &Harness) -> Router {
    board_router(harness.service.clone())
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request builds")
}

fn send_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn job_draft(company_id: u64) -> Value {
    json!({
        "title": "Platform Engineer",
        "description": "Run the platform. Keep it fast.",
        "location": "Goa",
        "company_id": company_id.to_string(),
        "requirements": "- Linux",
        "salary": 40000,
        "minimum_experience": 3,
        "openings": 2,
        "skills": "rust, linux",
        "is_remote": true,
        "is_part_time": false,
    })
}

#[test]
fn bearer_tokens_are_read_from_the_authorization_header() {
    let request = get("/", Some("tok-abc"));
    assert_eq!(
        bearer_token(request.headers()),
        Some(AccessToken::new("tok-abc"))
    );
    assert_eq!(bearer_token(get("/", None).headers()), None);

    let basic = Request::get("/")
        .header(header::AUTHORIZATION, "Basic Zm9vOmJhcg==")
        .body(Body::empty())
        .expect("request builds");
    assert_eq!(bearer_token(basic.headers()), None);
}

#[test]
fn action_error_kinds_map_to_http_statuses() {
    assert_eq!(status_for(ActionErrorKind::Unauthenticated), StatusCode::UNAUTHORIZED);
    assert_eq!(status_for(ActionErrorKind::Forbidden), StatusCode::FORBIDDEN);
    assert_eq!(status_for(ActionErrorKind::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_for(ActionErrorKind::Conflict), StatusCode::CONFLICT);
    assert_eq!(status_for(ActionErrorKind::Invalid), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(status_for(ActionErrorKind::Upload), StatusCode::BAD_GATEWAY);
    assert_eq!(status_for(ActionErrorKind::Unavailable), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn listing_requires_a_signed_in_user() {
    let harness = harness();

    let response = router(&harness)
        .oneshot(get("/api/v1/jobs", None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["redirect"], "/?sign-in=true");
}

#[tokio::test]
async fn listing_filters_come_from_the_query_string() {
    let harness = harness();
    harness.post("Rust Engineer");
    let remote = harness
        .service
        .create_job(&harness.session(RECRUITER_TOKEN))
        .trigger(crate::board::domain::NewJob {
            is_remote: true,
            salary: 50_000,
            ..new_job(harness.acme, "Remote Rust Engineer")
        })
        .await
        .expect("remote job");

    let response = router(&harness)
        .oneshot(get(
            "/api/v1/jobs?search_query=rust&location=&company_id=&min_salary=30000&is_remote=true&is_part_time=false",
            Some(CANDIDATE_TOKEN),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let jobs = payload["jobs"].as_array().expect("jobs array");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], json!(remote.id.0));
    assert_eq!(jobs[0]["location_label"], "Work From Home");
    assert_eq!(jobs[0]["company_name"], "Acme");
    assert_eq!(jobs[0]["saved"], false);
    assert_eq!(payload["active_filters"], 3);
}

#[tokio::test]
async fn listing_marks_saved_jobs() {
    let harness = harness();
    let job = harness.post("Rust Engineer");
    harness.post("Designer");
    harness
        .service
        .toggle_saved_job(&harness.session(CANDIDATE_TOKEN), false)
        .trigger(job.id)
        .await
        .expect("saved");

    let response = router(&harness)
        .oneshot(get("/api/v1/jobs", Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");

    let payload = read_json_body(response).await;
    let saved: Vec<bool> = payload["jobs"]
        .as_array()
        .expect("jobs array")
        .iter()
        .map(|card| card["saved"].as_bool().unwrap_or_default())
        .collect();
    assert_eq!(saved, vec![true, false]);
    assert_eq!(payload["saved_unavailable"], false);
}

#[test]
fn failed_bookmark_lookup_is_flagged_on_the_listing() {
    let jobs = vec![job(1, "Rust Engineer", 30_000, false, false)];
    let bookmarks = RequestState {
        data: None,
        error: Some(ActionError::unavailable("saved jobs offline")),
        loading: false,
    };
    let filters = FilterCriteria {
        min_salary: 20_000,
        ..FilterCriteria::default()
    };

    let payload = listing_body(&jobs, bookmarks, &filters, posted_at());

    assert_eq!(payload["saved_unavailable"], true);
    assert_eq!(payload["active_filters"], 1);
    assert_eq!(payload["jobs"][0]["saved"], false);
    assert_eq!(payload["jobs"][0]["title"], "Rust Engineer");
}

#[tokio::test]
async fn malformed_filter_values_are_rejected() {
    let harness = harness();

    let response = router(&harness)
        .oneshot(get("/api/v1/jobs?min_salary=lots", Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recruiter_posts_a_job() {
    let harness = harness();

    let response = router(&harness)
        .oneshot(send_json(
            "POST",
            "/api/v1/jobs",
            RECRUITER_TOKEN,
            job_draft(harness.acme.0),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["title"], "Platform Engineer");
    assert_eq!(payload["is_owner"], true);
    assert_eq!(payload["skills"], json!(["rust", "linux"]));
    assert_eq!(harness.board.job_count(), 1);
    assert_eq!(
        harness.notifications.events()[0].level,
        NotificationLevel::Success
    );
}

#[tokio::test]
async fn candidate_post_is_refused_with_redirect_and_notification() {
    let harness = harness();

    let response = router(&harness)
        .oneshot(send_json(
            "POST",
            "/api/v1/jobs",
            CANDIDATE_TOKEN,
            job_draft(harness.acme.0),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert_eq!(payload["redirect"], "/jobs");
    let events = harness.notifications.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "You are not allowed to post jobs");
    assert_eq!(harness.board.job_count(), 0);
}

#[tokio::test]
async fn user_without_a_role_cannot_post_either() {
    let harness = harness();

    let response = router(&harness)
        .oneshot(send_json(
            "POST",
            "/api/v1/jobs",
            ONBOARDING_TOKEN,
            job_draft(harness.acme.0),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_job_draft_returns_field_errors_without_calling_the_backend() {
    let harness = harness();
    let mut draft = job_draft(harness.acme.0);
    draft["title"] = json!("");
    draft["company_id"] = json!("");

    let response = router(&harness)
        .oneshot(send_json("POST", "/api/v1/jobs", RECRUITER_TOKEN, draft))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["errors"]["title"], "Title is required");
    assert_eq!(payload["errors"]["company_id"], "Select or Add a new Company");
    assert!(harness.notifications.events().is_empty());
}

#[tokio::test]
async fn job_detail_shows_apply_state_for_candidates() {
    let harness = harness();
    let job = harness.post("Rust Engineer");

    let response = router(&harness)
        .oneshot(get(&format!("/api/v1/jobs/{}", job.id), Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["apply_button"], "apply");
    assert_eq!(payload["is_owner"], false);
    assert_eq!(payload["status_label"], "Open");
    assert_eq!(
        payload["experience_line"],
        "Minimum 1+ Years of experience needed for this role"
    );
}

#[tokio::test]
async fn missing_job_is_not_found() {
    let harness = harness();

    let response = router(&harness)
        .oneshot(get("/api/v1/jobs/404", Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "not_found");
}

#[tokio::test]
async fn hiring_status_patch_is_owner_only() {
    let harness = harness();
    let job = harness.post("Rust Engineer");
    let uri = format!("/api/v1/jobs/{}/status", job.id);

    let refused = router(&harness)
        .oneshot(send_json("PATCH", &uri, RIVAL_TOKEN, json!({ "is_open": false })))
        .await
        .expect("route executes");
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);

    let accepted = router(&harness)
        .oneshot(send_json("PATCH", &uri, RECRUITER_TOKEN, json!({ "is_open": false })))
        .await
        .expect("route executes");
    assert_eq!(accepted.status(), StatusCode::OK);
    let payload = read_json_body(accepted).await;
    assert_eq!(payload["status_label"], "Closed");
}

#[tokio::test]
async fn save_route_toggles_the_bookmark() {
    let harness = harness();
    let job = harness.post("Rust Engineer");
    let uri = format!("/api/v1/jobs/{}/save", job.id);

    let first = router(&harness)
        .oneshot(send_json("POST", &uri, CANDIDATE_TOKEN, json!({})))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(first).await["outcome"], "saved");

    let saved = router(&harness)
        .oneshot(get("/api/v1/saved-jobs", Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");
    let payload = read_json_body(saved).await;
    assert_eq!(payload["jobs"][0]["title"], "Rust Engineer");
    assert_eq!(payload["jobs"][0]["saved"], true);

    let second = router(&harness)
        .oneshot(send_json("POST", &uri, CANDIDATE_TOKEN, json!({})))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(second).await["outcome"], "removed");
}

#[tokio::test]
async fn candidate_applies_with_a_base64_resume() {
    let harness = harness();
    let job = harness.post("Rust Engineer");
    let uri = format!("/api/v1/jobs/{}/applications", job.id);

    let response = router(&harness)
        .oneshot(send_json(
            "POST",
            &uri,
            CANDIDATE_TOKEN,
            json!({
                "experience": 4,
                "why_hire": "I maintain a popular crate.",
                "resume": {
                    "file_name": "resume.pdf",
                    "data_base64": pdf_base64(),
                },
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "applied");
    assert_eq!(payload["name"], "Ravi Kumar");
    assert_eq!(harness.files.object_count(), 1);

    let mine = router(&harness)
        .oneshot(get("/api/v1/applications", Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");
    let payload = read_json_body(mine).await;
    assert_eq!(payload["applications"].as_array().map(Vec::len), Some(1));

    let detail = router(&harness)
        .oneshot(get(&format!("/api/v1/jobs/{}", job.id), Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(detail).await["apply_button"], "applied");
}

#[tokio::test]
async fn application_with_an_image_resume_is_rejected() {
    let harness = harness();
    let job = harness.post("Rust Engineer");

    let response = router(&harness)
        .oneshot(send_json(
            "POST",
            &format!("/api/v1/jobs/{}/applications", job.id),
            CANDIDATE_TOKEN,
            json!({
                "experience": 1,
                "why_hire": "Curious",
                "resume": {
                    "file_name": "resume.png",
                    "data_base64": png_base64(),
                },
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["errors"]["resume"],
        "Only PDF or Word documents are allowed"
    );
    assert_eq!(harness.files.object_count(), 0);
}

#[tokio::test]
async fn recruiter_reviews_applications_for_their_job() {
    let harness = harness();
    let job = harness.post("Rust Engineer");
    router(&harness)
        .oneshot(send_json(
            "POST",
            &format!("/api/v1/jobs/{}/applications", job.id),
            CANDIDATE_TOKEN,
            json!({
                "experience": 2,
                "why_hire": "Ready to start",
                "resume": { "file_name": "cv.pdf", "data_base64": pdf_base64() },
            }),
        ))
        .await
        .expect("route executes");

    let listed = router(&harness)
        .oneshot(get(
            &format!("/api/v1/jobs/{}/applications", job.id),
            Some(RECRUITER_TOKEN),
        ))
        .await
        .expect("route executes");
    let payload = read_json_body(listed).await;
    let application_id = payload["applications"][0]["id"]
        .as_u64()
        .expect("application id");

    let updated = router(&harness)
        .oneshot(send_json(
            "PATCH",
            &format!("/api/v1/applications/{application_id}/status"),
            RECRUITER_TOKEN,
            json!({ "status": "hired" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(read_json_body(updated).await["status"], "hired");

    let rival = router(&harness)
        .oneshot(get(
            &format!("/api/v1/jobs/{}/applications", job.id),
            Some(RIVAL_TOKEN),
        ))
        .await
        .expect("route executes");
    assert_eq!(rival.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn my_jobs_is_recruiter_only() {
    let harness = harness();
    harness.post("Rust Engineer");

    let candidate = router(&harness)
        .oneshot(get("/api/v1/my-jobs", Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");
    assert_eq!(candidate.status(), StatusCode::FORBIDDEN);

    let recruiter = router(&harness)
        .oneshot(get("/api/v1/my-jobs", Some(RECRUITER_TOKEN)))
        .await
        .expect("route executes");
    assert_eq!(recruiter.status(), StatusCode::OK);
    let payload = read_json_body(recruiter).await;
    assert_eq!(payload["jobs"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn delete_route_removes_the_job() {
    let harness = harness();
    let job = harness.post("Rust Engineer");

    let response = router(&harness)
        .oneshot(
            Request::delete(format!("/api/v1/jobs/{}", job.id))
                .header(header::AUTHORIZATION, format!("Bearer {RECRUITER_TOKEN}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["deleted"], json!(job.id.0));
    assert_eq!(harness.board.job_count(), 0);
}

#[tokio::test]
async fn companies_can_be_listed_and_added_by_recruiters() {
    let harness = harness();

    let created = router(&harness)
        .oneshot(send_json(
            "POST",
            "/api/v1/companies",
            RECRUITER_TOKEN,
            json!({
                "name": "Blue Fin Labs",
                "about": "Marine robotics",
                "logo": {
                    "file_name": "logo.png",
                    "content_type": "image/png",
                    "data_base64": png_base64(),
                },
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);

    let duplicate = router(&harness)
        .oneshot(send_json(
            "POST",
            "/api/v1/companies",
            RECRUITER_TOKEN,
            json!({
                "name": "acme",
                "about": "Copycat",
                "logo": { "file_name": "logo.jpg", "data_base64": png_base64() },
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let listed = router(&harness)
        .oneshot(get("/api/v1/companies", Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");
    let payload: Vec<Value> = read_json_body(listed).await["companies"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    let names: Vec<&str> = payload
        .iter()
        .filter_map(|company| company["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Acme", "Blue Fin Labs"]);
}

#[tokio::test]
async fn offline_store_maps_to_service_unavailable() {
    let harness = harness();
    harness.board.set_offline(true);

    let response = router(&harness)
        .oneshot(get("/api/v1/companies", Some(CANDIDATE_TOKEN)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "unavailable");
}
