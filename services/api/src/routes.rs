use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use hireboard::board::{board_router, FileStore, JobBoardBackend, NotificationPublisher};
use hireboard::board::BoardService;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_board_routes<B, F, N>(service: Arc<BoardService<B, F, N>>) -> axum::Router
where
    B: JobBoardBackend,
    F: FileStore,
    N: NotificationPublisher,
{
    board_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{board_service, seeded_board, DEMO_CANDIDATE_TOKEN};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use hireboard::config::BoardConfig;
    use hireboard::request::SettlementPolicy;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn board_config() -> BoardConfig {
        BoardConfig {
            storage_url: "http://127.0.0.1:3000/storage".to_string(),
            settlement: SettlementPolicy::LastSettledWins,
            seed_csv: None,
        }
    }

    fn app(ready: bool) -> axum::Router {
        let board = seeded_board(&board_config()).expect("sample seed loads");
        let (service, _) = board_service(board, &board_config());
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_board_routes(service).layer(Extension(state))
    }

    async fn read_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let response = app(false)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_reflects_the_startup_flag() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn board_routes_are_mounted_next_to_service_routes() {
        let response = app(true)
            .oneshot(
                Request::get("/api/v1/jobs?is_remote=true")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {DEMO_CANDIDATE_TOKEN}"),
                    )
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["jobs"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn readiness_flag_is_shared_across_clones() {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let clone = state.clone();
        state.readiness.store(true, Ordering::Release);
        assert!(clone.readiness.load(Ordering::Acquire));
    }
}
