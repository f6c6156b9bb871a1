use crate::cli::ServeArgs;
use crate::infra::{
    board_service, seeded_board, AppState, DEMO_CANDIDATE_TOKEN, DEMO_RECRUITER_TOKEN,
};
use crate::routes::with_board_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hireboard::config::AppConfig;
use hireboard::error::AppError;
use hireboard::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(seed_csv) = args.seed_csv.take() {
        config.board.seed_csv = Some(seed_csv);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let board = seeded_board(&config.board)?;
    let (board_service, _notifications) = board_service(board, &config.board);

    let app = with_board_routes(board_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        settlement = ?config.board.settlement,
        recruiter_token = DEMO_RECRUITER_TOKEN,
        candidate_token = DEMO_CANDIDATE_TOKEN,
        "job board ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
