use crate::cli::ServeArgs;
use crate::infra::{ActivityState, AppState, InMemoryLearningStore, LearningBadgeService};
use crate::routes::build_app;
use axum_prometheus::PrometheusMetricLayer;
use mindpath::config::AppConfig;
use mindpath::error::AppError;
use mindpath::telemetry;
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryLearningStore::seeded());
    let badge_service = Arc::new(LearningBadgeService::new(
        store.clone(),
        store.clone(),
        config.badges.evaluation_config(),
    ));
    let activity = ActivityState {
        store,
        badges: badge_service,
    };

    let app = build_app(activity, app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        launch_date = %config.badges.launch_date,
        "badge service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
