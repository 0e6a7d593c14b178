use crate::cli::ServeArgs;
use crate::infra::{AppState, BufferedNotificationPublisher, InMemoryGrantRepository};
use crate::routes::with_grant_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grantflow::config::AppConfig;
use grantflow::error::AppError;
use grantflow::grants::GrantProgramService;
use grantflow::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryGrantRepository::default());
    let notifications = Arc::new(BufferedNotificationPublisher::new(
        config.notifications.clone(),
    ));
    let grant_service = Arc::new(GrantProgramService::new(repository, notifications));

    let app = with_grant_routes(grant_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        notify_queue_depth = config.notifications.queue_depth,
        notify_retry_count = config.notifications.retry_count,
        "grant program service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
