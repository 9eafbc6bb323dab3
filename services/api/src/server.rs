use crate::cli::ServeArgs;
use crate::infra::{portal_service, AppState};
use crate::routes::{with_media_files, with_portal_routes};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use curriculum::config::AppConfig;
use curriculum::error::AppError;
use curriculum::telemetry;
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

    let service = Arc::new(portal_service(&config));
    // Fail fast on an unreadable snapshot instead of on the first request.
    service.catalog().read(|catalog| catalog.levels().len())?;

    let app = with_media_files(
        with_portal_routes(service),
        &config.storage.media_root,
        &config.storage.media_url,
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data = %config.storage.data_path.display(),
        "curriculum portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
