use crate::cli::ServeArgs;
use crate::infra::{build_sources, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use orpha_dx::config::AppConfig;
use orpha_dx::diagnosis::DiagnosisService;
use orpha_dx::error::AppError;
use orpha_dx::telemetry;
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

    let (uploads, sources) = build_sources(&config.data);
    let data_source = sources.warm();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        uploads,
        sources: sources.clone(),
    };

    let service = Arc::new(DiagnosisService::new(
        Arc::new(sources),
        config.ranking.clone(),
    ));

    let app = with_service_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data_source = ?data_source,
        candidate_limit = config.ranking.candidate_limit,
        "rare disease ranking service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
