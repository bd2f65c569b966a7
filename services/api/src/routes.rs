use crate::infra::AppState;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json};
use chrono::Utc;
use orpha_dx::diagnosis::{diagnosis_router, DiagnosisService};
use orpha_dx::error::AppError;
use orpha_dx::knowledge::{AssociationStore, KnowledgeImporter, LoadReport, SourceChain};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Full Orphanet exports run to tens of megabytes.
const UPLOAD_LIMIT_BYTES: usize = 128 * 1024 * 1024;
const UPLOAD_SOURCE: &str = "upload";

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    pub(crate) success: bool,
    pub(crate) message: String,
    #[serde(flatten)]
    pub(crate) report: LoadReport,
}

pub(crate) fn with_service_routes(service: Arc<DiagnosisService<SourceChain>>) -> axum::Router {
    diagnosis_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api", get(api_index))
        .route(
            "/upload-data",
            post(upload_endpoint).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
}

pub(crate) async fn healthcheck(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    let sources = state.sources.clone();
    let data_source = tokio::task::spawn_blocking(move || sources.resolve().ok())
        .await
        .ok()
        .flatten()
        .map(|(kind, _)| kind);
    Json(json!({
        "status": "healthy",
        "data_loaded": data_source.is_some(),
        "data_source": data_source,
        "timestamp": Utc::now().to_rfc3339(),
    }))
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

pub(crate) async fn api_index() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Orpha DX",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /diagnose": "rank disorders for present and absent symptoms",
            "GET /symptoms": "symptom vocabulary (search, limit)",
            "GET /diseases": "disorder listing (search, limit)",
            "GET /info": "dataset totals and serving source",
            "POST /upload-data": "replace the dataset with a CSV export",
            "GET /health": "liveness and data status",
            "GET /ready": "readiness check",
            "GET /metrics": "Prometheus metrics",
        },
    }))
}

/// Accepts either a `multipart/form-data` form carrying a `.csv` file or the
/// CSV text as the raw body. The whole export is parsed before touching the
/// store, so a bad upload leaves the current snapshot serving.
pub(crate) async fn upload_endpoint(
    Extension(state): Extension<AppState>,
    request: Request,
) -> Result<Json<UploadResponse>, AppError> {
    let csv = read_upload(request).await?;
    let uploads = state.uploads.clone();

    let (report, replaced) = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let (table, report) = KnowledgeImporter::from_reader(csv.as_bytes(), UPLOAD_SOURCE)?;
        let previous = uploads.replace(table)?;
        Ok((report, previous.is_some()))
    })
    .await??;

    info!(
        associations = report.associations,
        disorders = report.disorders,
        replaced,
        "uploaded association data installed"
    );

    Ok(Json(UploadResponse {
        success: true,
        message: format!(
            "loaded {} associations for {} disorders",
            report.associations, report.disorders
        ),
        report,
    }))
}

async fn read_upload(request: Request) -> Result<String, AppError> {
    let multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if !multipart {
        return String::from_request(request, &())
            .await
            .map_err(|rejection| AppError::Upload(rejection.body_text()));
    }

    let mut form = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| AppError::Upload(rejection.body_text()))?;

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|err| AppError::Upload(err.body_text()))?
    {
        let is_csv = match field.file_name() {
            Some(name) => name.to_ascii_lowercase().ends_with(".csv"),
            None => continue,
        };
        if !is_csv {
            return Err(AppError::Upload("only CSV files are supported".to_string()));
        }
        return field
            .text()
            .await
            .map_err(|err| AppError::Upload(err.body_text()));
    }

    Err(AppError::Upload("multipart form carried no file".to_string()))
}
