use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use super::query::{DiagnosisRequest, ListingParams};
use super::service::{DiagnosisError, DiagnosisService};
use super::Ranking;
use crate::knowledge::AssociationStore;

/// Body returned by a successful `POST /diagnose`.
#[derive(Debug, Serialize)]
pub struct DiagnosisResponse {
    pub success: bool,
    #[serde(flatten)]
    pub ranking: Ranking,
}

/// Router builder exposing the ranking and vocabulary endpoints.
pub fn diagnosis_router<S>(service: Arc<DiagnosisService<S>>) -> Router
where
    S: AssociationStore + 'static,
{
    Router::new()
        .route("/diagnose", post(diagnose_handler::<S>))
        .route("/symptoms", get(symptoms_handler::<S>))
        .route("/diseases", get(diseases_handler::<S>))
        .route("/info", get(info_handler::<S>))
        .with_state(service)
}

pub(crate) async fn diagnose_handler<S>(
    State(service): State<Arc<DiagnosisService<S>>>,
    Json(request): Json<DiagnosisRequest>,
) -> Response
where
    S: AssociationStore + 'static,
{
    match run_blocking(move || service.diagnose(request)).await {
        Ok(Ok(ranking)) => (
            StatusCode::OK,
            Json(DiagnosisResponse {
                success: true,
                ranking,
            }),
        )
            .into_response(),
        Ok(Err(error)) => error.into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn symptoms_handler<S>(
    State(service): State<Arc<DiagnosisService<S>>>,
    Query(params): Query<ListingParams>,
) -> Response
where
    S: AssociationStore + 'static,
{
    match run_blocking(move || service.symptoms(&params)).await {
        Ok(Ok(listing)) => (StatusCode::OK, Json(listing)).into_response(),
        Ok(Err(error)) => error.into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn diseases_handler<S>(
    State(service): State<Arc<DiagnosisService<S>>>,
    Query(params): Query<ListingParams>,
) -> Response
where
    S: AssociationStore + 'static,
{
    match run_blocking(move || service.diseases(&params)).await {
        Ok(Ok(listing)) => (StatusCode::OK, Json(listing)).into_response(),
        Ok(Err(error)) => error.into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn info_handler<S>(State(service): State<Arc<DiagnosisService<S>>>) -> Response
where
    S: AssociationStore + 'static,
{
    match run_blocking(move || service.info()).await {
        Ok(Ok(info)) => (StatusCode::OK, Json(info)).into_response(),
        Ok(Err(error)) => error.into_response(),
        Err(response) => response,
    }
}

/// Service calls may load a CSV export on first use, so they run on the
/// blocking pool instead of an async worker.
async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        error!(error = %err, "diagnosis task failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": "diagnosis task failed" })),
        )
            .into_response()
    })
}

impl DiagnosisError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DiagnosisError::InvalidQuery(_) | DiagnosisError::NoValidSymptoms { .. } => {
                StatusCode::BAD_REQUEST
            }
            DiagnosisError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DiagnosisError::ComputationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for DiagnosisError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = match &self {
            DiagnosisError::NoValidSymptoms { unrecognized } => json!({
                "success": false,
                "error": self.to_string(),
                "unrecognized_symptoms": unrecognized,
                "results": [],
                "total_diseases_evaluated": 0,
            }),
            _ => json!({
                "success": false,
                "error": self.to_string(),
            }),
        };
        (status, Json(payload)).into_response()
    }
}
