use crate::config::ConfigError;
use crate::diagnosis::DiagnosisError;
use crate::knowledge::{KnowledgeLoadError, StoreError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Knowledge(KnowledgeLoadError),
    Store(StoreError),
    Diagnosis(DiagnosisError),
    Upload(String),
    Task(tokio::task::JoinError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Knowledge(err) => write!(f, "data error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
            AppError::Diagnosis(err) => write!(f, "diagnosis error: {}", err),
            AppError::Upload(reason) => write!(f, "upload rejected: {}", reason),
            AppError::Task(err) => write!(f, "background task failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Knowledge(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Diagnosis(err) => Some(err),
            AppError::Upload(_) => None,
            AppError::Task(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Diagnosis(err) => return err.into_response(),
            AppError::Knowledge(_) | AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<KnowledgeLoadError> for AppError {
    fn from(value: KnowledgeLoadError) -> Self {
        Self::Knowledge(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DiagnosisError> for AppError {
    fn from(value: DiagnosisError) -> Self {
        Self::Diagnosis(value)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value)
    }
}
