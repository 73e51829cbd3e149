use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::adapters::prometheus::{encode_text, EncodeError};
use crate::application::{ControlError, ControlService, Exporter, Mutation};
use crate::domain::WatchedResource;
use crate::ports::PullCollector;

/// Error body returned by every failing endpoint
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

impl From<ControlError> for AppError {
    fn from(err: ControlError) -> Self {
        warn!("Control request rejected: {}", err);
        AppError::new(StatusCode::NOT_ACCEPTABLE, err.to_string())
    }
}

impl From<EncodeError> for AppError {
    fn from(err: EncodeError) -> Self {
        error!("Exposition failed: {}", err);
        AppError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub control: ControlService,
    pub exporter: Arc<Exporter>,
}

impl AppState {
    pub fn new(exporter: Arc<Exporter>) -> Self {
        Self {
            control: ControlService::new(exporter.registry().clone()),
            exporter,
        }
    }
}

/// Response for /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub resources: usize,
    pub hosts: usize,
    pub timestamp: String,
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.exporter.registry();
    Json(HealthResponse {
        status: "healthy",
        service: "chimon",
        resources: registry.len(),
        hosts: registry.host_count(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handler for GET on the control path: full registry snapshot
pub async fn list_handler(State(state): State<AppState>) -> Json<Vec<WatchedResource>> {
    Json(state.control.list())
}

/// Handler for POST on the control path
pub async fn add_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<serde_json::Value>, AppError> {
    state.control.handle(Mutation::Add, &body)?;
    Ok(Json(serde_json::json!({})))
}

/// Handler for DELETE on the control path
pub async fn remove_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<serde_json::Value>, AppError> {
    state.control.handle(Mutation::Remove, &body)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn method_not_allowed_handler(method: Method) -> AppError {
    AppError::new(StatusCode::METHOD_NOT_ALLOWED, format!("unsupported method: {}", method))
}

pub async fn not_found_handler(uri: Uri) -> AppError {
    debug!(path = %uri.path(), "No route");
    AppError::new(StatusCode::NOT_FOUND, format!("not found: {}", uri.path()))
}

/// Handler for GET on the metrics path: one collection, text exposition
pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let samples = state.exporter.collect().await;
    let body = encode_text(&samples)?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}
