use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::Alert;
use crate::backend::{BackendError, DatabaseBackend};

/// Application state shared across handlers
pub struct AppState {
    pub db: Arc<dyn DatabaseBackend>,
}

impl AppState {
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Alerts
// ============================================================================

/// Body for operations that only report an outcome
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub code: u16,
    pub message: String,
}

impl StatusResponse {
    fn reply(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                code: status.as_u16(),
                message: message.into(),
            }),
        )
    }
}

pub async fn delete_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_alert(&id).await?;

    tracing::info!(alert_id = %id, "Alert deleted");
    Ok(StatusResponse::reply(StatusCode::OK, "alert deleted"))
}

pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    let alerts = state.db.list_alerts().await?;
    Ok(Json(alerts))
}

pub async fn new_alert(
    State(state): State<Arc<AppState>>,
    Json(alert): Json<Alert>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.db.new_alert(alert).await?;

    tracing::info!(alert_id = created.id().unwrap_or_default(), "Alert created");
    Ok((StatusCode::CREATED, Json(created)))
}

// ============================================================================
// Error Handling
// ============================================================================

/// Backend failures surfaced to the client with the backend's message intact
#[derive(Debug)]
pub struct ApiError(pub BackendError);

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            BackendError::NotFound(_) => StatusCode::NOT_FOUND,
            BackendError::AlreadyExists(_) => StatusCode::CONFLICT,
            BackendError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            BackendError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            BackendError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BackendError::Network(_) | BackendError::Remote { .. } | BackendError::Decode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Backend request failed");
        }

        let body = serde_json::json!({
            "error": self.0.to_string()
        });

        (status, Json(body)).into_response()
    }
}
