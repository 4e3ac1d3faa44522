//! System endpoints: service banner and health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Service banner.
pub const BANNER: &str = "WealthAI API is online";

/// Root response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    message: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

/// `GET /`: Service banner.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Service banner",
    responses(
        (status = 200, description = "Service is running", body = RootResponse),
    )
)]
pub async fn root_handler() -> impl IntoResponse {
    Json(RootResponse { message: BANNER })
}

/// `GET /health`: Service and database health.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Probes the database with a trivial query. Responds 503 when storage is unreachable.",
    responses(
        (status = 200, description = "Service and database are healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "connected",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    database: "disconnected",
                }),
            )
        }
    }
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}
