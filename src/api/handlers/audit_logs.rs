//! Audit log handlers. Entries can be appended and read, never changed.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{Page, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{AuditLog, AuditLogFilter, NewAuditLog};
use crate::error::{CrmError, ErrorResponse};

/// `POST /audit-logs`: Append an audit entry.
///
/// # Errors
///
/// Returns [`CrmError`] for a blank action or a missing manager/client.
#[utoipa::path(
    post,
    path = "/api/v1/audit-logs",
    tag = "Audit",
    summary = "Append an audit entry",
    request_body = NewAuditLog,
    responses(
        (status = 201, description = "Audit entry appended", body = AuditLog),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 422, description = "Manager or client not found", body = ErrorResponse),
    )
)]
pub async fn create_audit_log(
    State(state): State<AppState>,
    payload: Result<Json<NewAuditLog>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(new) = payload?;
    let entry = state.store.audit_logs().create(new).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `GET /audit-logs`
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs",
    tag = "Audit",
    summary = "List audit entries",
    params(AuditLogFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated audit entries", body = Page<AuditLog>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    filter: Result<Query<AuditLogFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params.collect(state.store.audit_logs().list(&filter)).await?;
    Ok(Json(page))
}

/// `GET /audit-logs/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the entry does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs/{id}",
    tag = "Audit",
    summary = "Get an audit entry",
    params(("id" = i64, Path, description = "Audit entry id")),
    responses(
        (status = 200, description = "Audit entry", body = AuditLog),
        (status = 404, description = "Audit entry not found", body = ErrorResponse),
    )
)]
pub async fn get_audit_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.audit_logs().get(id).await?))
}

/// `PATCH /audit-logs/{id}`: Always 405.
///
/// # Errors
///
/// Returns [`CrmError::OperationNotAllowed`] unconditionally.
#[utoipa::path(
    patch,
    path = "/api/v1/audit-logs/{id}",
    tag = "Audit",
    summary = "Modify an audit entry (refused)",
    params(("id" = i64, Path, description = "Audit entry id")),
    responses(
        (status = 405, description = "Audit entries are append-only", body = ErrorResponse),
    )
)]
pub async fn update_audit_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AuditLog>, CrmError> {
    Ok(Json(state.store.audit_logs().update(id).await?))
}

/// `DELETE /audit-logs/{id}`: Always 405.
///
/// # Errors
///
/// Returns [`CrmError::OperationNotAllowed`] unconditionally.
#[utoipa::path(
    delete,
    path = "/api/v1/audit-logs/{id}",
    tag = "Audit",
    summary = "Delete an audit entry (refused)",
    params(("id" = i64, Path, description = "Audit entry id")),
    responses(
        (status = 405, description = "Audit entries are append-only", body = ErrorResponse),
    )
)]
pub async fn delete_audit_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, CrmError> {
    state.store.audit_logs().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Audit log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/audit-logs", post(create_audit_log).get(list_audit_logs))
        .route(
            "/audit-logs/{id}",
            get(get_audit_log)
                .patch(update_audit_log)
                .delete(delete_audit_log),
        )
}
