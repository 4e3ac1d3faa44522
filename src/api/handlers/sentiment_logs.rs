//! Sentiment log handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{Page, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{NewSentimentLog, SentimentLog, SentimentLogFilter, SentimentLogPatch};
use crate::error::{CrmError, ErrorResponse};

/// `POST /sentiment-logs`: Attach a sentiment reading to an interaction.
///
/// # Errors
///
/// Returns [`CrmError`] on an out-of-range score or a missing interaction.
#[utoipa::path(
    post,
    path = "/api/v1/sentiment-logs",
    tag = "Sentiment",
    summary = "Create a sentiment log",
    description = "`sentiment_score` must lie in [-1.0, 1.0].",
    request_body = NewSentimentLog,
    responses(
        (status = 201, description = "Sentiment log created", body = SentimentLog),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 422, description = "Interaction not found", body = ErrorResponse),
    )
)]
pub async fn create_sentiment_log(
    State(state): State<AppState>,
    payload: Result<Json<NewSentimentLog>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(new) = payload?;
    let log = state.store.sentiment_logs().create(new).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

/// `GET /sentiment-logs`
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/sentiment-logs",
    tag = "Sentiment",
    summary = "List sentiment logs",
    params(SentimentLogFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated sentiment log list", body = Page<SentimentLog>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_sentiment_logs(
    State(state): State<AppState>,
    filter: Result<Query<SentimentLogFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params
        .collect(state.store.sentiment_logs().list(&filter))
        .await?;
    Ok(Json(page))
}

/// `GET /sentiment-logs/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the log does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/sentiment-logs/{id}",
    tag = "Sentiment",
    summary = "Get a sentiment log",
    params(("id" = i64, Path, description = "Sentiment log id")),
    responses(
        (status = 200, description = "Sentiment log", body = SentimentLog),
        (status = 404, description = "Sentiment log not found", body = ErrorResponse),
    )
)]
pub async fn get_sentiment_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.sentiment_logs().get(id).await?))
}

/// `PATCH /sentiment-logs/{id}`
///
/// # Errors
///
/// Returns [`CrmError`] on an out-of-range score or a missing log.
#[utoipa::path(
    patch,
    path = "/api/v1/sentiment-logs/{id}",
    tag = "Sentiment",
    summary = "Update a sentiment log",
    params(("id" = i64, Path, description = "Sentiment log id")),
    request_body = SentimentLogPatch,
    responses(
        (status = 200, description = "Updated sentiment log", body = SentimentLog),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "Sentiment log not found", body = ErrorResponse),
    )
)]
pub async fn update_sentiment_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<SentimentLogPatch>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(patch) = payload?;
    Ok(Json(state.store.sentiment_logs().update(id, patch).await?))
}

/// `DELETE /sentiment-logs/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the log does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/sentiment-logs/{id}",
    tag = "Sentiment",
    summary = "Delete a sentiment log",
    params(("id" = i64, Path, description = "Sentiment log id")),
    responses(
        (status = 204, description = "Sentiment log deleted"),
        (status = 404, description = "Sentiment log not found", body = ErrorResponse),
    )
)]
pub async fn delete_sentiment_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    state.store.sentiment_logs().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sentiment log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sentiment-logs",
            post(create_sentiment_log).get(list_sentiment_logs),
        )
        .route(
            "/sentiment-logs/{id}",
            get(get_sentiment_log)
                .patch(update_sentiment_log)
                .delete(delete_sentiment_log),
        )
}
