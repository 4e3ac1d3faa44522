//! Position handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{Page, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{NewPosition, Position, PositionFilter, PositionPatch};
use crate::error::{CrmError, ErrorResponse};

/// `POST /positions`: Record a holding in a portfolio.
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input or a missing portfolio.
#[utoipa::path(
    post,
    path = "/api/v1/positions",
    tag = "Positions",
    summary = "Create a position",
    description = "`quantity` allows four fractional digits and `cost_basis` two. The ticker is stored upper-cased.",
    request_body = NewPosition,
    responses(
        (status = 201, description = "Position created", body = Position),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 422, description = "Portfolio not found", body = ErrorResponse),
    )
)]
pub async fn create_position(
    State(state): State<AppState>,
    payload: Result<Json<NewPosition>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(new) = payload?;
    let position = state.store.positions().create(new).await?;
    Ok((StatusCode::CREATED, Json(position)))
}

/// `GET /positions`: List positions.
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/positions",
    tag = "Positions",
    summary = "List positions",
    params(PositionFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated position list", body = Page<Position>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_positions(
    State(state): State<AppState>,
    filter: Result<Query<PositionFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params.collect(state.store.positions().list(&filter)).await?;
    Ok(Json(page))
}

/// `GET /positions/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the position does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/positions/{id}",
    tag = "Positions",
    summary = "Get a position",
    params(("id" = i64, Path, description = "Position id")),
    responses(
        (status = 200, description = "Position", body = Position),
        (status = 404, description = "Position not found", body = ErrorResponse),
    )
)]
pub async fn get_position(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.positions().get(id).await?))
}

/// `PATCH /positions/{id}`
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input or a missing position.
#[utoipa::path(
    patch,
    path = "/api/v1/positions/{id}",
    tag = "Positions",
    summary = "Update a position",
    params(("id" = i64, Path, description = "Position id")),
    request_body = PositionPatch,
    responses(
        (status = 200, description = "Updated position", body = Position),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "Position not found", body = ErrorResponse),
    )
)]
pub async fn update_position(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<PositionPatch>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(patch) = payload?;
    Ok(Json(state.store.positions().update(id, patch).await?))
}

/// `DELETE /positions/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the position does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/positions/{id}",
    tag = "Positions",
    summary = "Delete a position",
    params(("id" = i64, Path, description = "Position id")),
    responses(
        (status = 204, description = "Position deleted"),
        (status = 404, description = "Position not found", body = ErrorResponse),
    )
)]
pub async fn delete_position(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    state.store.positions().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Position routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/positions", post(create_position).get(list_positions))
        .route(
            "/positions/{id}",
            get(get_position)
                .patch(update_position)
                .delete(delete_position),
        )
}
