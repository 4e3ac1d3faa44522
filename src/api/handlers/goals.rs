//! Financial goal handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{Page, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{Goal, GoalFilter, GoalPatch, NewGoal};
use crate::error::{CrmError, ErrorResponse};

/// `POST /goals`: Create a goal for a client.
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input or a missing client.
#[utoipa::path(
    post,
    path = "/api/v1/goals",
    tag = "Goals",
    summary = "Create a goal",
    description = "`target_amount` is a decimal string with at most two fractional digits. `priority` defaults to 1.",
    request_body = NewGoal,
    responses(
        (status = 201, description = "Goal created", body = Goal),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 422, description = "Client not found", body = ErrorResponse),
    )
)]
pub async fn create_goal(
    State(state): State<AppState>,
    payload: Result<Json<NewGoal>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(new) = payload?;
    let goal = state.store.goals().create(new).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

/// `GET /goals`: List goals.
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/goals",
    tag = "Goals",
    summary = "List goals",
    params(GoalFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated goal list", body = Page<Goal>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_goals(
    State(state): State<AppState>,
    filter: Result<Query<GoalFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params.collect(state.store.goals().list(&filter)).await?;
    Ok(Json(page))
}

/// `GET /goals/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the goal does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/goals/{id}",
    tag = "Goals",
    summary = "Get a goal",
    params(("id" = i64, Path, description = "Goal id")),
    responses(
        (status = 200, description = "Goal", body = Goal),
        (status = 404, description = "Goal not found", body = ErrorResponse),
    )
)]
pub async fn get_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.goals().get(id).await?))
}

/// `PATCH /goals/{id}`
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input or a missing goal.
#[utoipa::path(
    patch,
    path = "/api/v1/goals/{id}",
    tag = "Goals",
    summary = "Update a goal",
    params(("id" = i64, Path, description = "Goal id")),
    request_body = GoalPatch,
    responses(
        (status = 200, description = "Updated goal", body = Goal),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "Goal not found", body = ErrorResponse),
    )
)]
pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<GoalPatch>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(patch) = payload?;
    Ok(Json(state.store.goals().update(id, patch).await?))
}

/// `DELETE /goals/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the goal does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/goals/{id}",
    tag = "Goals",
    summary = "Delete a goal",
    params(("id" = i64, Path, description = "Goal id")),
    responses(
        (status = 204, description = "Goal deleted"),
        (status = 404, description = "Goal not found", body = ErrorResponse),
    )
)]
pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    state.store.goals().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Goal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/goals", post(create_goal).get(list_goals))
        .route(
            "/goals/{id}",
            get(get_goal).patch(update_goal).delete(delete_goal),
        )
}
