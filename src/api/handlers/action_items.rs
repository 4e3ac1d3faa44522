//! Action item handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{Page, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{ActionItem, ActionItemFilter, ActionItemPatch, NewActionItem};
use crate::error::{CrmError, ErrorResponse};

/// `POST /action-items`: Propose a follow-up for a client.
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input or a missing client.
#[utoipa::path(
    post,
    path = "/api/v1/action-items",
    tag = "Action Items",
    summary = "Create an action item",
    description = "`status` defaults to `pending`.",
    request_body = NewActionItem,
    responses(
        (status = 201, description = "Action item created", body = ActionItem),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 422, description = "Client not found", body = ErrorResponse),
    )
)]
pub async fn create_action_item(
    State(state): State<AppState>,
    payload: Result<Json<NewActionItem>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(new) = payload?;
    let item = state.store.action_items().create(new).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /action-items`
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/action-items",
    tag = "Action Items",
    summary = "List action items",
    params(ActionItemFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated action item list", body = Page<ActionItem>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_action_items(
    State(state): State<AppState>,
    filter: Result<Query<ActionItemFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params
        .collect(state.store.action_items().list(&filter))
        .await?;
    Ok(Json(page))
}

/// `GET /action-items/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the item does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/action-items/{id}",
    tag = "Action Items",
    summary = "Get an action item",
    params(("id" = i64, Path, description = "Action item id")),
    responses(
        (status = 200, description = "Action item", body = ActionItem),
        (status = 404, description = "Action item not found", body = ErrorResponse),
    )
)]
pub async fn get_action_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.action_items().get(id).await?))
}

/// `PATCH /action-items/{id}`: Approve, reject, or edit the rationale.
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the item does not exist.
#[utoipa::path(
    patch,
    path = "/api/v1/action-items/{id}",
    tag = "Action Items",
    summary = "Update an action item",
    params(("id" = i64, Path, description = "Action item id")),
    request_body = ActionItemPatch,
    responses(
        (status = 200, description = "Updated action item", body = ActionItem),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 404, description = "Action item not found", body = ErrorResponse),
    )
)]
pub async fn update_action_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ActionItemPatch>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(patch) = payload?;
    Ok(Json(state.store.action_items().update(id, patch).await?))
}

/// `DELETE /action-items/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the item does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/action-items/{id}",
    tag = "Action Items",
    summary = "Delete an action item",
    params(("id" = i64, Path, description = "Action item id")),
    responses(
        (status = 204, description = "Action item deleted"),
        (status = 404, description = "Action item not found", body = ErrorResponse),
    )
)]
pub async fn delete_action_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    state.store.action_items().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Action item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/action-items",
            post(create_action_item).get(list_action_items),
        )
        .route(
            "/action-items/{id}",
            get(get_action_item)
                .patch(update_action_item)
                .delete(delete_action_item),
        )
}
