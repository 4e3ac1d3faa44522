//! Interaction handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{DeleteParams, Page, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{Interaction, InteractionFilter, InteractionPatch, NewInteraction};
use crate::error::{CrmError, ErrorResponse};

/// `POST /interactions`: Log a client touchpoint.
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input or a missing client.
#[utoipa::path(
    post,
    path = "/api/v1/interactions",
    tag = "Interactions",
    summary = "Create an interaction",
    request_body = NewInteraction,
    responses(
        (status = 201, description = "Interaction created", body = Interaction),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 422, description = "Client not found", body = ErrorResponse),
    )
)]
pub async fn create_interaction(
    State(state): State<AppState>,
    payload: Result<Json<NewInteraction>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(new) = payload?;
    let interaction = state.store.interactions().create(new).await?;
    Ok((StatusCode::CREATED, Json(interaction)))
}

/// `GET /interactions`: List interactions.
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/interactions",
    tag = "Interactions",
    summary = "List interactions",
    description = "Filter by client, type, or the external `vector_id`.",
    params(InteractionFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated interaction list", body = Page<Interaction>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_interactions(
    State(state): State<AppState>,
    filter: Result<Query<InteractionFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params
        .collect(state.store.interactions().list(&filter))
        .await?;
    Ok(Json(page))
}

/// `GET /interactions/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the interaction does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/interactions/{id}",
    tag = "Interactions",
    summary = "Get an interaction",
    params(("id" = i64, Path, description = "Interaction id")),
    responses(
        (status = 200, description = "Interaction", body = Interaction),
        (status = 404, description = "Interaction not found", body = ErrorResponse),
    )
)]
pub async fn get_interaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.interactions().get(id).await?))
}

/// `PATCH /interactions/{id}`
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input or a missing interaction.
#[utoipa::path(
    patch,
    path = "/api/v1/interactions/{id}",
    tag = "Interactions",
    summary = "Update an interaction",
    params(("id" = i64, Path, description = "Interaction id")),
    request_body = InteractionPatch,
    responses(
        (status = 200, description = "Updated interaction", body = Interaction),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "Interaction not found", body = ErrorResponse),
    )
)]
pub async fn update_interaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<InteractionPatch>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(patch) = payload?;
    Ok(Json(state.store.interactions().update(id, patch).await?))
}

/// `DELETE /interactions/{id}`
///
/// # Errors
///
/// Returns [`CrmError::Conflict`] while sentiment logs exist and `cascade`
/// is not set.
#[utoipa::path(
    delete,
    path = "/api/v1/interactions/{id}",
    tag = "Interactions",
    summary = "Delete an interaction",
    description = "Refuses while sentiment logs exist unless `cascade=true`.",
    params(("id" = i64, Path, description = "Interaction id"), DeleteParams),
    responses(
        (status = 204, description = "Interaction deleted"),
        (status = 404, description = "Interaction not found", body = ErrorResponse),
        (status = 409, description = "Dependents exist", body = ErrorResponse),
    )
)]
pub async fn delete_interaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(params) = params?;
    state.store.interactions().delete(id, params.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Interaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/interactions",
            post(create_interaction).get(list_interactions),
        )
        .route(
            "/interactions/{id}",
            get(get_interaction)
                .patch(update_interaction)
                .delete(delete_interaction),
        )
}
