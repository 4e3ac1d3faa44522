//! Client handlers: CRUD, soft-delete toggles, profile and history reads.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{DeleteParams, Page, PaginationParams, ProfileParams};
use crate::app_state::AppState;
use crate::domain::{Client, ClientFilter, ClientPatch, ClientProfile, InteractionWithSentiment, NewClient};
use crate::error::{CrmError, ErrorResponse};

/// `POST /clients`: Create a client.
///
/// # Errors
///
/// Returns [`CrmError`] for blank names or a missing household/manager.
#[utoipa::path(
    post,
    path = "/api/v1/clients",
    tag = "Clients",
    summary = "Create a client",
    request_body = NewClient,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 422, description = "Household or manager not found", body = ErrorResponse),
    )
)]
pub async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<NewClient>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(new) = payload?;
    let client = state.store.clients().create(new).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// `GET /clients`: List clients.
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    tag = "Clients",
    summary = "List clients",
    description = "Filter by household, manager, or active flag.",
    params(ClientFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated client list", body = Page<Client>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_clients(
    State(state): State<AppState>,
    filter: Result<Query<ClientFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params.collect(state.store.clients().list(&filter)).await?;
    Ok(Json(page))
}

/// `GET /clients/{id}`: Get one client.
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the client does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    tag = "Clients",
    summary = "Get a client",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client", body = Client),
        (status = 404, description = "Client not found", body = ErrorResponse),
    )
)]
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.clients().get(id).await?))
}

/// `PATCH /clients/{id}`: Update a client.
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input, a missing client, or a missing
/// household/manager.
#[utoipa::path(
    patch,
    path = "/api/v1/clients/{id}",
    tag = "Clients",
    summary = "Update a client",
    description = "Explicit `null` clears `household_id`, `manager_id`, `risk_score` or `investment_goal`; absent keys are left unchanged.",
    params(("id" = i64, Path, description = "Client id")),
    request_body = ClientPatch,
    responses(
        (status = 200, description = "Updated client", body = Client),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Household or manager not found", body = ErrorResponse),
    )
)]
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ClientPatch>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(patch) = payload?;
    Ok(Json(state.store.clients().update(id, patch).await?))
}

/// `DELETE /clients/{id}`: Hard-delete a client.
///
/// # Errors
///
/// Returns [`CrmError::Conflict`] while dependents exist and `cascade` is
/// not set, or whenever audit entries reference the client.
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    tag = "Clients",
    summary = "Delete a client",
    description = "Prefer `POST /clients/{id}/deactivate`. Refuses while goals, portfolios, interactions or action items exist unless `cascade=true`; audit entries always block.",
    params(("id" = i64, Path, description = "Client id"), DeleteParams),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 409, description = "Dependents exist", body = ErrorResponse),
    )
)]
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(params) = params?;
    state.store.clients().delete(id, params.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /clients/{id}/deactivate`: Soft-delete a client.
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the client does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/clients/{id}/deactivate",
    tag = "Clients",
    summary = "Deactivate a client",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 200, description = "Deactivated client", body = Client),
        (status = 404, description = "Client not found", body = ErrorResponse),
    )
)]
pub async fn deactivate_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.clients().deactivate(id).await?))
}

/// `POST /clients/{id}/reactivate`: Undo a soft-delete.
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the client does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/clients/{id}/reactivate",
    tag = "Clients",
    summary = "Reactivate a client",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 200, description = "Reactivated client", body = Client),
        (status = 404, description = "Client not found", body = ErrorResponse),
    )
)]
pub async fn reactivate_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.clients().reactivate(id).await?))
}

/// `GET /clients/{id}/profile`: Full client profile.
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the client does not exist and
/// [`CrmError::ForeignKey`] for an unknown `viewer_id`.
#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}/profile",
    tag = "Clients",
    summary = "Get a client profile",
    description = "Client with household, manager, goals, portfolios with positions, interactions with sentiment, and action items. Account numbers are masked. Each call appends a `view` audit entry.",
    params(("id" = i64, Path, description = "Client id"), ProfileParams),
    responses(
        (status = 200, description = "Client profile", body = ClientProfile),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Viewer not found", body = ErrorResponse),
    )
)]
pub async fn client_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    params: Result<Query<ProfileParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(params) = params?;
    let profile = state
        .store
        .reports()
        .view_client_profile(id, params.viewer_id)
        .await?;
    Ok(Json(profile.masked()))
}

/// `GET /clients/{id}/interactions`: Interaction history with sentiment.
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the client does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}/interactions",
    tag = "Clients",
    summary = "Get a client's interaction history",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 200, description = "Interactions with sentiment logs", body = Vec<InteractionWithSentiment>),
        (status = 404, description = "Client not found", body = ErrorResponse),
    )
)]
pub async fn client_interactions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.reports().interaction_history(id).await?))
}

/// Client routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", post(create_client).get(list_clients))
        .route(
            "/clients/{id}",
            get(get_client).patch(update_client).delete(delete_client),
        )
        .route("/clients/{id}/deactivate", post(deactivate_client))
        .route("/clients/{id}/reactivate", post(reactivate_client))
        .route("/clients/{id}/profile", get(client_profile))
        .route("/clients/{id}/interactions", get(client_interactions))
}
