//! Household CRUD handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{DeleteParams, Page, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{Household, HouseholdFilter, HouseholdPatch, NewHousehold};
use crate::error::{CrmError, ErrorResponse};

/// `POST /households`: Create a household.
///
/// # Errors
///
/// Returns [`CrmError::Validation`] for a blank name.
#[utoipa::path(
    post,
    path = "/api/v1/households",
    tag = "Households",
    summary = "Create a household",
    request_body = NewHousehold,
    responses(
        (status = 201, description = "Household created", body = Household),
        (status = 400, description = "Invalid name", body = ErrorResponse),
    )
)]
pub async fn create_household(
    State(state): State<AppState>,
    payload: Result<Json<NewHousehold>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(new) = payload?;
    let household = state.store.households().create(new).await?;
    Ok((StatusCode::CREATED, Json(household)))
}

/// `GET /households`: List households.
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/households",
    tag = "Households",
    summary = "List households",
    params(HouseholdFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated household list", body = Page<Household>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_households(
    State(state): State<AppState>,
    filter: Result<Query<HouseholdFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params.collect(state.store.households().list(&filter)).await?;
    Ok(Json(page))
}

/// `GET /households/{id}`: Get one household.
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the household does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/households/{id}",
    tag = "Households",
    summary = "Get a household",
    params(("id" = i64, Path, description = "Household id")),
    responses(
        (status = 200, description = "Household", body = Household),
        (status = 404, description = "Household not found", body = ErrorResponse),
    )
)]
pub async fn get_household(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    Ok(Json(state.store.households().get(id).await?))
}

/// `PATCH /households/{id}`: Rename a household.
///
/// # Errors
///
/// Returns [`CrmError`] for a blank name or a missing household.
#[utoipa::path(
    patch,
    path = "/api/v1/households/{id}",
    tag = "Households",
    summary = "Update a household",
    params(("id" = i64, Path, description = "Household id")),
    request_body = HouseholdPatch,
    responses(
        (status = 200, description = "Updated household", body = Household),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 404, description = "Household not found", body = ErrorResponse),
    )
)]
pub async fn update_household(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<HouseholdPatch>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(patch) = payload?;
    Ok(Json(state.store.households().update(id, patch).await?))
}

/// `DELETE /households/{id}`: Remove a household.
///
/// # Errors
///
/// Returns [`CrmError::Conflict`] while member clients exist and
/// `cascade` is not set.
#[utoipa::path(
    delete,
    path = "/api/v1/households/{id}",
    tag = "Households",
    summary = "Delete a household",
    description = "Refuses while member clients exist unless `cascade=true`.",
    params(("id" = i64, Path, description = "Household id"), DeleteParams),
    responses(
        (status = 204, description = "Household deleted"),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 409, description = "Dependents exist", body = ErrorResponse),
    )
)]
pub async fn delete_household(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(params) = params?;
    state.store.households().delete(id, params.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Household routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/households", post(create_household).get(list_households))
        .route(
            "/households/{id}",
            get(get_household)
                .patch(update_household)
                .delete(delete_household),
        )
}
