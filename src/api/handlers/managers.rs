//! Manager CRUD handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateManagerRequest, DeleteParams, ManagerDto, Page, PaginationParams,
    UpdateManagerRequest,
};
use crate::app_state::AppState;
use crate::domain::ManagerFilter;
use crate::error::{CrmError, ErrorResponse};

/// `POST /managers`: Register a manager.
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input or a taken email.
#[utoipa::path(
    post,
    path = "/api/v1/managers",
    tag = "Managers",
    summary = "Create a manager",
    description = "Hashes the supplied password and stores the manager. The email is stored lower-cased and must be unique.",
    request_body = CreateManagerRequest,
    responses(
        (status = 201, description = "Manager created", body = ManagerDto),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    )
)]
pub async fn create_manager(
    State(state): State<AppState>,
    payload: Result<Json<CreateManagerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(req) = payload?;
    let manager = state
        .store
        .managers()
        .create(req.into_new_manager()?)
        .await?;
    Ok((StatusCode::CREATED, Json(ManagerDto::from(manager))))
}

/// `GET /managers`: List managers.
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/managers",
    tag = "Managers",
    summary = "List managers",
    params(ManagerFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated manager list", body = Page<ManagerDto>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_managers(
    State(state): State<AppState>,
    filter: Result<Query<ManagerFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params.collect(state.store.managers().list(&filter)).await?;
    Ok(Json(page.map(ManagerDto::from)))
}

/// `GET /managers/{id}`: Get one manager.
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the manager does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/managers/{id}",
    tag = "Managers",
    summary = "Get a manager",
    params(("id" = i64, Path, description = "Manager id")),
    responses(
        (status = 200, description = "Manager", body = ManagerDto),
        (status = 404, description = "Manager not found", body = ErrorResponse),
    )
)]
pub async fn get_manager(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    let manager = state.store.managers().get(id).await?;
    Ok(Json(ManagerDto::from(manager)))
}

/// `PATCH /managers/{id}`: Update email, password or role.
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input, a taken email, or a missing
/// manager.
#[utoipa::path(
    patch,
    path = "/api/v1/managers/{id}",
    tag = "Managers",
    summary = "Update a manager",
    params(("id" = i64, Path, description = "Manager id")),
    request_body = UpdateManagerRequest,
    responses(
        (status = 200, description = "Updated manager", body = ManagerDto),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "Manager not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    )
)]
pub async fn update_manager(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateManagerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(req) = payload?;
    let manager = state.store.managers().update(id, req.into_patch()?).await?;
    Ok(Json(ManagerDto::from(manager)))
}

/// `DELETE /managers/{id}`: Remove a manager.
///
/// # Errors
///
/// Returns [`CrmError::Conflict`] while clients or audit entries depend on
/// the manager.
#[utoipa::path(
    delete,
    path = "/api/v1/managers/{id}",
    tag = "Managers",
    summary = "Delete a manager",
    description = "Refuses while clients exist unless `cascade=true`. Audit entries always block.",
    params(("id" = i64, Path, description = "Manager id"), DeleteParams),
    responses(
        (status = 204, description = "Manager deleted"),
        (status = 404, description = "Manager not found", body = ErrorResponse),
        (status = 409, description = "Dependents exist", body = ErrorResponse),
    )
)]
pub async fn delete_manager(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(params) = params?;
    state.store.managers().delete(id, params.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Manager routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/managers", post(create_manager).get(list_managers))
        .route(
            "/managers/{id}",
            get(get_manager).patch(update_manager).delete(delete_manager),
        )
}
