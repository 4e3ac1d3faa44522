//! Portfolio handlers.
//!
//! Account numbers leave the service masked to their last four characters.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{DeleteParams, Page, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{NewPortfolio, Portfolio, PortfolioFilter, PortfolioHoldings, PortfolioPatch};
use crate::error::{CrmError, ErrorResponse};

/// `POST /portfolios`: Open a portfolio for a client.
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input, a missing client, or a taken
/// account number.
#[utoipa::path(
    post,
    path = "/api/v1/portfolios",
    tag = "Portfolios",
    summary = "Create a portfolio",
    request_body = NewPortfolio,
    responses(
        (status = 201, description = "Portfolio created", body = Portfolio),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 409, description = "Account number already in use", body = ErrorResponse),
        (status = 422, description = "Client not found", body = ErrorResponse),
    )
)]
pub async fn create_portfolio(
    State(state): State<AppState>,
    payload: Result<Json<NewPortfolio>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(new) = payload?;
    let portfolio = state.store.portfolios().create(new).await?;
    Ok((StatusCode::CREATED, Json(portfolio.masked())))
}

/// `GET /portfolios`: List portfolios.
///
/// # Errors
///
/// Returns [`CrmError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/portfolios",
    tag = "Portfolios",
    summary = "List portfolios",
    params(PortfolioFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated portfolio list", body = Page<Portfolio>),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
    )
)]
pub async fn list_portfolios(
    State(state): State<AppState>,
    filter: Result<Query<PortfolioFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let page = params.collect(state.store.portfolios().list(&filter)).await?;
    Ok(Json(page.map(Portfolio::masked)))
}

/// `GET /portfolios/{id}`
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the portfolio does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/portfolios/{id}",
    tag = "Portfolios",
    summary = "Get a portfolio",
    params(("id" = i64, Path, description = "Portfolio id")),
    responses(
        (status = 200, description = "Portfolio", body = Portfolio),
        (status = 404, description = "Portfolio not found", body = ErrorResponse),
    )
)]
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    let portfolio = state.store.portfolios().get(id).await?;
    Ok(Json(portfolio.masked()))
}

/// `PATCH /portfolios/{id}`
///
/// # Errors
///
/// Returns [`CrmError`] on invalid input, a missing portfolio, or a taken
/// account number.
#[utoipa::path(
    patch,
    path = "/api/v1/portfolios/{id}",
    tag = "Portfolios",
    summary = "Update a portfolio",
    params(("id" = i64, Path, description = "Portfolio id")),
    request_body = PortfolioPatch,
    responses(
        (status = 200, description = "Updated portfolio", body = Portfolio),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "Portfolio not found", body = ErrorResponse),
        (status = 409, description = "Account number already in use", body = ErrorResponse),
    )
)]
pub async fn update_portfolio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<PortfolioPatch>, JsonRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Json(patch) = payload?;
    let portfolio = state.store.portfolios().update(id, patch).await?;
    Ok(Json(portfolio.masked()))
}

/// `DELETE /portfolios/{id}`
///
/// # Errors
///
/// Returns [`CrmError::Conflict`] while positions exist and `cascade` is
/// not set.
#[utoipa::path(
    delete,
    path = "/api/v1/portfolios/{id}",
    tag = "Portfolios",
    summary = "Delete a portfolio",
    description = "Refuses while positions exist unless `cascade=true`.",
    params(("id" = i64, Path, description = "Portfolio id"), DeleteParams),
    responses(
        (status = 204, description = "Portfolio deleted"),
        (status = 404, description = "Portfolio not found", body = ErrorResponse),
        (status = 409, description = "Dependents exist", body = ErrorResponse),
    )
)]
pub async fn delete_portfolio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<impl IntoResponse, CrmError> {
    let Query(params) = params?;
    state.store.portfolios().delete(id, params.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /portfolios/{id}/holdings`: Portfolio with its positions.
///
/// # Errors
///
/// Returns [`CrmError::NotFound`] if the portfolio does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/portfolios/{id}/holdings",
    tag = "Portfolios",
    summary = "Get portfolio holdings",
    params(("id" = i64, Path, description = "Portfolio id")),
    responses(
        (status = 200, description = "Portfolio and positions", body = PortfolioHoldings),
        (status = 404, description = "Portfolio not found", body = ErrorResponse),
    )
)]
pub async fn portfolio_holdings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CrmError> {
    let holdings = state.store.reports().portfolio_holdings(id).await?;
    Ok(Json(holdings.masked()))
}

/// Portfolio routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/portfolios", post(create_portfolio).get(list_portfolios))
        .route(
            "/portfolios/{id}",
            get(get_portfolio)
                .patch(update_portfolio)
                .delete(delete_portfolio),
        )
        .route("/portfolios/{id}/holdings", get(portfolio_holdings))
}
