//! REST endpoint handlers organized by resource.

pub mod action_items;
pub mod audit_logs;
pub mod clients;
pub mod goals;
pub mod households;
pub mod interactions;
pub mod managers;
pub mod portfolios;
pub mod positions;
pub mod sentiment_logs;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(managers::routes())
        .merge(households::routes())
        .merge(clients::routes())
        .merge(goals::routes())
        .merge(portfolios::routes())
        .merge(positions::routes())
        .merge(interactions::routes())
        .merge(sentiment_logs::routes())
        .merge(audit_logs::routes())
        .merge(action_items::routes())
}
