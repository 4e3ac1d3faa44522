//! OpenAPI document and its HTTP surface.

use axum::Router;
use utoipa::OpenApi;

use crate::api::handlers::{
    action_items, audit_logs, clients, goals, households, interactions, managers, portfolios,
    positions, sentiment_logs, system,
};
use crate::app_state::AppState;

/// Path of the generated OpenAPI JSON document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Aggregated OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "WealthAI CRM API",
        description = "Relational records for a wealth-management CRM: managers, households, clients, goals, portfolios, positions, interactions, sentiment, audit trail and action items."
    ),
    paths(
        system::root_handler,
        system::health_handler,
        managers::create_manager,
        managers::list_managers,
        managers::get_manager,
        managers::update_manager,
        managers::delete_manager,
        households::create_household,
        households::list_households,
        households::get_household,
        households::update_household,
        households::delete_household,
        clients::create_client,
        clients::list_clients,
        clients::get_client,
        clients::update_client,
        clients::delete_client,
        clients::deactivate_client,
        clients::reactivate_client,
        clients::client_profile,
        clients::client_interactions,
        goals::create_goal,
        goals::list_goals,
        goals::get_goal,
        goals::update_goal,
        goals::delete_goal,
        portfolios::create_portfolio,
        portfolios::list_portfolios,
        portfolios::get_portfolio,
        portfolios::update_portfolio,
        portfolios::delete_portfolio,
        portfolios::portfolio_holdings,
        positions::create_position,
        positions::list_positions,
        positions::get_position,
        positions::update_position,
        positions::delete_position,
        interactions::create_interaction,
        interactions::list_interactions,
        interactions::get_interaction,
        interactions::update_interaction,
        interactions::delete_interaction,
        sentiment_logs::create_sentiment_log,
        sentiment_logs::list_sentiment_logs,
        sentiment_logs::get_sentiment_log,
        sentiment_logs::update_sentiment_log,
        sentiment_logs::delete_sentiment_log,
        audit_logs::create_audit_log,
        audit_logs::list_audit_logs,
        audit_logs::get_audit_log,
        audit_logs::update_audit_log,
        audit_logs::delete_audit_log,
        action_items::create_action_item,
        action_items::list_action_items,
        action_items::get_action_item,
        action_items::update_action_item,
        action_items::delete_action_item,
    ),
    tags(
        (name = "System", description = "Banner and health"),
        (name = "Managers", description = "Advisor accounts"),
        (name = "Households", description = "Client groupings"),
        (name = "Clients", description = "Clients, profiles and history"),
        (name = "Goals", description = "Financial goals"),
        (name = "Portfolios", description = "Investment accounts"),
        (name = "Positions", description = "Holdings within portfolios"),
        (name = "Interactions", description = "Client touchpoints"),
        (name = "Sentiment", description = "Sentiment readings per interaction"),
        (name = "Audit", description = "Append-only audit trail"),
        (name = "Action Items", description = "Proposed follow-ups"),
    )
)]
pub struct ApiDoc;

/// Routes serving the OpenAPI document and, with the `swagger-ui`
/// feature, the interactive UI at `/swagger-ui`.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
}

/// Routes serving the OpenAPI document.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/v1/managers",
            "/api/v1/households/{id}",
            "/api/v1/clients/{id}/profile",
            "/api/v1/portfolios/{id}/holdings",
            "/api/v1/sentiment-logs",
            "/api/v1/audit-logs/{id}",
            "/api/v1/action-items",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn error_schema_is_registered() {
        let doc = ApiDoc::openapi();
        let Some(components) = doc.components else {
            panic!("document has no components");
        };
        assert!(components.schemas.contains_key("ErrorResponse"));
    }
}
