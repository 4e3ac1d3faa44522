//! HTTP tests driving the full router in-process.

#![allow(clippy::panic)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use wealthai_crm::api;
use wealthai_crm::app_state::AppState;
use wealthai_crm::persistence::Store;

async fn app() -> Router {
    let Ok(store) = Store::in_memory().await else {
        panic!("in-memory store should open");
    };
    api::build_router().with_state(AppState::new(store))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("request should build");
    };
    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("router should respond");
    };
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body should be readable");
    };
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    let Ok(value) = serde_json::from_slice(&bytes) else {
        panic!("body should be JSON: {bytes:?}");
    };
    (status, value)
}

async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, value) = send(app, Method::POST, uri, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri}: {value}");
    value
}

#[tokio::test]
async fn root_reports_banner() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "WealthAI API is online");
}

#[tokio::test]
async fn health_reports_connected_database() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "database": "connected"}));
}

#[tokio::test]
async fn create_then_list_goals_for_client() {
    let app = app().await;
    let household = create(&app, "/api/v1/households", json!({"name": "Smith Family"})).await;
    let client = create(
        &app,
        "/api/v1/clients",
        json!({"first_name": "Jane", "last_name": "Smith", "household_id": household["id"]}),
    )
    .await;
    create(
        &app,
        "/api/v1/goals",
        json!({"client_id": client["id"], "target_amount": "500000.00", "priority": 3}),
    )
    .await;

    let uri = format!("/api/v1/goals?client_id={}", client["id"]);
    let (status, page) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pagination"]["total"], 1);
    let Some([goal]) = page["data"].as_array().map(Vec::as_slice) else {
        panic!("expected one goal: {page}");
    };
    assert_eq!(goal["target_amount"], "500000.00");
    assert_eq!(goal["priority"], 3);
}

#[tokio::test]
async fn missing_resource_is_404() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/clients/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2001);
}

#[tokio::test]
async fn unknown_parent_is_422() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/goals",
        Some(json!({"client_id": 7, "target_amount": "10.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 1002);
}

#[tokio::test]
async fn unknown_position_type_is_400() {
    let app = app().await;
    let client = create(
        &app,
        "/api/v1/clients",
        json!({"first_name": "Jane", "last_name": "Smith"}),
    )
    .await;
    let portfolio = create(
        &app,
        "/api/v1/portfolios",
        json!({"client_id": client["id"], "account_number": "ACC-1234"}),
    )
    .await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/positions",
        Some(json!({
            "portfolio_id": portfolio["id"],
            "ticker": "TLT",
            "quantity": "1",
            "cost_basis": "90.00",
            "position_type": "bond"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn audit_entries_are_append_only() {
    let app = app().await;
    let entry = create(&app, "/api/v1/audit-logs", json!({"action": "export"})).await;
    let uri = format!("/api/v1/audit-logs/{}", entry["id"]);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"action": "x"}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], 2004);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn account_numbers_are_masked() {
    let app = app().await;
    let client = create(
        &app,
        "/api/v1/clients",
        json!({"first_name": "Jane", "last_name": "Smith"}),
    )
    .await;
    let portfolio = create(
        &app,
        "/api/v1/portfolios",
        json!({"client_id": client["id"], "account_number": "ACC-00987654"}),
    )
    .await;
    assert_eq!(portfolio["account_number"], "********7654");

    let uri = format!("/api/v1/clients/{}/profile", client["id"]);
    let (status, profile) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        profile.pointer("/portfolios/0/portfolio/account_number"),
        Some(&json!("********7654"))
    );
}

#[tokio::test]
async fn delete_with_dependents_needs_cascade() {
    let app = app().await;
    let client = create(
        &app,
        "/api/v1/clients",
        json!({"first_name": "Jane", "last_name": "Smith"}),
    )
    .await;
    create(
        &app,
        "/api/v1/portfolios",
        json!({"client_id": client["id"], "account_number": "ACC-5555"}),
    )
    .await;
    let uri = format!("/api/v1/clients/{}", client["id"]);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], 2002);

    let (status, _) = send(&app, Method::DELETE, &format!("{uri}?cascade=true"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn manager_responses_omit_password_hash() {
    let app = app().await;
    let manager = create(
        &app,
        "/api/v1/managers",
        json!({"email": "Pat@Example.com", "password": "hunter22"}),
    )
    .await;
    assert_eq!(manager["email"], "pat@example.com");
    assert_eq!(manager["role"], "Junior Advisor");
    assert!(manager.get("password_hash").is_none());
    assert!(manager.get("password").is_none());
}

#[tokio::test]
async fn malformed_body_is_400() {
    let app = app().await;
    let Ok(request) = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/households")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
    else {
        panic!("request should build");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router should respond");
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_query_string_is_structured_400() {
    let app = app().await;
    let client = create(
        &app,
        "/api/v1/clients",
        json!({"first_name": "Jane", "last_name": "Smith"}),
    )
    .await;
    let client_uri = format!("/api/v1/clients/{}", client["id"]);

    for (method, uri) in [
        (Method::GET, "/api/v1/goals?client_id=abc".to_string()),
        (Method::GET, "/api/v1/clients?per_page=lots".to_string()),
        (Method::DELETE, format!("{client_uri}?cascade=maybe")),
        (Method::GET, format!("{client_uri}/profile?viewer_id=me")),
    ] {
        let (status, body) = send(&app, method.clone(), &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body["error"]["code"], 1001, "{method} {uri}: {body}");
        assert_eq!(body["error"]["details"], "field: query");
    }

    let (status, _) = send(&app, Method::GET, &client_uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn null_on_required_patch_field_is_400() {
    let app = app().await;
    let client = create(
        &app,
        "/api/v1/clients",
        json!({"first_name": "Jane", "last_name": "Smith"}),
    )
    .await;
    let goal = create(
        &app,
        "/api/v1/goals",
        json!({"client_id": client["id"], "target_amount": "1000.00"}),
    )
    .await;
    let uri = format!("/api/v1/goals/{}", goal["id"]);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"target_amount": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);
    assert!(
        body["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("target_amount")),
        "{body}"
    );

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"description": null}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target_amount"], "1000.00");
    assert_eq!(body["description"], Value::Null);
}
