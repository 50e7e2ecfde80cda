//! Router-level tests: response envelope wire format, error status
//! mapping and the caller-identity header, driven through the assembled
//! router one request at a time.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use rankpay_server::app_state::AppState;
use rankpay_server::routes;

fn app(pool: PgPool) -> Router {
    Router::new()
        .merge(routes::reward_routes())
        .merge(routes::assignment_routes())
        .merge(routes::analytics_routes())
        .merge(routes::settings_routes())
        .with_state(AppState::new(pool))
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[sqlx::test]
async fn created_rewards_serialize_with_a_flattened_value(pool: PgPool) {
    let app = app(pool);

    let response = app
        .oneshot(post_json(
            "/api/rewards",
            json!({
                "name": "Champion",
                "rewardType": "bonus",
                "unit": "amount",
                "value": 500.0,
                "rank": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["error"], Value::Null);
    let data = &body["data"];
    assert_eq!(data["name"], json!("Champion"));
    assert_eq!(data["rewardType"], json!("bonus"));
    assert_eq!(data["unit"], json!("amount"));
    assert_eq!(data["value"], json!(500.0));
    assert_eq!(data["rank"], json!(1));
    assert_eq!(data["isActive"], json!(true));
    assert_eq!(data["currentRedemptions"], json!(0));
}

#[sqlx::test]
async fn invalid_create_payloads_are_rejected(pool: PgPool) {
    let app = app(pool);

    let response = app
        .oneshot(post_json(
            "/api/rewards",
            json!({
                "name": "",
                "rewardType": "bonus",
                "unit": "amount",
                "value": 500.0,
                "rank": 0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
}

#[sqlx::test]
async fn assignment_requires_the_caller_header(pool: PgPool) {
    let app = app(pool);

    let response = app
        .oneshot(post_json(
            "/api/rewards/assign",
            json!({
                "userId": Uuid::new_v4(),
                "rewardId": Uuid::new_v4()
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Missing X-User-Id header"));
}

#[sqlx::test]
async fn missing_resources_report_a_not_found_envelope(pool: PgPool) {
    let app = app(pool);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/rewards/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Reward not found"));
}
