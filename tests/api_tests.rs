mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::{get, put},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use stockroom_backend::config::Config;
use stockroom_backend::services::square::SquareService;
use stockroom_backend::services::users::{self, CreateUser};
use stockroom_backend::services::{auth, oauth_state};
use stockroom_backend::{AppState, handlers};

use crate::common::{MerchantSeed, seed_merchant, setup_test_db};

async fn test_state() -> AppState {
    let db = setup_test_db().await;
    let config = Config::default();

    let square = SquareService::new(
        config.square_client_id.clone(),
        config.square_client_secret.clone(),
        config.square_base_url.clone(),
    );

    AppState {
        db,
        square,
        config: Arc::new(config),
        oauth_states: oauth_state::new_state_store(),
    }
}

fn test_router(state: AppState) -> Router {
    Router::new()
        .route("/api/user", get(handlers::user::get_user))
        .route("/api/user/email", put(handlers::user::set_email))
        .with_state(state)
}

async fn seed_user(state: &AppState, user_id: &str) {
    let merchant = seed_merchant(&state.db, MerchantSeed::default()).await;

    users::create_user(
        &state.db,
        CreateUser {
            id: user_id.to_string(),
            merchant_id: merchant.id,
            provider_user_id: Some("PM-1".to_string()),
            role: "owner".to_string(),
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn api_rejects_requests_without_bearer_token() {
    let state = test_state().await;
    let app = test_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/user")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn get_user_returns_the_caller_profile() {
    let state = test_state().await;
    seed_user(&state, "user-1").await;

    let token = auth::issue_session_token(&state.config.jwt_signing_key, "user-1").unwrap();
    let app = test_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/user")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["id"], "user-1");
    assert_eq!(json["role"], "owner");
    assert!(json["email"].is_null());
}

#[tokio::test]
async fn set_email_updates_and_stamps_verification() {
    let state = test_state().await;
    seed_user(&state, "user-1").await;

    let token = auth::issue_session_token(&state.config.jwt_signing_key, "user-1").unwrap();
    let app = test_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/user/email")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email": "owner@example.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["email"], "owner@example.com");
}

#[tokio::test]
async fn set_email_rejects_invalid_addresses() {
    let state = test_state().await;
    seed_user(&state, "user-1").await;

    let token = auth::issue_session_token(&state.config.jwt_signing_key, "user-1").unwrap();
    let app = test_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/user/email")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email": "not-an-email"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let state = test_state().await;
    let app = test_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/user")
                .header(header::AUTHORIZATION, "Bearer not.a.real.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
