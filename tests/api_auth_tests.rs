// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Procedures reject requests without a valid Firebase ID token
//! 2. Procedures accept a token from the Bearer header or the session cookie
//! 3. The sign-in callback manages the session cookie
//! 4. Scheduled functions only run for the scheduler service account

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

mod common;
use common::{
    body_json, call, create_test_app, expired_id_token, id_token, id_token_for, rpc_get,
    scheduler_token, send,
};

const SCHEDULER_ACCOUNT: &str = "studio-scheduler@test-project.iam.gserviceaccount.com";

fn settings_query(token: &str) -> Request<Body> {
    rpc_get("user.settings.get", &json!({"userId": "alice"}), token)
}

#[tokio::test]
async fn test_rpc_without_token() {
    let app = create_test_app();

    let response = send(
        &app,
        Request::builder()
            .uri("/rpc/user.settings.get?input=%7B%7D")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "unauthenticated"}));
}

#[tokio::test]
async fn test_rpc_with_garbage_token() {
    let app = create_test_app();
    call(&app, settings_query("not-a-jwt"), StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn test_rpc_with_expired_token() {
    let app = create_test_app();
    call(
        &app,
        settings_query(&expired_id_token("alice")),
        StatusCode::UNAUTHORIZED,
    )
    .await;
}

#[tokio::test]
async fn test_rpc_with_token_for_other_project() {
    let app = create_test_app();
    let token = id_token_for("alice", "alice@example.com", "someone-elses-project");
    call(&app, settings_query(&token), StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn test_rpc_with_bearer_token() {
    let app = create_test_app();
    let token = id_token("alice", "alice@example.com");

    let body = call(&app, settings_query(&token), StatusCode::OK).await;

    assert_eq!(body["userId"], "alice");
    assert_eq!(body["editor"]["buildFlags"], "--no-lint");
}

#[tokio::test]
async fn test_rpc_with_session_cookie() {
    let app = create_test_app();
    let token = id_token("alice", "alice@example.com");
    let input = urlencoding::encode(r#"{"userId":"alice"}"#).into_owned();

    let request = Request::builder()
        .uri(format!("/rpc/user.settings.get?input={input}"))
        .header(header::COOKIE, format!("studio_session={token}"))
        .body(Body::empty())
        .unwrap();

    call(&app, request, StatusCode::OK).await;
}

#[tokio::test]
async fn test_rpc_for_other_user_is_forbidden() {
    let app = create_test_app();
    let token = id_token("mallory", "mallory@example.com");

    let body = call(&app, settings_query(&token), StatusCode::FORBIDDEN).await;
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_health_is_public() {
    let app = create_test_app();

    let response = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_test_app();

    let response = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/rpc/project.create")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejects_foreign_origin() {
    let app = create_test_app();

    let response = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/rpc/project.create")
            .header(header::ORIGIN, "https://evil.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_callback_sets_session_cookie() {
    let app = create_test_app();
    let token = id_token("alice", "alice@example.com");

    let response = send(
        &app,
        Request::builder()
            .uri(format!("/auth/callback?idToken={token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://localhost:3000/"
    );
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with(&format!("studio_session={token}")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    // localhost site runs over plain http
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_callback_with_bad_token_goes_to_login() {
    let app = create_test_app();

    let response = send(
        &app,
        Request::builder()
            .uri("/auth/callback?idToken=forged")
            .header(header::COOKIE, "studio_session=stale")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://localhost:3000/login"
    );
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_callback_without_token_goes_to_login() {
    let app = create_test_app();

    let response = send(
        &app,
        Request::builder()
            .uri("/auth/callback")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://localhost:3000/login"
    );
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = create_test_app();

    let response = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/auth/logout")
            .header(header::COOKIE, "studio_session=abc")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("studio_session="));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_dev_login_hidden_outside_development() {
    let app = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/auth/dev-login")
        .body(Body::empty())
        .unwrap();

    let body = call(&app, request, StatusCode::NOT_FOUND).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_unknown_route_returns_json_not_found() {
    let app = create_test_app();

    let request = Request::builder()
        .uri("/rpc/project.rename")
        .body(Body::empty())
        .unwrap();

    let body = call(&app, request, StatusCode::NOT_FOUND).await;
    assert_eq!(body["error"], "not_found");
}

fn purge_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/functions/purge-expired-invitations");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_function_without_token() {
    let app = create_test_app();
    let response = send(&app, purge_request(None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_function_with_wrong_service_account() {
    let app = create_test_app();
    let token = scheduler_token("intruder@test-project.iam.gserviceaccount.com");
    let response = send(&app, purge_request(Some(&token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_function_rejects_user_id_token() {
    let app = create_test_app();
    let token = id_token("alice", "alice@example.com");
    let response = send(&app, purge_request(Some(&token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_function_with_scheduler_token() {
    let app = create_test_app();
    let token = scheduler_token(SCHEDULER_ACCOUNT);

    let body = call(&app, purge_request(Some(&token)), StatusCode::OK).await;
    assert_eq!(body, json!({"deleted": 0}));
}
