// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie tests.
//!
//! These tests verify the session cookie set on login authenticates later
//! requests and that a logged-out token is refused afterwards.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, get_request, json_request, signup_and_login};

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

fn with_cookie(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("attendance_token={}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_login_cookie_attributes() {
    let (app, _, _) = create_test_app();
    signup_and_login(&app, "ada@example.com", "Ada").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({"email": "ada@example.com", "password": "secret"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = find_cookie(&set_cookie_headers(&response), "attendance_token");
    assert!(cookie.contains("HttpOnly"), "cookie: {cookie}");
    assert!(cookie.contains("SameSite=Lax"), "cookie: {cookie}");
    assert!(cookie.contains("Path=/"), "cookie: {cookie}");
    assert!(cookie.contains("Max-Age=2592000"), "cookie: {cookie}");
}

#[tokio::test]
async fn test_cookie_authenticates_requests() {
    let (app, _, _) = create_test_app();
    let (_, token) = signup_and_login(&app, "ada@example.com", "Ada").await;

    let response = app
        .oneshot(with_cookie("GET", "/api/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_clears_cookie_and_session() {
    let (app, state, _) = create_test_app();
    let (user_id, token) = signup_and_login(&app, "ada@example.com", "Ada").await;
    assert!(state.registry.get(&user_id).is_some());

    let response = app
        .clone()
        .oneshot(with_cookie("POST", "/auth/logout", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = find_cookie(&set_cookie_headers(&response), "attendance_token");
    assert!(cookie.contains("Max-Age=0"), "cookie: {cookie}");
    assert!(cookie.contains("Path=/"), "cookie: {cookie}");
    assert!(state.registry.get(&user_id).is_none());

    // The logged-out token is refused rather than restoring the session.
    let response = app
        .oneshot(with_cookie("GET", "/api/view", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_token");
    assert!(state.registry.get(&user_id).is_none());
}

#[tokio::test]
async fn test_bearer_token_refused_after_logout() {
    let (app, state, _) = create_test_app();
    let (user_id, token) = signup_and_login(&app, "ada@example.com", "Ada").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/logout",
            Some(&token),
            serde_json::Value::Null,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get_request("/api/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(state.registry.is_empty());

    // Logging out again with the dead token is harmless.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/logout",
            Some(&token),
            serde_json::Value::Null,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Logging in again issues a new token that works.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({"email": "ada@example.com", "password": "secret"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fresh = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(fresh, token);

    let response = app
        .oneshot(get_request("/api/me", Some(&fresh)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user_id"], user_id);
}
