// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::SESSION_COOKIE;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, extract_token, verify_jwt, AuthUser};
use crate::models::Credentials;
use crate::view::{render, Screen, UiState};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignupResponse {
    pub user_id: String,
}

/// Create an account. The caller still has to log in.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let mut session = state.registry.new_session();
    let user_id = session
        .signup(&Credentials::new(body.email, body.password), &body.name)
        .await?;

    tracing::info!(user_id = %user_id, "Account created");

    Ok((StatusCode::CREATED, Json(SignupResponse { user_id })))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub screen: Screen,
}

/// Sign in, register the session and hand out a session token.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let mut session = state.registry.new_session();
    let user_id = session
        .login(&Credentials::new(body.email, body.password))
        .await?
        .id
        .clone();

    let mut ui = UiState::default();
    ui.on_login();
    let screen = render(&session, &ui);

    let ttl_days = state.config.session_ttl_days;
    let token = create_jwt(&user_id, &state.config.jwt_signing_key, ttl_days)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    state.registry.insert(&user_id, session, ui);
    tracing::info!(user_id = %user_id, sessions = state.registry.len(), "User logged in");

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(ttl_days as i64))
        .build();

    Ok((jar.add(cookie), Json(LoginResponse { token, screen })))
}

/// End the session (if any), revoke the presented token and clear the
/// cookie. Always succeeds for callers without a valid token.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
) -> Result<(StatusCode, CookieJar)> {
    let user = extract_token(&jar, &headers)
        .and_then(|token| verify_jwt(&token, &state.config.jwt_signing_key))
        .filter(|user| !state.registry.is_revoked(&user.token_id));

    if let Some(user) = user {
        end_session(&state, &user).await?;
        tracing::info!(user_id = %user.user_id, "User logged out");
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    Ok((StatusCode::NO_CONTENT, jar.remove(removal)))
}

/// Sign the user's session out of the store, drop it from the registry and
/// revoke the token that was used.
pub(crate) async fn end_session(state: &AppState, user: &AuthUser) -> Result<()> {
    match state.registry.get(&user.user_id) {
        Some(entry) => {
            let mut entry = entry.lock().await;
            if entry.session.is_signed_in() {
                entry.session.logout().await?;
            }
            entry.ui.on_logout();
        }
        // Not held in memory (idle or restarted); the store still hears about it.
        None => {
            state
                .registry
                .store()
                .end_session(&user.user_id)
                .await?
        }
    }

    state.registry.remove(&user.user_id);
    state.registry.revoke_token(&user.token_id, user.expires_at);
    Ok(())
}
