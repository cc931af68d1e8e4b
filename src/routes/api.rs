// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.
//!
//! Every handler works on the caller's registered session, restoring it
//! from the user store when this process does not hold one yet.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::stats::{self, SubjectStats};
use crate::models::AttendanceRecord;
use crate::services::registry::SharedEntry;
use crate::services::session::{NewRecord, ProfileField, SyncState};
use crate::view::screen::{RecentEntry, RECENT_ENTRIES};
use crate::view::{dispatch, render, Intent, Screen};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Upper bound for `GET /api/attendance/recent?n=`.
const MAX_RECENT: usize = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/view", get(get_view))
        .route("/api/intents", post(post_intent))
        .route("/api/subjects", post(add_subject))
        .route("/api/subjects/{index}", delete(delete_subject))
        .route("/api/attendance", post(add_record).get(get_records_on_date))
        .route("/api/attendance/recent", get(get_recent_records))
        .route("/api/attendance/{key}", delete(delete_record))
        .route("/api/stats", get(get_stats))
        .route("/api/profile", put(update_profile))
}

async fn session_for(state: &AppState, user: &AuthUser) -> Result<SharedEntry> {
    state.registry.get_or_restore(&user.user_id).await
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub subjects: Vec<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub record_count: usize,
    pub created_at: String,
    /// Fields with changes the store has not accepted
    pub unsynced: Vec<ProfileField>,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let entry = session_for(&state, &user).await?;
    let entry = entry.lock().await;

    let profile = entry.session.profile().ok_or(AppError::Unauthorized)?;
    let unsynced = match entry.session.sync_state() {
        SyncState::Synced => Vec::new(),
        SyncState::Unsynced(fields) => fields.into_iter().collect(),
    };

    Ok(Json(UserResponse {
        user_id: profile.id.clone(),
        email: profile.email.clone(),
        name: profile.name.clone(),
        subjects: profile.subjects.clone(),
        record_count: profile.attendance.len(),
        created_at: profile.created_at.clone(),
        unsynced,
    }))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// Change the display name.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    {
        let entry = session_for(&state, &user).await?;
        let mut entry = entry.lock().await;
        entry.session.update_name(&body.name).await?;
    }
    get_me(State(state), Extension(user)).await
}

// ─── Screens & Intents ───────────────────────────────────────

/// Render the caller's current screen.
async fn get_view(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Screen>> {
    let entry = session_for(&state, &user).await?;
    let entry = entry.lock().await;
    Ok(Json(render(&entry.session, &entry.ui)))
}

/// Apply one intent and return the resulting screen.
async fn post_intent(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(intent): Json<Intent>,
) -> Result<Json<Screen>> {
    let entry = session_for(&state, &user).await?;
    let mut guard = entry.lock().await;

    let today = chrono::Local::now().date_naive();
    let crate::services::SessionEntry { session, ui } = &mut *guard;
    dispatch(session, ui, intent, today).await?;

    let screen = render(session, ui);
    if !session.is_signed_in() {
        drop(guard);
        state.registry.remove(&user.user_id);
        state
            .registry
            .revoke_token(&user.token_id, user.expires_at);
        tracing::info!(user_id = %user.user_id, "Session ended by intent");
    }

    Ok(Json(screen))
}

// ─── Subjects ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddSubjectRequest {
    pub name: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubjectsResponse {
    pub subjects: Vec<String>,
    /// Name of the subject just removed, for deletes
    pub removed: Option<String>,
}

async fn add_subject(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AddSubjectRequest>,
) -> Result<(StatusCode, Json<SubjectsResponse>)> {
    let entry = session_for(&state, &user).await?;
    let mut entry = entry.lock().await;
    entry.session.add_subject(&body.name).await?;

    let subjects = entry
        .session
        .profile()
        .map(|p| p.subjects.clone())
        .unwrap_or_default();
    Ok((
        StatusCode::CREATED,
        Json(SubjectsResponse {
            subjects,
            removed: None,
        }),
    ))
}

/// Remove the subject at a list position. Its records stay.
async fn delete_subject(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(index): Path<usize>,
) -> Result<Json<SubjectsResponse>> {
    let entry = session_for(&state, &user).await?;
    let mut entry = entry.lock().await;
    let removed = entry.session.delete_subject(index).await?;

    let subjects = entry
        .session
        .profile()
        .map(|p| p.subjects.clone())
        .unwrap_or_default();
    Ok(Json(SubjectsResponse {
        subjects,
        removed: Some(removed),
    }))
}

// ─── Attendance ──────────────────────────────────────────────

async fn add_record(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewRecord>,
) -> Result<(StatusCode, Json<RecentEntry>)> {
    let entry = session_for(&state, &user).await?;
    let mut entry = entry.lock().await;
    let key = entry.session.add_record(&body).await?;

    let record = entry
        .session
        .profile()
        .and_then(|p| p.attendance.get(&key))
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Record {} not found", key)))?;

    Ok((StatusCode::CREATED, Json(RecentEntry { key, record })))
}

async fn delete_record(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<Json<AttendanceRecord>> {
    let entry = session_for(&state, &user).await?;
    let mut entry = entry.lock().await;
    let removed = entry.session.delete_record(&key).await?;
    Ok(Json(removed))
}

#[derive(Deserialize)]
pub struct DateQuery {
    pub date: String,
}

/// Records whose date equals `date` exactly.
async fn get_records_on_date(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<RecentEntry>>> {
    if query.date.trim().is_empty() {
        return Err(AppError::Validation("date is required".to_string()));
    }

    let entry = session_for(&state, &user).await?;
    let entry = entry.lock().await;
    let profile = entry.session.profile().ok_or(AppError::Unauthorized)?;

    let records = stats::records_on_date(&profile.attendance, &query.date)
        .into_iter()
        .map(|record| RecentEntry {
            key: record.key(),
            record: record.clone(),
        })
        .collect();
    Ok(Json(records))
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub n: Option<usize>,
}

/// Most recent records, newest first.
async fn get_recent_records(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<RecentEntry>>> {
    let n = query.n.unwrap_or(RECENT_ENTRIES).min(MAX_RECENT);

    let entry = session_for(&state, &user).await?;
    let entry = entry.lock().await;
    let profile = entry.session.profile().ok_or(AppError::Unauthorized)?;

    let records = stats::recent_records(&profile.attendance, n)
        .into_iter()
        .map(|(key, record)| RecentEntry {
            key: key.to_string(),
            record: record.clone(),
        })
        .collect();
    Ok(Json(records))
}

// ─── Stats ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatsResponse {
    pub subjects: Vec<SubjectStats>,
    pub threshold_percent: f64,
}

/// Per-subject attendance statistics.
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StatsResponse>> {
    let entry = session_for(&state, &user).await?;
    let entry = entry.lock().await;
    let profile = entry.session.profile().ok_or(AppError::Unauthorized)?;

    Ok(Json(StatsResponse {
        subjects: stats::subject_stats(profile),
        threshold_percent: stats::GOOD_STANDING_PERCENT,
    }))
}
