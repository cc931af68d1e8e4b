// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in session state and profile mutations.
//!
//! A session is either signed out or holds the user's whole profile in
//! memory. Every mutation changes memory first and then overwrites the
//! changed field in the user store. A failed overwrite is not rolled back;
//! the field is marked unsynced until a later write of it succeeds or the
//! profile is reloaded.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{record_key, AttendanceRecord, AttendanceStatus, Credentials, UserProfile};
use crate::services::auth_events::{AuthCallback, AuthStateEvents, SubscribeError, SubscriptionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Profile fields that are written independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ProfileField {
    Name,
    Subjects,
    Attendance,
}

/// Whether memory matches what was last written successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Synced,
    /// These fields failed their last write.
    Unsynced(BTreeSet<ProfileField>),
}

impl SyncState {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncState::Synced)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    SignedOut,
    SignedIn(UserProfile),
}

/// Attendance entry form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRecord {
    #[validate(length(min = 1, message = "Date is required"))]
    pub date: String,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    #[serde(default = "default_status")]
    pub status: AttendanceStatus,
    #[validate(required(message = "Duration is required"))]
    pub duration: Option<u32>,
}

fn default_status() -> AttendanceStatus {
    AttendanceStatus::Attended
}

/// One user's session over a user store.
pub struct Session {
    store: Arc<dyn UserStore>,
    state: SessionState,
    unsynced: BTreeSet<ProfileField>,
    events: AuthStateEvents,
}

impl Session {
    /// A signed-out session.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            state: SessionState::SignedOut,
            unsynced: BTreeSet::new(),
            events: AuthStateEvents::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, SessionState::SignedIn(_))
    }

    /// The loaded profile, if signed in.
    pub fn profile(&self) -> Option<&UserProfile> {
        match &self.state {
            SessionState::SignedIn(profile) => Some(profile),
            SessionState::SignedOut => None,
        }
    }

    pub fn sync_state(&self) -> SyncState {
        if self.unsynced.is_empty() {
            SyncState::Synced
        } else {
            SyncState::Unsynced(self.unsynced.clone())
        }
    }

    // ─── Auth State Subscription ─────────────────────────────────

    /// Subscribe to sign-in/sign-out transitions. An active session is
    /// delivered immediately.
    pub fn subscribe_auth_state(
        &self,
        callback: AuthCallback,
    ) -> std::result::Result<SubscriptionId, SubscribeError> {
        self.events.subscribe(callback, self.profile())
    }

    pub fn unsubscribe_auth_state(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ─── Transitions ─────────────────────────────────────────────

    /// Sign in and load the profile.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<&UserProfile> {
        credentials.validate()?;
        if self.is_signed_in() {
            return Err(AppError::Validation("Already signed in".to_string()));
        }

        let profile = self
            .store
            .authenticate(&credentials.email, &credentials.password)
            .await
            .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

        tracing::info!(
            user_id = %profile.id,
            subjects = profile.subjects.len(),
            records = profile.attendance.len(),
            backend = self.store.backend_tag(),
            "Signed in"
        );

        self.enter(profile);
        self.require_profile()
    }

    /// Create an account. The session stays signed out.
    pub async fn signup(&mut self, credentials: &Credentials, name: &str) -> Result<String> {
        credentials.validate()?;
        if name.trim().is_empty() {
            return Err(AppError::Validation("Please enter your name".to_string()));
        }

        let user_id = self
            .store
            .create_account(&credentials.email, &credentials.password, name)
            .await?;

        tracing::info!(user_id = %user_id, "Account created, awaiting login");
        Ok(user_id)
    }

    /// Adopt a profile for a user who is already authenticated
    /// (e.g. a still-valid session token after a restart).
    pub fn restore(&mut self, profile: UserProfile) -> Result<&UserProfile> {
        if self.is_signed_in() {
            return Err(AppError::Validation("Already signed in".to_string()));
        }
        tracing::debug!(user_id = %profile.id, "Session restored");
        self.enter(profile);
        self.require_profile()
    }

    fn enter(&mut self, profile: UserProfile) {
        self.unsynced.clear();
        self.events.emit(Some(&profile));
        self.state = SessionState::SignedIn(profile);
    }

    /// End the session. Memory is cleared only once the store agrees.
    pub async fn logout(&mut self) -> Result<()> {
        let user_id = self.require_profile()?.id.clone();
        self.store.end_session(&user_id).await?;

        if !self.unsynced.is_empty() {
            tracing::warn!(
                user_id = %user_id,
                fields = ?self.unsynced,
                "Signing out with unsynced changes"
            );
        }

        self.state = SessionState::SignedOut;
        self.unsynced.clear();
        self.events.emit(None);
        tracing::info!(user_id = %user_id, "Signed out");
        Ok(())
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Append a subject. Blank names are rejected; duplicates are kept.
    pub async fn add_subject(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Subject name is required".to_string()));
        }
        self.require_profile_mut()?.subjects.push(name.to_string());
        tracing::debug!(subject = name, "Subject added");
        self.persist(ProfileField::Subjects).await
    }

    /// Remove the subject at `index`. Its records stay.
    pub async fn delete_subject(&mut self, index: usize) -> Result<String> {
        let subjects = &mut self.require_profile_mut()?.subjects;
        if index >= subjects.len() {
            return Err(AppError::NotFound(format!("Subject #{}", index)));
        }
        let removed = subjects.remove(index);
        tracing::debug!(subject = %removed, index, "Subject deleted");
        self.persist(ProfileField::Subjects).await?;
        Ok(removed)
    }

    /// Log a record, replacing any record with the same date and subject.
    /// Returns the record key.
    pub async fn add_record(&mut self, entry: &NewRecord) -> Result<String> {
        entry.validate()?;
        let duration = entry
            .duration
            .ok_or_else(|| AppError::Validation("Duration is required".to_string()))?;

        let record = AttendanceRecord::new(&entry.date, &entry.subject, entry.status, duration);
        let key = record_key(&entry.date, &entry.subject);

        let replaced = self
            .require_profile_mut()?
            .attendance
            .insert(key.clone(), record)
            .is_some();
        tracing::debug!(key = %key, status = %entry.status, duration, replaced, "Record added");

        self.persist(ProfileField::Attendance).await?;
        Ok(key)
    }

    /// Remove a record by key.
    pub async fn delete_record(&mut self, key: &str) -> Result<AttendanceRecord> {
        let removed = self
            .require_profile_mut()?
            .attendance
            .remove(key)
            .ok_or_else(|| AppError::NotFound(format!("Attendance record {}", key)))?;
        tracing::debug!(key, "Record deleted");
        self.persist(ProfileField::Attendance).await?;
        Ok(removed)
    }

    /// Change the display name.
    pub async fn update_name(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Please enter your name".to_string()));
        }
        self.require_profile_mut()?.name = name.to_string();
        self.persist(ProfileField::Name).await
    }

    // ─── Helpers ─────────────────────────────────────────────────

    fn require_profile(&self) -> Result<&UserProfile> {
        self.profile().ok_or(AppError::Unauthorized)
    }

    fn require_profile_mut(&mut self) -> Result<&mut UserProfile> {
        match &mut self.state {
            SessionState::SignedIn(profile) => Ok(profile),
            SessionState::SignedOut => Err(AppError::Unauthorized),
        }
    }

    /// Overwrite one field in the store with its in-memory value.
    async fn persist(&mut self, field: ProfileField) -> Result<()> {
        let store = self.store.clone();
        let profile = self.require_profile()?;

        let result = match field {
            ProfileField::Name => store.update_name(&profile.id, &profile.name).await,
            ProfileField::Subjects => store.replace_subjects(&profile.id, &profile.subjects).await,
            ProfileField::Attendance => {
                store
                    .replace_attendance(&profile.id, &profile.attendance)
                    .await
            }
        };

        match result {
            Ok(()) => {
                self.unsynced.remove(&field);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(field = ?field, error = %e, "Write failed, keeping local changes");
                self.unsynced.insert(field);
                Err(match e {
                    AppError::Write(msg) => AppError::Write(msg),
                    other => AppError::Write(other.to_string()),
                })
            }
        }
    }
}
