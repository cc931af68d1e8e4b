// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store for local development and tests.

use super::{check_new_account, normalize_email, PasswordHasher, UserStore};
use crate::error::{AppError, AuthError};
use crate::models::{Account, AttendanceMap, UserProfile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

/// User store backed by process memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    hasher: PasswordHasher,
    accounts: Mutex<HashMap<String, Account>>,
    profiles: Mutex<HashMap<String, UserProfile>>,
    /// When set, every field overwrite fails with a write error.
    pub fail_writes: AtomicBool,
    /// Number of field overwrites attempted.
    pub write_calls: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store using a specific password hasher (e.g. fewer iterations in tests).
    pub fn with_hasher(hasher: PasswordHasher) -> Self {
        Self {
            hasher,
            ..Self::default()
        }
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a stored profile, bypassing auth.
    pub async fn stored_profile(&self, user_id: &str) -> Option<UserProfile> {
        self.profiles.lock().await.get(user_id).cloned()
    }

    async fn write_field<F>(&self, user_id: &str, field: &str, apply: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut UserProfile),
    {
        self.write_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Write(format!(
                "injected failure writing {} for {}",
                field, user_id
            )));
        }

        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| AppError::Write(format!("no profile document for {}", user_id)))?;
        apply(profile);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<String, AppError> {
        check_new_account(email, password)?;
        let email = normalize_email(email);

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&email) {
            return Err(AuthError::EmailInUse.into());
        }

        let user_id = self.hasher.new_user_id()?;
        let account = self.hasher.new_account(&user_id, password)?;
        accounts.insert(email.clone(), account);

        self.profiles
            .lock()
            .await
            .insert(user_id.clone(), UserProfile::new(&user_id, email, name));

        Ok(user_id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserProfile, AppError> {
        let account = self
            .accounts
            .lock()
            .await
            .get(&normalize_email(email))
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(&account, password) {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.stored_profile(&account.user_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", account.user_id)))
    }

    async fn end_session(&self, _user_id: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.stored_profile(user_id).await)
    }

    async fn replace_subjects(&self, user_id: &str, subjects: &[String]) -> Result<(), AppError> {
        self.write_field(user_id, "subjects", |p| p.subjects = subjects.to_vec())
            .await
    }

    async fn replace_attendance(
        &self,
        user_id: &str,
        attendance: &AttendanceMap,
    ) -> Result<(), AppError> {
        self.write_field(user_id, "attendance", |p| p.attendance = attendance.clone())
            .await
    }

    async fn update_name(&self, user_id: &str, name: &str) -> Result<(), AppError> {
        self.write_field(user_id, "name", |p| p.name = name.to_string())
            .await
    }
}
