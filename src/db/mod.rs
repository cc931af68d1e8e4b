// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User store and auth provider.
//!
//! Everything the app persists goes through [`UserStore`]: account
//! creation, sign-in, and whole-field overwrites of a profile document.

pub mod firestore;
pub mod memory;
pub mod password;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;
pub use password::PasswordHasher;

use crate::error::AppError;
use crate::models::{AttendanceMap, UserProfile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Profile documents (keyed by user ID)
    pub const USERS: &str = "users";
    /// Login records (keyed by URL-encoded email)
    pub const ACCOUNTS: &str = "accounts";
}

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 6;

/// External user store and auth provider.
///
/// Writes replace a whole profile field; there are no partial updates
/// and no retries. Write failures surface as [`AppError::Write`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Short name for logs.
    fn backend_tag(&self) -> &'static str;

    /// Create an account and an empty profile. Returns the new user ID.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<String, AppError>;

    /// Check credentials and load the profile.
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserProfile, AppError>;

    /// End the provider-side session for a user.
    async fn end_session(&self, user_id: &str) -> Result<(), AppError>;

    /// Read a profile without credentials (for an already-authenticated user).
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;

    /// Overwrite the `subjects` field.
    async fn replace_subjects(&self, user_id: &str, subjects: &[String]) -> Result<(), AppError>;

    /// Overwrite the `attendance` field.
    async fn replace_attendance(
        &self,
        user_id: &str,
        attendance: &AttendanceMap,
    ) -> Result<(), AppError>;

    /// Overwrite the `name` field.
    async fn update_name(&self, user_id: &str, name: &str) -> Result<(), AppError>;
}

/// Lowercased, trimmed email used as the account key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks the provider applies before creating an account.
pub fn check_new_account(email: &str, password: &str) -> Result<(), AppError> {
    use validator::ValidateEmail;

    if !normalize_email(email).validate_email() {
        return Err(crate::error::AuthError::InvalidEmail.into());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(crate::error::AuthError::WeakPassword(MIN_PASSWORD_LEN).into());
    }
    Ok(())
}
