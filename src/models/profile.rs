// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::record::AttendanceRecord;

/// Attendance records keyed by `date-subject`.
pub type AttendanceMap = BTreeMap<String, AttendanceRecord>;

/// User profile stored in Firestore (`users/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Auth user ID (also used as document ID)
    pub id: String,
    /// Sign-in email
    #[serde(default)]
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Subject names in insertion order (duplicates allowed)
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Attendance records by composite key
    #[serde(default)]
    pub attendance: AttendanceMap,
    /// When the account was created (RFC 3339)
    #[serde(default)]
    pub created_at: String,
}

impl UserProfile {
    /// A freshly signed-up profile with no subjects or records.
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            subjects: Vec::new(),
            attendance: AttendanceMap::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Email/password pair submitted on the auth screen.
///
/// Only presence is checked here; email syntax and password strength are
/// the auth provider's call.
#[derive(Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Please fill in all fields"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please fill in all fields"))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Stored login for one email (`accounts/{email}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    /// PBKDF2 salt (base64)
    pub salt: String,
    /// PBKDF2-HMAC-SHA256 output (base64)
    pub password_hash: String,
}
