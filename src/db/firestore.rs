// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Accounts (email to user ID and password hash)
//! - Users (profile documents: name, subjects, attendance)

use super::{check_new_account, collections, normalize_email, PasswordHasher, UserStore};
use crate::error::{AppError, AuthError};
use crate::models::{Account, AttendanceMap, UserProfile};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// `subjects` field of a profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SubjectsField {
    subjects: Vec<String>,
}

/// `attendance` field of a profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AttendanceField {
    attendance: AttendanceMap,
}

/// `name` field of a profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NameField {
    name: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    hasher: PasswordHasher,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes an unauthenticated connection.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            hasher: PasswordHasher::default(),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            hasher: PasswordHasher::default(),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            hasher: PasswordHasher::default(),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Document ID for an account. Emails may contain `/`, which
    /// Firestore does not allow in IDs.
    fn account_doc_id(email: &str) -> String {
        urlencoding::encode(&normalize_email(email)).into_owned()
    }

    // ─── Account Operations ──────────────────────────────────────

    async fn get_account(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACCOUNTS)
            .obj()
            .one(&Self::account_doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a profile by user ID.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a whole profile document.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Overwrite a single top-level field of a profile document.
    async fn write_field<T>(&self, user_id: &str, field: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()
            .map_err(|e| AppError::Write(e.to_string()))?
            .fluent()
            .update()
            .fields([field])
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(value)
            .execute()
            .await
            .map_err(|e| AppError::Write(format!("{} update failed: {}", field, e)))?;

        tracing::debug!(user_id, field, "Profile field overwritten");
        Ok(())
    }
}

#[async_trait]
impl UserStore for FirestoreDb {
    fn backend_tag(&self) -> &'static str {
        "firestore"
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<String, AppError> {
        check_new_account(email, password)?;

        if self.get_account(email).await?.is_some() {
            return Err(AuthError::EmailInUse.into());
        }

        let user_id = self.hasher.new_user_id()?;
        let account = self.hasher.new_account(&user_id, password)?;

        // `insert` refuses to overwrite, so a concurrent signup for the
        // same email loses here.
        let _: Account = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::ACCOUNTS)
            .document_id(Self::account_doc_id(email))
            .object(&account)
            .execute()
            .await
            .map_err(|e| match e {
                firestore::errors::FirestoreError::DataConflictError(_) => {
                    AppError::Auth(AuthError::EmailInUse)
                }
                other => AppError::Database(other.to_string()),
            })?;

        let profile = UserProfile::new(&user_id, normalize_email(email), name);
        self.upsert_profile(&profile).await?;

        tracing::info!(user_id = %user_id, "Account created");
        Ok(user_id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserProfile, AppError> {
        let account = self
            .get_account(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(&account, password) {
            tracing::debug!(user_id = %account.user_id, "Password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }

        // An account whose profile document went missing gets an empty one,
        // matching how a missing document reads as empty fields.
        match self.get_profile(&account.user_id).await? {
            Some(profile) => Ok(profile),
            None => {
                tracing::warn!(user_id = %account.user_id, "Profile missing, recreating");
                let profile = UserProfile::new(&account.user_id, normalize_email(email), "");
                self.upsert_profile(&profile).await?;
                Ok(profile)
            }
        }
    }

    async fn end_session(&self, user_id: &str) -> Result<(), AppError> {
        // Tokens are revoked by the session registry; Firestore holds no
        // per-session state.
        tracing::debug!(user_id, "Session ended");
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_profile(user_id).await
    }

    async fn replace_subjects(&self, user_id: &str, subjects: &[String]) -> Result<(), AppError> {
        let field = SubjectsField {
            subjects: subjects.to_vec(),
        };
        self.write_field(user_id, "subjects", &field).await
    }

    async fn replace_attendance(
        &self,
        user_id: &str,
        attendance: &AttendanceMap,
    ) -> Result<(), AppError> {
        let field = AttendanceField {
            attendance: attendance.clone(),
        };
        self.write_field(user_id, "attendance", &field).await
    }

    async fn update_name(&self, user_id: &str, name: &str) -> Result<(), AppError> {
        let field = NameField {
            name: name.to_string(),
        };
        self.write_field(user_id, "name", &field).await
    }
}
