// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing for stored accounts (PBKDF2-HMAC-SHA256).

use crate::error::AppError;
use crate::models::Account;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const HASH_LEN: usize = 32;
const SALT_LEN: usize = 16;
const USER_ID_LEN: usize = 16;
const DEFAULT_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

/// Derives and checks password hashes.
#[derive(Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            rng: SystemRandom::new(),
        }
    }
}

impl PasswordHasher {
    /// Hasher with a custom PBKDF2 iteration count (minimum 1).
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
            rng: SystemRandom::new(),
        }
    }

    fn random_bytes<const N: usize>(&self) -> Result<[u8; N], AppError> {
        let mut buf = [0u8; N];
        self.rng
            .fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        Ok(buf)
    }

    /// Fresh opaque user ID (hex).
    pub fn new_user_id(&self) -> Result<String, AppError> {
        Ok(hex::encode(self.random_bytes::<USER_ID_LEN>()?))
    }

    /// Build the stored account for a new user.
    pub fn new_account(&self, user_id: &str, password: &str) -> Result<Account, AppError> {
        let salt = self.random_bytes::<SALT_LEN>()?;
        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            ALGORITHM,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut hash,
        );

        Ok(Account {
            user_id: user_id.to_string(),
            salt: BASE64.encode(salt),
            password_hash: BASE64.encode(hash),
        })
    }

    /// Constant-time check of a password against a stored account.
    pub fn verify(&self, account: &Account, password: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (
            BASE64.decode(&account.salt),
            BASE64.decode(&account.password_hash),
        ) else {
            tracing::warn!(user_id = %account.user_id, "Stored account has undecodable hash");
            return false;
        };

        pbkdf2::verify(
            ALGORITHM,
            self.iterations,
            &salt,
            password.as_bytes(),
            &expected,
        )
        .is_ok()
    }
}
