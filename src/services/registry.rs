// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live sessions, keyed by user ID.
//!
//! Each entry pairs a [`Session`] with the user's UI selection. The entry's
//! mutex is held for the whole of an operation, including the store call,
//! so operations on one session run one after another.
//!
//! Entries idle for longer than the idle timeout are dropped whenever a new
//! entry is added. Session tokens that were logged out are remembered until
//! they expire.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::services::session::Session;
use crate::view::UiState;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// Default time an unused session stays in memory.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// A signed-in user's session and view selection.
pub struct SessionEntry {
    pub session: Session,
    pub ui: UiState,
}

impl std::fmt::Debug for SessionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEntry")
            .field("ui", &self.ui)
            .finish_non_exhaustive()
    }
}

pub type SharedEntry = Arc<Mutex<SessionEntry>>;

struct Slot {
    entry: SharedEntry,
    last_seen: Instant,
}

impl Slot {
    fn new(session: Session, ui: UiState) -> Self {
        Self {
            entry: Arc::new(Mutex::new(SessionEntry { session, ui })),
            last_seen: Instant::now(),
        }
    }
}

/// All signed-in sessions held by this process.
pub struct SessionRegistry {
    store: Arc<dyn UserStore>,
    sessions: DashMap<String, Slot>,
    /// Logged-out token IDs and their expiry (Unix seconds)
    revoked: DashMap<String, usize>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_idle_timeout(store, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(store: Arc<dyn UserStore>, idle_timeout: Duration) -> Self {
        Self {
            store,
            sessions: DashMap::new(),
            revoked: DashMap::new(),
            idle_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// A new signed-out session over the shared store.
    pub fn new_session(&self) -> Session {
        Session::new(self.store.clone())
    }

    /// Register a signed-in session, replacing any earlier one for the user.
    pub fn insert(&self, user_id: &str, session: Session, ui: UiState) -> SharedEntry {
        self.evict_idle();

        let slot = Slot::new(session, ui);
        let entry = slot.entry.clone();
        if self.sessions.insert(user_id.to_string(), slot).is_some() {
            tracing::debug!(user_id, "Replaced existing session");
        }
        entry
    }

    /// Session for a user, marking it as used.
    pub fn get(&self, user_id: &str) -> Option<SharedEntry> {
        self.sessions.get_mut(user_id).map(|mut slot| {
            slot.last_seen = Instant::now();
            slot.entry.clone()
        })
    }

    pub fn remove(&self, user_id: &str) -> Option<SharedEntry> {
        self.sessions.remove(user_id).map(|(_, slot)| slot.entry)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Session for an authenticated user, reloading the profile from the
    /// store when this process has none in memory (e.g. after a restart).
    pub async fn get_or_restore(&self, user_id: &str) -> Result<SharedEntry> {
        if let Some(entry) = self.get(user_id) {
            return Ok(entry);
        }

        let profile: UserProfile = self
            .store
            .load_profile(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let mut session = self.new_session();
        session.restore(profile)?;
        tracing::info!(user_id, "Session restored from user store");

        self.evict_idle();

        // Another request may have restored it concurrently; keep the first.
        let entry = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Slot::new(session, UiState::default()))
            .entry
            .clone();
        Ok(entry)
    }

    /// Drop sessions unused for longer than the idle timeout. Sessions
    /// with a request in flight are kept.
    pub fn evict_idle(&self) {
        let idle_timeout = self.idle_timeout;
        self.sessions.retain(|user_id, slot| {
            if slot.last_seen.elapsed() < idle_timeout {
                return true;
            }
            let Ok(entry) = slot.entry.try_lock() else {
                return true;
            };
            if !entry.session.sync_state().is_synced() {
                tracing::warn!(user_id = %user_id, "Evicting idle session with unsynced changes");
            } else {
                tracing::debug!(user_id = %user_id, "Evicting idle session");
            }
            false
        });
    }

    // ─── Token revocation ────────────────────────────────────────

    /// Refuse a session token from now until it expires.
    pub fn revoke_token(&self, token_id: &str, expires_at: usize) {
        let now = unix_now();
        self.revoked.retain(|_, exp| *exp > now);
        if expires_at > now {
            self.revoked.insert(token_id.to_string(), expires_at);
        }
    }

    pub fn is_revoked(&self, token_id: &str) -> bool {
        self.revoked.contains_key(token_id)
    }
}

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, PasswordHasher};
    use crate::models::Credentials;

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_hasher(PasswordHasher::with_iterations(1_000)))
    }

    async fn signed_up(registry: &SessionRegistry, email: &str) -> String {
        registry
            .new_session()
            .signup(&Credentials::new(email, "secret"), "Ada")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_restore_reads_profile_once() {
        let registry = SessionRegistry::new(store());

        let id = signed_up(&registry, "a@b.com").await;
        assert!(registry.is_empty());

        let first = registry.get_or_restore(&id).await.unwrap();
        let second = registry.get_or_restore(&id).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);

        let guard = first.lock().await;
        assert_eq!(guard.session.profile().unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_unknown_user_is_unauthorized() {
        let registry = SessionRegistry::new(Arc::new(MemoryStore::new()));
        let err = registry.get_or_restore("ghost").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted_on_insert() {
        let registry = SessionRegistry::with_idle_timeout(store(), Duration::from_millis(50));
        let idle = signed_up(&registry, "idle@b.com").await;
        let busy = signed_up(&registry, "busy@b.com").await;
        let fresh = signed_up(&registry, "fresh@b.com").await;

        registry.get_or_restore(&idle).await.unwrap();
        let busy_entry = registry.get_or_restore(&busy).await.unwrap();
        assert_eq!(registry.len(), 2);

        tokio::time::sleep(Duration::from_millis(100)).await;

        // A request still holds the busy session, so it survives.
        let _guard = busy_entry.lock().await;
        registry.get_or_restore(&fresh).await.unwrap();

        assert!(registry.get(&idle).is_none());
        assert!(registry.get(&busy).is_some());
        assert!(registry.get(&fresh).is_some());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_recent_use_keeps_session() {
        let registry = SessionRegistry::with_idle_timeout(store(), Duration::from_millis(200));
        let id = signed_up(&registry, "a@b.com").await;
        registry.get_or_restore(&id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(registry.get(&id).is_some());
        tokio::time::sleep(Duration::from_millis(120)).await;

        registry.evict_idle();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_revoked_tokens_expire_from_the_list() {
        let registry = SessionRegistry::new(Arc::new(MemoryStore::new()));
        let now = unix_now();

        registry.revoke_token("live", now + 3600);
        registry.revoke_token("stale", now - 1);

        assert!(registry.is_revoked("live"));
        assert!(!registry.is_revoked("stale"));
        assert!(!registry.is_revoked("other"));
    }
}
