// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Push-style auth state notifications.
//!
//! One subscriber at a time. The callback fires once per sign-in state
//! transition, never twice for the same state.

use crate::models::UserProfile;
use std::sync::{Arc, Mutex};

/// Receives `Some(profile)` on sign-in and `None` on sign-out.
pub type AuthCallback = Arc<dyn Fn(Option<&UserProfile>) + Send + Sync>;

/// Handle returned by [`AuthStateEvents::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubscribeError {
    #[error("An auth state subscription is already active")]
    AlreadySubscribed,
}

/// Last state delivered to the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Delivered {
    Nothing,
    SignedIn(String),
    SignedOut,
}

struct Inner {
    subscriber: Option<(SubscriptionId, AuthCallback)>,
    next_id: u64,
    delivered: Delivered,
}

/// Single-subscriber auth state event source.
pub struct AuthStateEvents {
    inner: Mutex<Inner>,
}

impl Default for AuthStateEvents {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                subscriber: None,
                next_id: 1,
                delivered: Delivered::Nothing,
            }),
        }
    }
}

impl AuthStateEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the subscriber.
    ///
    /// `current` is the state at subscription time; an active session is
    /// delivered immediately.
    pub fn subscribe(
        &self,
        callback: AuthCallback,
        current: Option<&UserProfile>,
    ) -> Result<SubscriptionId, SubscribeError> {
        let id = {
            let mut inner = self.lock();
            if inner.subscriber.is_some() {
                return Err(SubscribeError::AlreadySubscribed);
            }
            let id = SubscriptionId(inner.next_id);
            inner.next_id += 1;
            inner.subscriber = Some((id, callback));
            inner.delivered = Delivered::Nothing;
            id
        };

        if let Some(profile) = current {
            self.emit(Some(profile));
        }
        Ok(id)
    }

    /// Drop the subscriber. Returns `false` if `id` is not the active one.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        match &inner.subscriber {
            Some((active, _)) if *active == id => {
                inner.subscriber = None;
                true
            }
            _ => false,
        }
    }

    pub fn has_subscriber(&self) -> bool {
        self.lock().subscriber.is_some()
    }

    /// Notify the subscriber of a new state, unless it already saw it.
    pub fn emit(&self, profile: Option<&UserProfile>) {
        let next = match profile {
            Some(p) => Delivered::SignedIn(p.id.clone()),
            None => Delivered::SignedOut,
        };

        let callback = {
            let mut inner = self.lock();
            let Some((_, callback)) = &inner.subscriber else {
                return;
            };
            if inner.delivered == next {
                return;
            }
            let callback = callback.clone();
            inner.delivered = next;
            callback
        };

        // Called without the lock held so the callback may unsubscribe.
        callback(profile);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panicking callback runs outside the lock, so poisoning only
        // follows a panic in this module; the state is still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
