// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session and auth state logic.

pub mod auth_events;
pub mod registry;
pub mod session;

pub use auth_events::{AuthCallback, AuthStateEvents, SubscribeError, SubscriptionId};
pub use registry::{SessionEntry, SessionRegistry};
pub use session::{NewRecord, ProfileField, Session, SessionState, SyncState};
