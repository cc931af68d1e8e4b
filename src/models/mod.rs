// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod profile;
pub mod record;
pub mod stats;

pub use profile::{Account, AttendanceMap, Credentials, UserProfile};
pub use record::{record_key, AttendanceRecord, AttendanceStatus};
pub use stats::{SubjectStats, SubjectTotals};
