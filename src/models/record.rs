// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendance record model for storage and API.

use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Outcome of one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AttendanceStatus {
    Attended,
    NotAttended,
    Cancelled,
}

impl AttendanceStatus {
    /// Wire name, as stored in Firestore.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Attended => "attended",
            AttendanceStatus::NotAttended => "not-attended",
            AttendanceStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged class event.
///
/// Stored inside the owning profile's `attendance` map under
/// [`record_key`]. Dates are kept as the `YYYY-MM-DD` strings the client
/// sent; nothing here checks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AttendanceRecord {
    /// Subject name (may no longer be in the subject list)
    pub subject: String,
    /// Calendar date (ISO 8601, `YYYY-MM-DD`)
    pub date: String,
    pub status: AttendanceStatus,
    /// Hours
    pub duration: u32,
}

impl AttendanceRecord {
    pub fn new(
        date: impl Into<String>,
        subject: impl Into<String>,
        status: AttendanceStatus,
        duration: u32,
    ) -> Self {
        Self {
            subject: subject.into(),
            date: date.into(),
            status,
            duration,
        }
    }

    /// Composite key of this record within a profile.
    pub fn key(&self) -> String {
        record_key(&self.date, &self.subject)
    }
}

/// Build the composite `date-subject` key.
pub fn record_key(date: &str, subject: &str) -> String {
    format!("{}-{}", date, subject)
}
