// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screen view models.
//!
//! [`render`] is a pure function of the session and UI selection; the
//! client draws whatever it returns.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::ui_state::{AuthMode, Page, UiState};
use crate::models::stats::{self, MonthGrid, SubjectStats};
use crate::models::{AttendanceRecord, AttendanceStatus, UserProfile};
use crate::services::session::{ProfileField, Session, SyncState};

/// Entries shown under the calendar.
pub const RECENT_ENTRIES: usize = 10;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Top bar shared by signed-in screens.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Header {
    pub user_name: String,
    pub page: Page,
    /// Local changes the store has not accepted yet
    pub unsynced: Vec<ProfileField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubjectRow {
    /// Position in the subject list (delete handle)
    pub index: usize,
    pub name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub attended_hours: u64,
}

/// One record inside a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CellEntry {
    pub subject: String,
    pub status: AttendanceStatus,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DayCell {
    pub day: u32,
    pub date: String,
    pub entries: Vec<CellEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalendarMonth {
    /// e.g. "January 2024"
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub weekdays: Vec<String>,
    /// Empty cells before day 1
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
}

/// A recent record with its key (delete handle).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecentEntry {
    pub key: String,
    pub record: AttendanceRecord,
}

/// What the client should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Screen {
    Auth {
        mode: AuthMode,
    },
    Subjects {
        header: Header,
        subjects: Vec<SubjectRow>,
    },
    Calendar {
        header: Header,
        calendar: CalendarMonth,
        recent: Vec<RecentEntry>,
    },
    Stats {
        header: Header,
        stats: Vec<SubjectStats>,
    },
}

/// Render the screen for the current state.
pub fn render(session: &Session, ui: &UiState) -> Screen {
    let Some(profile) = session.profile() else {
        return Screen::Auth { mode: ui.auth_mode };
    };

    let header = Header {
        user_name: profile.name.clone(),
        page: ui.current_page,
        unsynced: match session.sync_state() {
            SyncState::Synced => Vec::new(),
            SyncState::Unsynced(fields) => fields.into_iter().collect(),
        },
    };

    match ui.current_page {
        Page::Subjects => Screen::Subjects {
            header,
            subjects: subject_rows(profile),
        },
        Page::Calendar => Screen::Calendar {
            header,
            calendar: calendar_month(profile, ui),
            recent: stats::recent_records(&profile.attendance, RECENT_ENTRIES)
                .into_iter()
                .map(|(key, record)| RecentEntry {
                    key: key.to_string(),
                    record: record.clone(),
                })
                .collect(),
        },
        Page::Stats => Screen::Stats {
            header,
            stats: stats::subject_stats(profile),
        },
    }
}

fn subject_rows(profile: &UserProfile) -> Vec<SubjectRow> {
    profile
        .subjects
        .iter()
        .enumerate()
        .map(|(index, name)| SubjectRow {
            index,
            name: name.clone(),
            attended_hours: stats::attended_hours(&profile.attendance, name),
        })
        .collect()
}

fn calendar_month(profile: &UserProfile, ui: &UiState) -> CalendarMonth {
    let weekdays = WEEKDAYS.iter().map(|d| d.to_string()).collect();

    // UiState only ever holds valid months; an empty grid is the fallback.
    let Some(grid) = MonthGrid::new(ui.month.year, ui.month.month) else {
        return CalendarMonth {
            label: String::new(),
            year: ui.month.year,
            month: ui.month.month,
            weekdays,
            leading_blanks: 0,
            days: Vec::new(),
        };
    };

    let days = (1..=grid.days_in_month)
        .map(|day| {
            let date = grid.date_string(day);
            let entries = stats::records_on_date(&profile.attendance, &date)
                .into_iter()
                .map(|r| CellEntry {
                    subject: r.subject.clone(),
                    status: r.status,
                    duration: r.duration,
                })
                .collect();
            DayCell { day, date, entries }
        })
        .collect();

    CalendarMonth {
        label: grid.label(),
        year: grid.year,
        month: grid.month,
        weekdays,
        leading_blanks: grid.leading_blanks,
        days,
    }
}
