// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendance aggregates computed from a profile's records.
//!
//! Nothing here is cached: every call walks the full record map. A single
//! user's class schedule is small enough that this stays cheap.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::profile::{AttendanceMap, UserProfile};
use super::record::{AttendanceRecord, AttendanceStatus};

/// Attendance percentage at or above which a subject is in good standing.
pub const GOOD_STANDING_PERCENT: f64 = 75.0;

/// Hours per status for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubjectTotals {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub attended: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub not_attended: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub cancelled: u64,
}

impl SubjectTotals {
    pub fn total(&self) -> u64 {
        self.attended + self.not_attended + self.cancelled
    }

    /// Attended share of all logged hours, one decimal place.
    ///
    /// Zero logged hours yields `0.0`.
    pub fn percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        round_one_decimal(self.attended as f64 / total as f64 * 100.0)
    }
}

impl From<SubjectTotals> for (u64, u64, u64) {
    fn from(t: SubjectTotals) -> Self {
        (t.attended, t.not_attended, t.cancelled)
    }
}

/// Stats card for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubjectStats {
    pub subject: String,
    pub totals: SubjectTotals,
    pub percentage: f64,
    /// `percentage >= GOOD_STANDING_PERCENT`
    pub meets_threshold: bool,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn records_for<'a>(
    records: &'a AttendanceMap,
    subject: &'a str,
) -> impl Iterator<Item = &'a AttendanceRecord> + 'a {
    records.values().filter(move |r| r.subject == subject)
}

/// Hours attended for a subject.
pub fn attended_hours(records: &AttendanceMap, subject: &str) -> u64 {
    records_for(records, subject)
        .filter(|r| r.status == AttendanceStatus::Attended)
        .map(|r| u64::from(r.duration))
        .sum()
}

/// Hours per status for a subject.
pub fn subject_totals(records: &AttendanceMap, subject: &str) -> SubjectTotals {
    records_for(records, subject).fold(SubjectTotals::default(), |mut totals, r| {
        let hours = u64::from(r.duration);
        match r.status {
            AttendanceStatus::Attended => totals.attended += hours,
            AttendanceStatus::NotAttended => totals.not_attended += hours,
            AttendanceStatus::Cancelled => totals.cancelled += hours,
        }
        totals
    })
}

/// Attended share of a subject's logged hours, in percent (one decimal).
pub fn attendance_percentage(records: &AttendanceMap, subject: &str) -> f64 {
    subject_totals(records, subject).percentage()
}

/// Records logged on `date`.
pub fn records_on_date<'a>(records: &'a AttendanceMap, date: &str) -> Vec<&'a AttendanceRecord> {
    records.values().filter(|r| r.date == date).collect()
}

/// The `n` most recently dated records with their keys, newest first.
///
/// Records on the same date keep key order. Dates that don't parse sort
/// after every valid date.
pub fn recent_records(records: &AttendanceMap, n: usize) -> Vec<(&str, &AttendanceRecord)> {
    let mut entries: Vec<(&str, &AttendanceRecord, Option<NaiveDate>)> = records
        .iter()
        .map(|(key, r)| (key.as_str(), r, parse_date(&r.date)))
        .collect();

    // Stable sort: ties stay in key order.
    entries.sort_by(|a, b| b.2.cmp(&a.2));
    entries.truncate(n);

    entries.into_iter().map(|(key, r, _)| (key, r)).collect()
}

/// One stats card per listed subject.
///
/// Records whose subject was deleted from the list are not reported.
pub fn subject_stats(profile: &UserProfile) -> Vec<SubjectStats> {
    profile
        .subjects
        .iter()
        .map(|subject| {
            let totals = subject_totals(&profile.attendance, subject);
            let percentage = totals.percentage();
            SubjectStats {
                subject: subject.clone(),
                totals,
                percentage,
                meets_threshold: percentage >= GOOD_STANDING_PERCENT,
            }
        })
        .collect()
}

pub(crate) fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

// ─── Calendar ────────────────────────────────────────────────

/// Shape of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st (Sunday-first week)
    pub leading_blanks: u32,
    pub days_in_month: u32,
}

impl MonthGrid {
    /// Grid for `year`-`month`, or `None` for an invalid month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        Some(Self {
            year,
            month,
            leading_blanks: first.weekday().num_days_from_sunday(),
            days_in_month: next_first.signed_duration_since(first).num_days() as u32,
        })
    }

    /// `YYYY-MM-DD` for a day of this month.
    pub fn date_string(&self, day: u32) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, day)
    }

    /// e.g. "January 2024"
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::record_key;

    fn insert(map: &mut AttendanceMap, date: &str, subject: &str, status: AttendanceStatus, h: u32) {
        let record = AttendanceRecord::new(date, subject, status, h);
        map.insert(record_key(date, subject), record);
    }

    fn math_profile() -> UserProfile {
        let mut profile = UserProfile::new("u1", "a@b.com", "Ada");
        profile.subjects.push("Math".to_string());
        insert(
            &mut profile.attendance,
            "2024-01-10",
            "Math",
            AttendanceStatus::Attended,
            2,
        );
        profile
    }

    #[test]
    fn test_single_attended_record_is_full_attendance() {
        let profile = math_profile();
        assert_eq!(attendance_percentage(&profile.attendance, "Math"), 100.0);
    }

    #[test]
    fn test_mixed_statuses() {
        let mut profile = math_profile();
        insert(
            &mut profile.attendance,
            "2024-01-11",
            "Math",
            AttendanceStatus::NotAttended,
            1,
        );

        assert_eq!(attended_hours(&profile.attendance, "Math"), 2);
        assert_eq!(
            <(u64, u64, u64)>::from(subject_totals(&profile.attendance, "Math")),
            (2, 1, 0)
        );
        assert_eq!(attendance_percentage(&profile.attendance, "Math"), 66.7);

        profile.attendance.remove("2024-01-10-Math");
        assert_eq!(attended_hours(&profile.attendance, "Math"), 0);
    }

    #[test]
    fn test_zero_denominator_is_zero_percent() {
        let records = AttendanceMap::new();
        let pct = attendance_percentage(&records, "Physics");
        assert_eq!(pct, 0.0);
        assert!(!pct.is_nan());
    }

    #[test]
    fn test_cancelled_counts_against_percentage() {
        let mut records = AttendanceMap::new();
        insert(&mut records, "2024-02-01", "Art", AttendanceStatus::Attended, 3);
        insert(&mut records, "2024-02-02", "Art", AttendanceStatus::Cancelled, 1);

        assert_eq!(attended_hours(&records, "Art"), 3);
        assert_eq!(subject_totals(&records, "Art").cancelled, 1);
        assert_eq!(attendance_percentage(&records, "Art"), 75.0);
    }

    #[test]
    fn test_other_subjects_ignored() {
        let mut records = AttendanceMap::new();
        insert(&mut records, "2024-02-01", "Art", AttendanceStatus::Attended, 3);
        insert(&mut records, "2024-02-01", "Math", AttendanceStatus::NotAttended, 4);

        assert_eq!(attendance_percentage(&records, "Art"), 100.0);
        assert_eq!(attendance_percentage(&records, "Math"), 0.0);
    }

    #[test]
    fn test_percentage_stays_in_range() {
        let statuses = [
            AttendanceStatus::Attended,
            AttendanceStatus::NotAttended,
            AttendanceStatus::Cancelled,
        ];
        let mut records = AttendanceMap::new();
        for day in 1..=28u32 {
            let status = statuses[(day % 3) as usize];
            insert(&mut records, &format!("2024-02-{:02}", day), "Bio", status, day % 8 + 1);

            let pct = attendance_percentage(&records, "Bio");
            assert!((0.0..=100.0).contains(&pct), "out of range: {}", pct);
        }
    }

    #[test]
    fn test_records_on_date() {
        let mut records = AttendanceMap::new();
        insert(&mut records, "2024-03-05", "Art", AttendanceStatus::Attended, 1);
        insert(&mut records, "2024-03-05", "Math", AttendanceStatus::Cancelled, 2);
        insert(&mut records, "2024-03-06", "Math", AttendanceStatus::Attended, 2);

        let on_fifth = records_on_date(&records, "2024-03-05");
        assert_eq!(on_fifth.len(), 2);
        assert!(on_fifth.iter().all(|r| r.date == "2024-03-05"));
        assert!(records_on_date(&records, "2024-03-07").is_empty());
    }

    #[test]
    fn test_recent_records_newest_first() {
        let mut profile = math_profile();
        insert(
            &mut profile.attendance,
            "2024-01-11",
            "Math",
            AttendanceStatus::NotAttended,
            1,
        );

        let recent = recent_records(&profile.attendance, 1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].0, "2024-01-11-Math");
        assert_eq!(recent[0].1.date, "2024-01-11");

        let all = recent_records(&profile.attendance, 10);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].1.date, "2024-01-10");
    }

    #[test]
    fn test_recent_records_ties_and_bad_dates() {
        let mut records = AttendanceMap::new();
        insert(&mut records, "2024-05-01", "B", AttendanceStatus::Attended, 1);
        insert(&mut records, "2024-05-01", "A", AttendanceStatus::Attended, 1);
        insert(&mut records, "someday", "C", AttendanceStatus::Attended, 1);
        insert(&mut records, "2023-12-31", "D", AttendanceStatus::Attended, 1);

        let keys: Vec<&str> = recent_records(&records, 10).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["2024-05-01-A", "2024-05-01-B", "2023-12-31-D", "someday-C"]
        );
    }

    #[test]
    fn test_subject_stats_skips_orphans_and_keeps_duplicates() {
        let mut profile = math_profile();
        insert(
            &mut profile.attendance,
            "2024-01-10",
            "History",
            AttendanceStatus::Attended,
            5,
        );
        profile.subjects.push("Math".to_string());

        let stats = subject_stats(&profile);
        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(|s| s.subject == "Math"));
        assert!(stats[0].meets_threshold);
    }

    #[test]
    fn test_threshold_boundary() {
        let mut profile = UserProfile::new("u1", "a@b.com", "Ada");
        profile.subjects.push("Art".to_string());
        insert(&mut profile.attendance, "2024-02-01", "Art", AttendanceStatus::Attended, 3);
        insert(&mut profile.attendance, "2024-02-02", "Art", AttendanceStatus::NotAttended, 2);

        let stats = subject_stats(&profile);
        assert_eq!(stats[0].percentage, 60.0);
        assert!(!stats[0].meets_threshold);
    }

    #[test]
    fn test_month_grid() {
        // 1 Jan 2024 was a Monday.
        let jan = MonthGrid::new(2024, 1).unwrap();
        assert_eq!(jan.leading_blanks, 1);
        assert_eq!(jan.days_in_month, 31);
        assert_eq!(jan.label(), "January 2024");
        assert_eq!(jan.date_string(5), "2024-01-05");

        let feb = MonthGrid::new(2024, 2).unwrap();
        assert_eq!(feb.days_in_month, 29);

        let dec = MonthGrid::new(2023, 12).unwrap();
        assert_eq!(dec.days_in_month, 31);
        assert_eq!(dec.leading_blanks, 5);

        assert!(MonthGrid::new(2024, 13).is_none());
    }
}
