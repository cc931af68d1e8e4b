// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! UI selection: which page, which auth form, which calendar month.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Signed-in page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Page {
    Subjects,
    Calendar,
    #[default]
    Stats,
}

/// Signed-out form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

/// Calendar month on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                month: self.month - 1,
                ..self
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                month: self.month + 1,
                ..self
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiState {
    pub current_page: Page,
    pub auth_mode: AuthMode,
    pub month: YearMonth,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

impl UiState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            current_page: Page::default(),
            auth_mode: AuthMode::default(),
            month: YearMonth::of(today),
        }
    }

    pub fn select_page(&mut self, page: Page) {
        self.current_page = page;
    }

    pub fn toggle_auth_mode(&mut self) {
        self.auth_mode = match self.auth_mode {
            AuthMode::Login => AuthMode::Signup,
            AuthMode::Signup => AuthMode::Login,
        };
    }

    pub fn prev_month(&mut self) {
        self.month = self.month.prev();
    }

    pub fn next_month(&mut self) {
        self.month = self.month.next();
    }

    pub fn this_month(&mut self, today: NaiveDate) {
        self.month = YearMonth::of(today);
    }

    /// After a successful login.
    pub fn on_login(&mut self) {
        self.current_page = Page::Stats;
    }

    /// After a successful signup: back to the login form.
    pub fn on_signup(&mut self) {
        self.auth_mode = AuthMode::Login;
    }

    /// After logout.
    pub fn on_logout(&mut self) {
        self.current_page = Page::Stats;
        self.auth_mode = AuthMode::Login;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_navigation_wraps_years() {
        let mut ui = UiState::new(day(2024, 1, 15));
        ui.prev_month();
        assert_eq!(ui.month, YearMonth { year: 2023, month: 12 });
        ui.next_month();
        ui.next_month();
        assert_eq!(ui.month, YearMonth { year: 2024, month: 2 });

        ui.this_month(day(2025, 12, 31));
        ui.next_month();
        assert_eq!(ui.month, YearMonth { year: 2026, month: 1 });
    }

    #[test]
    fn test_auth_mode_toggle_and_resets() {
        let mut ui = UiState::new(day(2024, 1, 15));
        assert_eq!(ui.auth_mode, AuthMode::Login);
        ui.toggle_auth_mode();
        assert_eq!(ui.auth_mode, AuthMode::Signup);
        ui.on_signup();
        assert_eq!(ui.auth_mode, AuthMode::Login);

        ui.select_page(Page::Calendar);
        ui.on_logout();
        assert_eq!(ui.current_page, Page::Stats);
    }

    #[test]
    fn test_page_wire_names() {
        let page: Page = serde_json::from_str("\"calendar\"").unwrap();
        assert_eq!(page, Page::Calendar);
        assert_eq!(serde_json::to_string(&AuthMode::Signup).unwrap(), "\"signup\"");
    }
}
