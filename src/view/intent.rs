// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User intents and their dispatch.
//!
//! Each intent performs exactly one session operation or one UI
//! transition.

use chrono::NaiveDate;
use serde::Deserialize;

use super::ui_state::{Page, UiState};
use crate::error::Result;
use crate::models::Credentials;
use crate::services::session::{NewRecord, Session};

/// A user action. Not `Debug`: login and signup carry passwords.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    // ─── UI only ─────────────────────────────────────────────────
    SelectPage { page: Page },
    ToggleAuthMode,
    PrevMonth,
    NextMonth,
    ThisMonth,

    // ─── Session ─────────────────────────────────────────────────
    Login {
        email: String,
        password: String,
    },
    Signup {
        email: String,
        password: String,
        name: String,
    },
    Logout,
    AddSubject { name: String },
    DeleteSubject { index: usize },
    AddRecord(NewRecord),
    DeleteRecord { key: String },
    UpdateName { name: String },
}

impl Intent {
    /// Short label for logs (never includes credentials).
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::SelectPage { .. } => "select_page",
            Intent::ToggleAuthMode => "toggle_auth_mode",
            Intent::PrevMonth => "prev_month",
            Intent::NextMonth => "next_month",
            Intent::ThisMonth => "this_month",
            Intent::Login { .. } => "login",
            Intent::Signup { .. } => "signup",
            Intent::Logout => "logout",
            Intent::AddSubject { .. } => "add_subject",
            Intent::DeleteSubject { .. } => "delete_subject",
            Intent::AddRecord(_) => "add_record",
            Intent::DeleteRecord { .. } => "delete_record",
            Intent::UpdateName { .. } => "update_name",
        }
    }
}

/// Apply an intent. On error the UI selection is left as it was.
pub async fn dispatch(
    session: &mut Session,
    ui: &mut UiState,
    intent: Intent,
    today: NaiveDate,
) -> Result<()> {
    tracing::debug!(intent = intent.kind(), "Dispatching intent");

    match intent {
        Intent::SelectPage { page } => ui.select_page(page),
        Intent::ToggleAuthMode => ui.toggle_auth_mode(),
        Intent::PrevMonth => ui.prev_month(),
        Intent::NextMonth => ui.next_month(),
        Intent::ThisMonth => ui.this_month(today),

        Intent::Login { email, password } => {
            session.login(&Credentials::new(email, password)).await?;
            ui.on_login();
        }
        Intent::Signup {
            email,
            password,
            name,
        } => {
            session
                .signup(&Credentials::new(email, password), &name)
                .await?;
            ui.on_signup();
        }
        Intent::Logout => {
            session.logout().await?;
            ui.on_logout();
        }
        Intent::AddSubject { name } => session.add_subject(&name).await?,
        Intent::DeleteSubject { index } => {
            session.delete_subject(index).await?;
        }
        Intent::AddRecord(entry) => {
            session.add_record(&entry).await?;
        }
        Intent::DeleteRecord { key } => {
            session.delete_record(&key).await?;
        }
        Intent::UpdateName { name } => session.update_name(&name).await?,
    }

    Ok(())
}
