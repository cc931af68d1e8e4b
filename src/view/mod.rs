// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View layer: UI selection, screen rendering and intent dispatch.

pub mod intent;
pub mod screen;
pub mod ui_state;

pub use intent::{dispatch, Intent};
pub use screen::{render, Screen};
pub use ui_state::{AuthMode, Page, UiState, YearMonth};
