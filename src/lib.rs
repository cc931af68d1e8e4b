// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendance Tracker: per-subject class attendance for students
//!
//! This crate provides the backend API: accounts, subject lists, dated
//! attendance records and the statistics and screens derived from them.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod view;

use config::Config;
use services::SessionRegistry;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub registry: SessionRegistry,
}
