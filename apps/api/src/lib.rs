//! SGIRP API Library
//!
//! Internal HR management backend: users and roles, teams, leave requests
//! with balance accrual, and weekly timesheets with manager validation.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod state;
pub mod telemetry;
