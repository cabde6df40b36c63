//! Attendance risk analytics and achievement rules.
//!
//! The [`analytics`] module holds the computation core; [`config`], [`error`],
//! and [`telemetry`] carry the application plumbing shared with the API service.

pub mod analytics;
pub mod config;
pub mod error;
pub mod telemetry;
