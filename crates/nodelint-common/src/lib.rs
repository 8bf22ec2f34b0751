//! Common types and utilities for the nodelint analyzer.
//!
//! This crate provides the pieces every other crate leans on:
//! - The diagnostic sink (`trace`/`suggest`/`warn`/`error`/`fatal`) with
//!   process-wide counters
//! - The three-valued `Tribool` used by best-effort queries

pub mod reporting;
pub use reporting::{FileLocation, ReportingStats};

pub mod tribool;
pub use tribool::Tribool;
