//! Report generation.
//!
//! Renders an `AssignmentSummary` as a Markdown report for teachers or
//! as JSON matching the platform's wire contract.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report, ReportOptions};
