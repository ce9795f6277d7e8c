//! Assignment summary computation.
//!
//! This module hosts the pure aggregation engine that turns items and
//! raw student responses into the derived summary views.

pub mod engine;

pub use engine::{compute_assignment_summary, GroupingThresholds, SummaryError, SummaryOptions};
