//! Grade computation and roster statistics.
//!
//! This module is pure: it never reads files, the clock or configuration.
//! Weights, grade scales and thresholds are always passed in, and absent
//! values are carried as `None` rather than zero.

pub mod calculator;
pub mod grade;
pub mod report;
pub mod roster;
pub mod stats;
pub mod types;
pub mod utility;
