//! # Resgraph Inspector
//!
//! Library half of the `resgraph` binary: fixture parsing, the replay and
//! configuration commands, and their serializable reports.

pub mod cli;
pub mod fixture;
pub mod report;
