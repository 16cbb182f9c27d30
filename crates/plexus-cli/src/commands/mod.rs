//! CLI command implementations.

pub mod check;
pub mod common;
pub mod plan;
pub mod schedule;
