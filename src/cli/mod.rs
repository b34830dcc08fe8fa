//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand.

mod rubric;
mod score;

pub use rubric::{run_rubric_show, run_rubric_validate, RubricShowFormat};
pub use score::run_score;

// Re-export config types used by handlers
pub use crate::config::ScoreRunConfig;
