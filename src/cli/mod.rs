//! CLI support for jsonsift
//!
//! Provides programmatic access to the `sift` commands so other tools can
//! embed them without spawning a process.

mod patch;
mod select;

pub use patch::{PatchOptions, execute_patch};
pub use select::{SelectOptions, SelectResult, execute_select};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Query compilation error
    #[error("Query error: {0}")]
    Query(#[from] crate::JsonPathError),

    /// JSON parsing error
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No input provided
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}
