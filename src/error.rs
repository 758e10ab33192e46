// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Corral

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Corral operations
pub type Result<T> = std::result::Result<T, CorralError>;

/// Corral error types
///
/// Only setup failures surface through this type. Oracle failures, unreadable
/// content and individual move failures are absorbed where they happen.
#[derive(Error, Debug)]
pub enum CorralError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Oracle not available: {0}")]
    OracleUnavailable(String),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid ignore pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
