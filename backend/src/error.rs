//! Error types for the reconciliation pipeline.
//!
//! This module defines the error hierarchy:
//!
//! - [`ParseError`] - A whole file could not be decoded
//! - [`ConfigError`] - Invalid or unreadable configuration
//! - [`PipelineError`] - Top-level run errors
//!
//! Most failures in this crate are *not* errors: bad rows, unmatched
//! sections and undecodable files are recovered locally and reported as
//! [`crate::transform::Diagnostic`] entries. Only the conditions below
//! are surfaced through `Result`.

use thiserror::Error;

use crate::models::Category;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors while decoding one uploaded file into sections.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The blob has no content at all.
    #[error("File is empty")]
    EmptyFile,

    /// Text could not be decoded with the detected encoding.
    #[error("Failed to decode text: {0}")]
    EncodingError(String),

    /// Malformed delimited text.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook container could not be opened or a sheet could not be read.
    #[error("Unreadable workbook: {0}")]
    Workbook(String),
}

impl From<calamine::Error> for ParseError {
    fn from(e: calamine::Error) -> Self {
        ParseError::Workbook(e.to_string())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or validating a [`crate::config::ReconConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid JSON for the expected shape.
    #[error("Invalid config JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A candidate list has no fragments.
    #[error("Candidate list '{0}' is empty")]
    EmptyCandidates(&'static str),

    /// A candidate fragment is blank and would match every header.
    #[error("Candidate list '{0}' contains a blank fragment")]
    BlankFragment(&'static str),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors of a reconciliation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One or both categories produced no usable rows.
    #[error("Insufficient data: no usable {} rows", format_categories(.missing))]
    InsufficientData { missing: Vec<Category> },

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

fn format_categories(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
