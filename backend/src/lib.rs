//! # Adrecon - Ad cost vs ad revenue reconciliation
//!
//! Adrecon takes spreadsheet exports from an ad-spend source (e.g. Google Ads)
//! and an ad-revenue source (e.g. AdMob), works out which columns hold the
//! country and the amount, sums amounts per country, and joins both sides
//! into a profit/loss and ROI table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ CSV / XLSX  │───▶│   Parser    │───▶│   Loader    │───▶│ Aggregator  │───▶│ Reconciler  │
//! │   blobs     │    │ (sections)  │    │ (resolve +  │    │ (sum/key)   │    │ (outer join)│
//! └─────────────┘    └─────────────┘    │  normalize) │    └─────────────┘    └─────────────┘
//!                                       └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use adrecon::{run, ReconConfig, SourceFile};
//!
//! let report = run(
//!     &[SourceFile::read("ads.xlsx")?],
//!     &[SourceFile::read("admob.csv")?],
//!     &ReconConfig::default(),
//! );
//! let table = report.into_result()?;
//! for row in table.sorted_by_profit() {
//!     println!("{}: {:.2}", row.key, row.profit_loss);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`config`] - Candidate fragment lists and tunables
//! - [`models`] - Domain models (KeyValueRow, AggregateTable, ReconciledTable)
//! - [`parser`] - CSV and workbook decoding
//! - [`transform`] - Resolver, normalizer, loader, aggregator, reconciler, pipeline
//! - [`logs`] - Progress log feed

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Decoding
pub mod parser;

// Pipeline
pub mod transform;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Errors and config
// =============================================================================

pub use config::ReconConfig;
pub use error::{ConfigError, ParseError, PipelineError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{AggregateTable, Category, KeyValueRow, ReconciledRow, ReconciledTable, Totals};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{parse_file, FileFormat, RawTable, Section, SourceFile};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    aggregate, load, normalize, reconcile, resolve, run, Diagnostic, DiagnosticKind, FileSummary,
    RunOutcome, RunReport, Severity,
};
