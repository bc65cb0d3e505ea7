//! Reconciliation pipeline.
//!
//! - Resolver: find key/value columns by candidate fragments
//! - Normalizer: project and coerce rows, drop summary rows
//! - Loader: one file (one or many sheets) → rows of one category
//! - Aggregator: sum per key
//! - Reconciler: outer join of cost and revenue
//! - Pipeline: runs all of the above and collects diagnostics

pub mod aggregator;
pub mod diagnostics;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod reconciler;
pub mod resolver;

pub use aggregator::aggregate;
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use loader::{load, locate_header, HeaderMatch, Loaded, SectionInfo};
pub use normalizer::{coerce_number, normalize, Normalized, SkippedRow};
pub use pipeline::{run, FileSummary, RunOutcome, RunReport};
pub use reconciler::reconcile;
pub use resolver::{resolve, resolve_position, resolve_position_excluding};
