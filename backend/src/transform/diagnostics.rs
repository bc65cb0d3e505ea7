//! Structured record of everything a run skipped.
//!
//! Every skip (bad row, unmatched section, unreadable file) produces one
//! [`Diagnostic`], returned alongside the result.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Category;

/// How much a skip matters to the person reading the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected noise: summary rows, blank sheets, single bad cells.
    Info,
    /// A whole file contributed nothing.
    Warning,
}

/// What was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// The file could not be decoded at all.
    DecodeFailed,
    /// No file section had both a key and a value column.
    NoUsableSections,
    /// A section lacked a key or value column.
    ColumnsNotFound,
    /// A section had no rows.
    EmptySection,
    /// A value cell was not numeric after stripping formatting.
    InvalidValue,
    /// A row had no key.
    MissingKey,
    /// A vendor summary row ("Total").
    ReservedLabel,
}

/// One skipped file, section or row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub file: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// 1-based file line, or sheet row, including blank rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        file: impl Into<String>,
        category: Category,
        message: impl Into<String>,
    ) -> Self {
        let severity = match kind {
            DiagnosticKind::DecodeFailed | DiagnosticKind::NoUsableSections => Severity::Warning,
            _ => Severity::Info,
        };
        Self {
            severity,
            kind,
            file: file.into(),
            category,
            section: None,
            row: None,
            message: message.into(),
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file '{}'", self.category, self.file)?;
        if let Some(ref section) = self.section {
            if section != &self.file {
                write!(f, ", sheet '{}'", section)?;
            }
        }
        if let Some(row) = self.row {
            write!(f, ", line {}", row)?;
        }
        write!(f, ": {}", self.message)
    }
}
