//! Row normalization: project (key, value) columns into [`KeyValueRow`]s.
//!
//! ```text
//! RawTable rows                          KeyValueRows
//! ┌──────────┬──────────┬────────┐      ┌──────┬─────────┐
//! │ Country  │ Cost ($) │ Clicks │      │ key  │ value   │
//! ├──────────┼──────────┼────────┤  →   ├──────┼─────────┤
//! │ " US "   │ $1,234.5 │ 12     │      │ US   │ 1234.5  │
//! │ Total    │ 1,234.5  │ 12     │      └──────┴─────────┘
//! │ FR       │ n/a      │ 3      │      skipped: Total, FR
//! └──────────┴──────────┴────────┘
//! ```
//!
//! A row that cannot be used is skipped and recorded, never fatal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::diagnostics::DiagnosticKind;
use crate::config::ReconConfig;
use crate::models::KeyValueRow;
use crate::parser::{cell_text, RawTable};

/// Everything except digits, decimal point and minus sign.
static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("static pattern is valid"));

/// Result of normalizing one table.
#[derive(Debug, Default)]
pub struct Normalized {
    /// Usable rows, in table order
    pub rows: Vec<KeyValueRow>,
    /// Rows dropped, with the reason
    pub skipped: Vec<SkippedRow>,
}

/// A row that was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based file line, or sheet row, including blank rows
    pub row: usize,
    pub kind: DiagnosticKind,
    pub reason: String,
}

/// Coerce a cell to a finite number.
///
/// Numbers pass through. Text is stripped of currency symbols, thousands
/// separators and anything else that is not a digit, `.` or `-` before
/// parsing, so `"$1,234.50"` becomes `1234.5`. Returns `None` for empty
/// cells and text with no parseable number.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned = NON_NUMERIC.replace_all(s, "");
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Project `key_header` / `value_header` of every record into [`KeyValueRow`]s.
///
/// Keys are trimmed but otherwise kept as written. Rows with an empty key,
/// a reserved summary label, or a non-numeric value are skipped.
pub fn normalize(
    table: &RawTable,
    key_header: &str,
    value_header: &str,
    config: &ReconConfig,
) -> Normalized {
    let mut result = Normalized::default();

    for (idx, record) in table.records.iter().enumerate() {
        let line = table.line_of(idx);
        let key = record.get(key_header).map(cell_text).unwrap_or_default();

        if key.is_empty() {
            result.skipped.push(SkippedRow {
                row: line,
                kind: DiagnosticKind::MissingKey,
                reason: format!("no value in '{}'", key_header),
            });
            continue;
        }

        if config.is_reserved(&key) {
            result.skipped.push(SkippedRow {
                row: line,
                kind: DiagnosticKind::ReservedLabel,
                reason: format!("summary row '{}'", key),
            });
            continue;
        }

        let raw = record.get(value_header);
        match raw.and_then(coerce_number) {
            Some(value) => result.rows.push(KeyValueRow::new(key, value)),
            None => result.skipped.push(SkippedRow {
                row: line,
                kind: DiagnosticKind::InvalidValue,
                reason: format!(
                    "'{}' in '{}' is not a number",
                    raw.map(cell_text).unwrap_or_default(),
                    value_header
                ),
            }),
        }
    }

    result
}
