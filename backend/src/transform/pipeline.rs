//! High-level pipeline API: uploaded files in, reconciled table out.
//!
//! Runs every step in order: decode, resolve columns, normalize,
//! aggregate per category, and join. Files are processed one at a time in
//! input order; a file that fails never stops the others.
//!
//! # Example
//!
//! ```rust,ignore
//! use adrecon::{run, ReconConfig, SourceFile};
//!
//! let costs = vec![SourceFile::read("google_ads.xlsx")?];
//! let revenues = vec![SourceFile::read("admob.csv")?];
//!
//! let report = run(&costs, &revenues, &ReconConfig::default());
//! for warning in report.warnings() {
//!     eprintln!("{}", warning);
//! }
//! let table = report.into_result()?;
//! println!("{} countries", table.len());
//! ```

use serde::Serialize;

use super::aggregator::aggregate;
use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::loader::load;
use super::reconciler::reconcile;
use crate::config::ReconConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_error, log_info, log_success, Scope};
use crate::models::{AggregateTable, Category, KeyValueRow, ReconciledTable};
use crate::parser::{FileFormat, SourceFile};

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RunOutcome {
    /// Both categories had data and were joined.
    Reconciled { table: ReconciledTable },
    /// At least one category had no usable rows; no join was performed.
    InsufficientData { missing: Vec<Category> },
}

/// Per-file summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub name: String,
    pub category: Category,
    pub format: FileFormat,
    /// `false` when the file could not be decoded
    pub decoded: bool,
    pub sections: usize,
    pub matched_sections: usize,
    pub rows: usize,
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub outcome: RunOutcome,

    /// Cost summed per key
    pub cost_totals: AggregateTable,

    /// Revenue summed per key
    pub revenue_totals: AggregateTable,

    /// One entry per input file, costs first
    pub files: Vec<FileSummary>,

    /// Every skipped file, section and row
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    /// The reconciled table, if both sides had data.
    pub fn table(&self) -> Option<&ReconciledTable> {
        match &self.outcome {
            RunOutcome::Reconciled { table } => Some(table),
            RunOutcome::InsufficientData { .. } => None,
        }
    }

    /// File-level problems worth showing to a user.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    /// Unwrap into the table, or the insufficient-data error.
    pub fn into_result(self) -> PipelineResult<ReconciledTable> {
        match self.outcome {
            RunOutcome::Reconciled { table } => Ok(table),
            RunOutcome::InsufficientData { missing } => {
                Err(PipelineError::InsufficientData { missing })
            }
        }
    }
}

/// Reconcile cost files against revenue files.
///
/// Never fails part-way: undecodable files, unmatched sheets and bad rows
/// are recorded in [`RunReport::diagnostics`]. When either side ends up
/// with no rows the join is skipped and the outcome is
/// [`RunOutcome::InsufficientData`].
pub fn run(
    cost_files: &[SourceFile],
    revenue_files: &[SourceFile],
    config: &ReconConfig,
) -> RunReport {
    let mut files = Vec::new();
    let mut diagnostics = Vec::new();

    log_info(format!("📥 Loading {} cost file(s)...", cost_files.len()));
    let cost_rows = collect(cost_files, Category::Cost, config, &mut files, &mut diagnostics);

    log_info(format!("📥 Loading {} revenue file(s)...", revenue_files.len()));
    let revenue_rows = collect(
        revenue_files,
        Category::Revenue,
        config,
        &mut files,
        &mut diagnostics,
    );

    log_info("➕ Aggregating per key...");
    let cost_totals = aggregate(cost_rows);
    let revenue_totals = aggregate(revenue_rows);
    log_success(format!(
        "{} cost keys, {} revenue keys",
        cost_totals.len(),
        revenue_totals.len()
    ));

    let mut missing = Vec::new();
    if cost_totals.is_empty() {
        missing.push(Category::Cost);
    }
    if revenue_totals.is_empty() {
        missing.push(Category::Revenue);
    }

    let outcome = if missing.is_empty() {
        log_info("🔗 Joining cost and revenue...");
        let table = reconcile(&cost_totals, &revenue_totals);
        log_success(format!("{} keys reconciled", table.len()));
        RunOutcome::Reconciled { table }
    } else {
        let err = PipelineError::InsufficientData { missing: missing.clone() };
        log_error(err.to_string());
        RunOutcome::InsufficientData { missing }
    };

    RunReport {
        outcome,
        cost_totals,
        revenue_totals,
        files,
        diagnostics,
    }
}

/// Load every file of one category, in input order.
fn collect(
    sources: &[SourceFile],
    category: Category,
    config: &ReconConfig,
    files: &mut Vec<FileSummary>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<KeyValueRow> {
    let mut rows = Vec::new();

    for file in sources {
        let format = file.resolved_format();
        let scope = Scope::file(&file.name, category);
        scope.info(format!("📄 {} ({:?})", file.name, format));

        match load(file, category, config) {
            Ok(loaded) => {
                for d in loaded.diagnostics.iter().filter(|d| d.is_warning()) {
                    scope.warning(d.to_string());
                }
                let skipped = loaded.diagnostics.len();
                if skipped > 0 {
                    scope.info(format!("{} rows/sections skipped", skipped));
                }

                files.push(FileSummary {
                    name: file.name.clone(),
                    category,
                    format,
                    decoded: true,
                    sections: loaded.sections.len(),
                    matched_sections: loaded.sections.iter().filter(|s| s.matched()).count(),
                    rows: loaded.rows.len(),
                });
                diagnostics.extend(loaded.diagnostics);
                rows.extend(loaded.rows);
            }
            Err(e) => {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::DecodeFailed,
                    &file.name,
                    category,
                    e.to_string(),
                );
                scope.warning(diagnostic.to_string());

                files.push(FileSummary {
                    name: file.name.clone(),
                    category,
                    format,
                    decoded: false,
                    sections: 0,
                    matched_sections: 0,
                    rows: 0,
                });
                diagnostics.push(diagnostic);
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn csv(name: &str, content: &str) -> SourceFile {
        SourceFile::new(name, content.as_bytes().to_vec())
    }

    #[test]
    fn test_cost_and_revenue_scenario() {
        let costs = vec![csv("ads.csv", "Country,Cost\nUS,100\nFR,50\n")];
        let revenues = vec![csv("admob.csv", "Country,Estimated revenue\nUS,150\nDE,20\n")];

        let report = run(&costs, &revenues, &ReconConfig::default());
        let table = report.table().unwrap();
        assert_eq!(table.len(), 3);

        let us = table.get("US").unwrap();
        assert_eq!((us.cost, us.revenue, us.profit_loss), (100.0, 150.0, 50.0));
        let fr = table.get("FR").unwrap();
        assert_eq!((fr.cost, fr.revenue, fr.profit_loss), (50.0, 0.0, -50.0));
        let de = table.get("DE").unwrap();
        assert_eq!((de.cost, de.revenue, de.profit_loss), (0.0, 20.0, 20.0));
        assert_eq!(de.roi, None);
    }

    #[test]
    fn test_sections_summed_across_sheets() {
        let mut workbook = Workbook::new();
        for name in ["Search", "Display"] {
            let sheet = workbook.add_worksheet();
            sheet.set_name(name).unwrap();
            sheet.write_string(0, 0, "Country").unwrap();
            sheet.write_string(0, 1, "Cost").unwrap();
            sheet.write_string(1, 0, "JP").unwrap();
            sheet.write_number(1, 1, 30.0).unwrap();
            sheet.write_string(2, 0, "JP").unwrap();
            sheet.write_number(2, 1, 20.0).unwrap();
        }
        let costs = vec![SourceFile::new("ads.xlsx", workbook.save_to_buffer().unwrap())];
        let revenues = vec![csv("admob.csv", "Country,Revenue\nJP,10\n")];

        let report = run(&costs, &revenues, &ReconConfig::default());
        assert_eq!(report.cost_totals.get("JP"), Some(100.0));
        assert_eq!(report.files[0].matched_sections, 2);
        assert_eq!(report.files[0].rows, 4);
    }

    #[test]
    fn test_vendor_header_names() {
        let costs = vec![csv("ads.csv", "Country,Spend ($)\nUS,\"$1,234.56\"\n")];
        let revenues = vec![csv("admob.csv", "Country,Estimated Revenue\nUS,\"1,000\"\n")];

        let table = run(&costs, &revenues, &ReconConfig::default()).into_result().unwrap();
        let us = table.get("US").unwrap();
        assert_eq!(us.cost, 1234.56);
        assert_eq!(us.revenue, 1000.0);
    }

    #[test]
    fn test_all_cost_files_undecodable() {
        let costs = vec![
            SourceFile::new("a.xlsx", b"garbage".to_vec()),
            SourceFile::new("b.xlsx", Vec::new()),
        ];
        let revenues = vec![csv("admob.csv", "Country,Revenue\nUS,10\n")];

        let report = run(&costs, &revenues, &ReconConfig::default());
        assert_eq!(
            report.outcome,
            RunOutcome::InsufficientData { missing: vec![Category::Cost] }
        );
        assert!(report.table().is_none());
        assert!(report.cost_totals.is_empty());
        assert_eq!(report.revenue_totals.get("US"), Some(10.0));

        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|d| d.kind == DiagnosticKind::DecodeFailed));
        assert!(report.files.iter().filter(|f| f.category == Category::Cost).all(|f| !f.decoded));

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { .. }));
    }

    #[test]
    fn test_accented_key_joins_across_formats() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Country").unwrap();
        sheet.write_string(0, 1, "Cost").unwrap();
        sheet.write_string(1, 0, "Côte d'Ivoire").unwrap();
        sheet.write_number(1, 1, 5.0).unwrap();
        let costs = vec![SourceFile::new("ads.xlsx", workbook.save_to_buffer().unwrap())];
        let revenues = vec![csv("admob.csv", "Country,Revenue\nCôte d'Ivoire,8\nCuraçao,1\n")];

        let table = run(&costs, &revenues, &ReconConfig::default()).into_result().unwrap();
        assert_eq!(table.len(), 2);
        let ci = table.get("Côte d'Ivoire").unwrap();
        assert_eq!((ci.cost, ci.revenue), (5.0, 8.0));
        assert!(table.get("Curaçao").is_some());
    }

    #[test]
    fn test_numeric_keys_join_across_formats() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Geo").unwrap();
        sheet.write_string(0, 1, "Spent").unwrap();
        sheet.write_number(1, 0, 840.0).unwrap();
        sheet.write_number(1, 1, 4.0).unwrap();
        let costs = vec![SourceFile::new("ads.xlsx", workbook.save_to_buffer().unwrap())];
        let revenues = vec![csv("admob.csv", "Geo,Earnings\n840,6\n")];

        let table = run(&costs, &revenues, &ReconConfig::default()).into_result().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("840").unwrap().profit_loss, 2.0);
    }

    #[test]
    fn test_no_files_on_either_side() {
        let report = run(&[], &[], &ReconConfig::default());
        assert_eq!(
            report.outcome,
            RunOutcome::InsufficientData { missing: vec![Category::Cost, Category::Revenue] }
        );
    }

    #[test]
    fn test_bad_file_does_not_stop_others() {
        let costs = vec![
            SourceFile::new("broken.xls", b"\xD0\xCF\x11\xE0 truncated".to_vec()),
            csv("ads.csv", "Country,Cost\nUS,5\n"),
        ];
        let revenues = vec![csv("admob.csv", "Country,Revenue\nUS,8\n")];

        let report = run(&costs, &revenues, &ReconConfig::default());
        assert_eq!(report.warnings().count(), 1);
        let us = report.table().unwrap().get("US").unwrap();
        assert_eq!(us.profit_loss, 3.0);
    }

    #[test]
    fn test_total_rows_never_reach_output() {
        let costs = vec![csv("ads.csv", "Country,Cost\nUS,5\nTotal,5\n")];
        let revenues = vec![csv("admob.csv", "Country,Revenue\nUS,8\nTOTAL,8\n")];

        let report = run(&costs, &revenues, &ReconConfig::default());
        assert!(!report.cost_totals.contains_key("Total"));
        assert!(!report.revenue_totals.contains_key("TOTAL"));
        let table = report.table().unwrap();
        assert!(table.rows.iter().all(|r| !r.key.eq_ignore_ascii_case("total")));
        assert_eq!(
            report.diagnostics.iter().filter(|d| d.kind == DiagnosticKind::ReservedLabel).count(),
            2
        );
    }

    #[test]
    fn test_report_serialization() {
        let costs = vec![csv("ads.csv", "Country,Cost\nUS,5\n")];
        let revenues = vec![csv("admob.csv", "Country,Revenue\nUS,8\n")];

        let json = serde_json::to_value(run(&costs, &revenues, &ReconConfig::default())).unwrap();
        assert_eq!(json["outcome"]["status"], "reconciled");
        assert_eq!(json["outcome"]["table"]["rows"][0]["profitLoss"], 3.0);
        assert_eq!(json["costTotals"]["US"], 5.0);
    }
}
