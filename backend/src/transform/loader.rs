//! Table loading: one uploaded file → normalized rows of one category.
//!
//! Each section (sheet) is handled on its own. A section whose key or value
//! column cannot be resolved is skipped; the file keeps going. The same
//! country may appear in several sections and is kept once per section:
//! summing is the aggregator's job.

use serde::Serialize;

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::normalizer::normalize;
use super::resolver::{resolve_position, resolve_position_excluding};
use crate::config::ReconConfig;
use crate::error::ParseResult;
use crate::logs::Scope;
use crate::models::{Category, KeyValueRow};
use crate::parser::{cell_text, parse_file, RawTable, Section, SourceFile};

/// Rows and skips produced by one file.
#[derive(Debug, Default)]
pub struct Loaded {
    pub rows: Vec<KeyValueRow>,
    pub diagnostics: Vec<Diagnostic>,
    pub sections: Vec<SectionInfo>,
}

/// How one section was interpreted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInfo {
    pub name: String,
    /// Headers of the detected header row (or the first row when none matched)
    pub headers: Vec<String>,
    pub key_column: Option<String>,
    pub value_column: Option<String>,
    /// 1-based header line, when both columns resolved
    pub header_line: Option<usize>,
    pub rows: usize,
}

impl SectionInfo {
    pub fn matched(&self) -> bool {
        self.key_column.is_some() && self.value_column.is_some()
    }
}

/// Where a section's header row is and which columns it resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderMatch {
    /// 0-based row index in the section grid
    pub row: usize,
    pub key: usize,
    pub value: usize,
}

/// Find the header row: the first of the leading `scan_rows` rows where both
/// the key column and the category's value column resolve.
pub fn locate_header(
    section: &Section,
    category: Category,
    config: &ReconConfig,
) -> Option<HeaderMatch> {
    section
        .grid
        .iter()
        .take(config.scan_rows())
        .enumerate()
        .find_map(|(row, cells)| {
            let headers: Vec<String> = cells.iter().map(cell_text).collect();
            let key = resolve_position(&headers, &config.key_candidates)?;
            let candidates = config.candidates_for(category);
            let value = resolve_position_excluding(&headers, candidates, Some(key))?;
            Some(HeaderMatch { row, key, value })
        })
}

/// Decode a file and normalize every section whose columns resolve.
///
/// Only a file that cannot be decoded at all is an error; the caller turns
/// it into a diagnostic.
pub fn load(file: &SourceFile, category: Category, config: &ReconConfig) -> ParseResult<Loaded> {
    let sections = parse_file(file)?;
    let mut loaded = Loaded::default();

    for section in &sections {
        let info = load_section(file, section, category, config, &mut loaded);
        loaded.sections.push(info);
    }

    if !loaded.sections.iter().any(SectionInfo::matched) {
        loaded.diagnostics.push(Diagnostic::new(
            DiagnosticKind::NoUsableSections,
            &file.name,
            category,
            format!(
                "no sheet has both a key column ({}) and a {} column ({})",
                config.key_candidates.join("/"),
                category,
                config.candidates_for(category).join("/"),
            ),
        ));
    }

    Ok(loaded)
}

fn load_section(
    file: &SourceFile,
    section: &Section,
    category: Category,
    config: &ReconConfig,
    loaded: &mut Loaded,
) -> SectionInfo {
    let mut info = SectionInfo {
        name: section.name.clone(),
        headers: Vec::new(),
        key_column: None,
        value_column: None,
        header_line: None,
        rows: 0,
    };

    if section.is_empty() {
        loaded.diagnostics.push(
            Diagnostic::new(DiagnosticKind::EmptySection, &file.name, category, "no rows")
                .with_section(&section.name),
        );
        return info;
    }

    let Some(found) = locate_header(section, category, config) else {
        info.headers = section.grid[0].iter().map(cell_text).collect();
        let key = resolve_position(&info.headers, &config.key_candidates);
        info.key_column = key.map(|i| info.headers[i].clone());

        let missing = if key.is_none() { "key".to_string() } else { category.to_string() };
        loaded.diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::ColumnsNotFound,
                &file.name,
                category,
                format!(
                    "no {} column in the first {} rows (headers: {})",
                    missing,
                    config.scan_rows(),
                    info.headers.join(", ")
                ),
            )
            .with_section(&section.name),
        );
        return info;
    };

    let table = RawTable::from_section(section, found.row);
    let key_header = table.headers[found.key].clone();
    let value_header = table.headers[found.value].clone();

    let scope = Scope::file(&file.name, category).section(&section.name);
    scope.info(format!("{} → key, {} → {}", key_header, value_header, category));

    let normalized = normalize(&table, &key_header, &value_header, config);

    for skip in normalized.skipped {
        loaded.diagnostics.push(
            Diagnostic::new(skip.kind, &file.name, category, skip.reason)
                .with_section(&section.name)
                .with_row(skip.row),
        );
    }

    scope.success(format!("{} rows", normalized.rows.len()));

    info.rows = normalized.rows.len();
    info.header_line = Some(table.header_line);
    info.key_column = Some(key_header);
    info.value_column = Some(value_header);
    info.headers = table.headers;
    loaded.rows.extend(normalized.rows);

    info
}
