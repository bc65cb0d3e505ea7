//! Decoding of uploaded blobs into untyped sections.
//!
//! A blob is either a flat delimited text file (one section) or a workbook
//! (one section per sheet). Sections are plain grids of JSON values
//! (string, number or null); no column semantics are applied here.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐
//! │  SourceFile  │────▶│   FileFormat   │────▶│  Section(s)  │
//! │ (name+bytes) │     │ (tag/ext/magic)│     │    (grid)    │
//! └──────────────┘     └────────────────┘     └──────────────┘
//! ```

mod delimited;
mod workbook;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{ParseError, ParseResult};

pub use delimited::{decode_content, detect_delimiter, detect_encoding, parse_delimited, Delimited};
pub use workbook::parse_workbook;

/// Container formats accepted by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Single flat table (CSV, TSV, ...).
    Csv,
    /// Multi-sheet workbook (xlsx, xls, xlsb, ods).
    Workbook,
}

impl FileFormat {
    /// Guess from a file extension.
    pub fn from_extension(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(FileFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(FileFormat::Workbook),
            _ => None,
        }
    }

    /// Guess from leading bytes: ZIP (xlsx, ods) or OLE2 (xls) means workbook.
    pub fn sniff(bytes: &[u8]) -> Self {
        const ZIP: &[u8] = b"PK\x03\x04";
        const OLE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
        if bytes.starts_with(ZIP) || bytes.starts_with(OLE) {
            FileFormat::Workbook
        } else {
            FileFormat::Csv
        }
    }
}

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name, usually the original filename.
    pub name: String,
    /// Raw content.
    pub bytes: Vec<u8>,
    /// Explicit format tag; inferred when `None`.
    pub format: Option<FileFormat>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Read a file from disk.
    pub fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(name, bytes))
    }

    /// Tag, then extension, then magic bytes.
    pub fn resolved_format(&self) -> FileFormat {
        self.format
            .or_else(|| FileFormat::from_extension(&self.name))
            .unwrap_or_else(|| FileFormat::sniff(&self.bytes))
    }
}

/// One decoded sheet or flat table: rows of untyped cells.
///
/// Blank rows are dropped from `grid`; `lines` keeps the 1-based line (or
/// sheet row) each remaining row came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub grid: Vec<Vec<Value>>,
    pub lines: Vec<usize>,
}

impl Section {
    /// A section whose rows sit on consecutive lines from 1.
    pub fn contiguous(name: impl Into<String>, grid: Vec<Vec<Value>>) -> Self {
        let lines = (1..=grid.len()).collect();
        Self {
            name: name.into(),
            grid,
            lines,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Source line of the grid row at `index`.
    pub fn line_of(&self, index: usize) -> usize {
        self.lines.get(index).copied().unwrap_or(index + 1)
    }
}

/// A section with its header row applied: each row maps header → cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Header strings in column order.
    pub headers: Vec<String>,
    /// Data rows keyed by header.
    pub records: Vec<Map<String, Value>>,
    /// Source line of the header.
    pub header_line: usize,
    /// Source line of each record.
    pub record_lines: Vec<usize>,
}

impl RawTable {
    /// Build from a section, using grid row `header_idx` as the header row.
    pub fn from_section(section: &Section, header_idx: usize) -> Self {
        let mut table = Self::from_grid(&section.grid, header_idx);
        table.header_line = section.line_of(header_idx);
        table.record_lines = (header_idx + 1..section.grid.len())
            .map(|i| section.line_of(i))
            .collect();
        table
    }

    /// Build from a grid whose rows sit on consecutive lines.
    ///
    /// Blank headers are kept positionally but never keyed; when a header
    /// repeats, the first column with that name wins.
    pub fn from_grid(grid: &[Vec<Value>], header_idx: usize) -> Self {
        let headers: Vec<String> = grid
            .get(header_idx)
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default();

        let records = grid
            .iter()
            .skip(header_idx + 1)
            .map(|row| {
                let mut obj = Map::new();
                for (i, header) in headers.iter().enumerate() {
                    if header.is_empty() || obj.contains_key(header) {
                        continue;
                    }
                    let value = row.get(i).cloned().unwrap_or(Value::Null);
                    obj.insert(header.clone(), value);
                }
                obj
            })
            .collect();

        Self {
            headers,
            records,
            header_line: header_idx + 1,
            record_lines: (header_idx + 2..=grid.len()).collect(),
        }
    }

    /// Source line of the record at `index`.
    pub fn line_of(&self, index: usize) -> usize {
        self.record_lines
            .get(index)
            .copied()
            .unwrap_or(self.header_line + index + 1)
    }
}

/// Trimmed text rendering of a cell, empty for null.
///
/// Whole floats render without a fraction, so a workbook `840.0` reads the
/// same as a CSV `840`.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Decode a blob into its sections.
pub fn parse_file(file: &SourceFile) -> ParseResult<Vec<Section>> {
    if file.bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }

    match file.resolved_format() {
        FileFormat::Csv => {
            let Delimited { grid, lines, .. } = parse_delimited(&file.bytes)?;
            Ok(vec![Section {
                name: file.name.clone(),
                grid,
                lines,
            }])
        }
        FileFormat::Workbook => parse_workbook(&file.bytes),
    }
}

/// Whether every cell of a row is null or blank text.
pub(crate) fn is_blank_row(row: &[Value]) -> bool {
    row.iter().all(|v| match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_extension("ads.CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension("admob.xlsx"), Some(FileFormat::Workbook));
        assert_eq!(FileFormat::from_extension("legacy.xls"), Some(FileFormat::Workbook));
        assert_eq!(FileFormat::from_extension("report"), None);
        assert_eq!(FileFormat::from_extension("report.pdf"), None);
    }

    #[test]
    fn test_format_sniff() {
        assert_eq!(FileFormat::sniff(b"PK\x03\x04rest"), FileFormat::Workbook);
        assert_eq!(FileFormat::sniff(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1]), FileFormat::Workbook);
        assert_eq!(FileFormat::sniff(b"Country,Cost"), FileFormat::Csv);
    }

    #[test]
    fn test_tag_overrides_extension() {
        let file =
            SourceFile::new("export.xlsx", b"Country,Cost".to_vec()).with_format(FileFormat::Csv);
        assert_eq!(file.resolved_format(), FileFormat::Csv);

        let untagged = SourceFile::new("export", b"Country,Cost".to_vec());
        assert_eq!(untagged.resolved_format(), FileFormat::Csv);
    }

    #[test]
    fn test_raw_table_from_grid() {
        let grid = vec![
            vec![json!("Report"), Value::Null],
            vec![json!(" Country "), json!("Cost")],
            vec![json!("US"), json!(100)],
            vec![json!("FR")],
        ];

        let table = RawTable::from_grid(&grid, 1);
        assert_eq!(table.headers, vec!["Country", "Cost"]);
        assert_eq!(table.header_line, 2);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0]["Cost"], json!(100));
        assert_eq!(table.records[1]["Cost"], Value::Null);
        assert_eq!(table.line_of(0), 3);
    }

    #[test]
    fn test_raw_table_duplicate_header_first_wins() {
        let grid = vec![
            vec![json!("Country"), json!("Cost"), json!("Cost")],
            vec![json!("US"), json!(1), json!(2)],
        ];
        let table = RawTable::from_grid(&grid, 0);
        assert_eq!(table.records[0]["Cost"], json!(1));
    }

    #[test]
    fn test_raw_table_keeps_source_lines() {
        let section = Section {
            name: "ads.csv".into(),
            grid: vec![
                vec![json!("Country"), json!("Cost")],
                vec![json!("US"), json!("abc")],
            ],
            lines: vec![1, 3],
        };
        let table = RawTable::from_section(&section, 0);
        assert_eq!(table.header_line, 1);
        assert_eq!(table.line_of(0), 3);
    }

    #[test]
    fn test_cell_text_whole_floats() {
        assert_eq!(cell_text(&json!(840.0)), "840");
        assert_eq!(cell_text(&json!(840)), "840");
        assert_eq!(cell_text(&json!(2.5)), "2.5");
        assert_eq!(cell_text(&json!(" FR ")), "FR");
        assert_eq!(cell_text(&Value::Null), "");
    }

    #[test]
    fn test_empty_file_is_error() {
        let file = SourceFile::new("empty.csv", Vec::new());
        assert!(matches!(parse_file(&file), Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_csv_is_single_section() {
        let file = SourceFile::new("ads.csv", b"Country,Cost\nUS,10\n".to_vec());
        let sections = parse_file(&file).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "ads.csv");
        assert_eq!(sections[0].grid.len(), 2);
    }

    #[test]
    fn test_blank_row() {
        assert!(is_blank_row(&[Value::Null, json!("  ")]));
        assert!(!is_blank_row(&[Value::Null, json!(0)]));
    }
}
