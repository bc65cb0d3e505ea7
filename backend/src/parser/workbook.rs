//! Multi-sheet workbook decoding (xlsx, xlsb, xls, ods) via calamine.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Number, Value};
use std::io::Cursor;

use super::{is_blank_row, Section};
use crate::error::ParseResult;

/// Decode every sheet of a workbook, in workbook order.
///
/// A sheet that cannot be read fails the whole file, as does a corrupt
/// container.
pub fn parse_workbook(bytes: &[u8]) -> ParseResult<Vec<Section>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sections = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = workbook.worksheet_range(&name)?;
        // Ranges start at the first used cell, not necessarily at A1
        let first_row = range.start().map_or(0, |(row, _)| row as usize);

        let (grid, lines): (Vec<Vec<Value>>, Vec<usize>) = range
            .rows()
            .enumerate()
            .map(|(i, row)| (row.iter().map(cell_value).collect(), first_row + i + 1))
            .filter(|(row, _): &(Vec<Value>, usize)| !is_blank_row(row))
            .unzip();

        sections.push(Section { name, grid, lines });
    }

    Ok(sections)
}

/// Map a calamine cell to an untyped value.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::String(s) => Value::String(s.trim().to_string()),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => number(*f),
        Data::Bool(b) => Value::String(b.to_string()),
        Data::DateTime(dt) => number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

fn number(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
