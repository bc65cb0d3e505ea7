//! Delimited text decoding with encoding and delimiter auto-detection.

use serde_json::Value;

use super::is_blank_row;
use crate::error::{ParseError, ParseResult};

/// Delimiters considered by [`detect_delimiter`], in tie-break order.
const SEPARATORS: [char; 4] = [',', ';', '\t', '|'];

/// Leading lines inspected when guessing the delimiter.
const DELIMITER_SAMPLE_LINES: usize = 5;

/// Result of decoding a delimited file, with metadata.
#[derive(Debug, Clone)]
pub struct Delimited {
    /// Non-blank rows, cells as trimmed strings
    pub grid: Vec<Vec<Value>>,
    /// 1-based file line of each grid row
    pub lines: Vec<usize>,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes.
///
/// A byte-order mark wins, then valid UTF-8; chardet only guesses for the rest.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(bytes) {
        return encoding.name().to_lowercase();
    }

    // chardet misreads short UTF-8 exports with accented names as Latin-1
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "utf-16le" | "utf-16" => "utf-16le".to_string(),
        "utf-16be" => "utf-16be".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding label.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ParseResult<String> {
    let label = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-15".to_string(),
        other => other.to_string(),
    };

    let Some(enc) = encoding_rs::Encoding::for_label(label.as_bytes()) else {
        // Unknown label: lossy UTF-8
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    };

    // decode() sniffs and strips a BOM itself
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors && enc != encoding_rs::UTF_8 {
        return Err(ParseError::EncodingError(format!(
            "invalid byte sequence for {}",
            enc.name()
        )));
    }
    Ok(text.into_owned())
}

/// Detect the delimiter by counting occurrences over the first lines.
///
/// Report banners above the header usually have no delimiter at all, so a
/// single-line count is not enough. Separators inside double-quoted fields
/// are not counted, so `"1,234.00"` does not vote for comma. Defaults to comma.
pub fn detect_delimiter(content: &str) -> char {
    let sample: Vec<&str> = content.lines().take(DELIMITER_SAMPLE_LINES).collect();

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &SEPARATORS {
        let count: usize = sample.iter().map(|line| count_unquoted(line, sep)).sum();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Occurrences of `sep` outside double quotes.
fn count_unquoted(line: &str, sep: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Decode delimited bytes with auto-detection of encoding and delimiter.
pub fn parse_delimited(bytes: &[u8]) -> ParseResult<Delimited> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let (grid, lines) = parse_with_delimiter(&content, delimiter)?;

    Ok(Delimited {
        grid,
        lines,
        encoding,
        delimiter,
    })
}

/// Rows of cells plus the 1-based file line each row starts on.
type Grid = (Vec<Vec<Value>>, Vec<usize>);

/// Split text into rows of trimmed string cells, skipping blank lines.
fn parse_with_delimiter(content: &str, delimiter: char) -> ParseResult<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let bytes = content.as_bytes();
    let mut grid = Vec::new();
    let mut lines = Vec::new();
    let (mut scanned, mut line) = (0, 1);

    for record in reader.records() {
        let record = record?;

        // A record's position is taken before blank lines are skipped
        let mut start = record
            .position()
            .map_or(scanned, |p| p.byte() as usize)
            .clamp(scanned, bytes.len());
        while start < bytes.len() && matches!(bytes[start], b'\n' | b'\r') {
            start += 1;
        }
        line += bytes[scanned..start].iter().filter(|&&b| b == b'\n').count();
        scanned = start;

        let row: Vec<Value> = record
            .iter()
            .map(|field| Value::String(field.to_string()))
            .collect();
        if !is_blank_row(&row) {
            grid.push(row);
            lines.push(line);
        }
    }

    Ok((grid, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_csv() {
        let result = parse_delimited(b"Country;Cost\nUS;30\nFR;25").unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.grid.len(), 3);
        assert_eq!(result.grid[1], vec![json!("US"), json!("30")]);
    }

    #[test]
    fn test_quoted_thousands_separator() {
        let result = parse_delimited(b"Country,Cost\n\"US\",\"$1,234.50\"\n").unwrap();

        assert_eq!(result.delimiter, ',');
        assert_eq!(result.grid[1][1], json!("$1,234.50"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let result = parse_delimited(b"a,b\n1,2\n\n,\n3,4\n").unwrap();
        assert_eq!(result.grid.len(), 3);
        assert_eq!(result.lines, vec![1, 2, 5]);
    }

    #[test]
    fn test_semicolon_with_quoted_thousands() {
        let content = "Country;Cost\nUS;\"1,234,567.00\"\nFR;\"2,000.00\"\n";
        assert_eq!(detect_delimiter(content), ';');

        let result = parse_delimited(content.as_bytes()).unwrap();
        assert_eq!(result.grid[0], vec![json!("Country"), json!("Cost")]);
        assert_eq!(result.grid[1], vec![json!("US"), json!("1,234,567.00")]);
    }

    #[test]
    fn test_utf8_accented_names_kept() {
        let content = "Country,Cost\nCôte d'Ivoire,5\nCuraçao,7\n";
        assert_eq!(detect_encoding(content.as_bytes()), "utf-8");

        let result = parse_delimited(content.as_bytes()).unwrap();
        assert_eq!(result.grid[1][0], json!("Côte d'Ivoire"));
        assert_eq!(result.grid[2][0], json!("Curaçao"));
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let result = parse_delimited(b"Country,Cost,Clicks\nUS,1\nFR,2,3,4\n").unwrap();
        assert_eq!(result.grid[1].len(), 2);
        assert_eq!(result.grid[2].len(), 4);
    }

    #[test]
    fn test_detect_delimiter_with_banner() {
        let content = "Campaign report\nAll time\nCountry\tCost\tClicks\nUS\t1\t2";
        assert_eq!(detect_delimiter(content), '\t');
    }

    #[test]
    fn test_detect_delimiter_pipe() {
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_detect_delimiter_default() {
        assert_eq!(detect_delimiter("just one column"), ',');
    }

    #[test]
    fn test_utf16_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Country,Cost\nUS,5".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        assert_eq!(detect_encoding(&bytes), "utf-16le");
        let result = parse_delimited(&bytes).unwrap();
        assert_eq!(result.grid[0], vec![json!("Country"), json!("Cost")]);
        assert_eq!(result.grid[1], vec![json!("US"), json!("5")]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }
}
