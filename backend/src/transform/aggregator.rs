//! Aggregation of normalized rows into one sum per key.
//!
//! ```text
//! KeyValueRows (all files)         AggregateTable
//! ┌──────┬───────┐                ┌──────┬───────┐
//! │ JP   │ 30    │                │ JP   │ 50    │
//! │ US   │ 100   │       →        │ US   │ 100   │
//! │ JP   │ 20    │                └──────┴───────┘
//! └──────┴───────┘
//! ```

use crate::models::{AggregateTable, KeyValueRow};

/// Group rows by key (exact string match) and sum their values.
///
/// Zero-valued rows still create their key. An empty input yields an empty
/// table, which callers must tell apart from a table of zeros.
pub fn aggregate<I>(rows: I) -> AggregateTable
where
    I: IntoIterator<Item = KeyValueRow>,
{
    rows.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(items: &[(&str, f64)]) -> Vec<KeyValueRow> {
        items.iter().map(|(k, v)| KeyValueRow::new(*k, *v)).collect()
    }

    #[test]
    fn test_sums_per_key() {
        let table = aggregate(rows(&[("JP", 30.0), ("US", 100.0), ("JP", 20.0)]));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("JP"), Some(50.0));
        assert_eq!(table.get("US"), Some(100.0));
    }

    #[test]
    fn test_exact_key_match() {
        let table = aggregate(rows(&[("USA", 1.0), ("usa", 2.0), ("United States", 4.0)]));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let table = aggregate(Vec::new());
        assert!(table.is_empty());
    }

    #[test]
    fn test_zero_rows_keep_key() {
        let table = aggregate(rows(&[("FR", 0.0)]));
        assert_eq!(table.get("FR"), Some(0.0));
    }

    #[test]
    fn test_order_independent() {
        let input = rows(&[("JP", 30.0), ("US", 100.5), ("JP", 20.25), ("FR", 0.0), ("US", -4.0)]);
        let expected = aggregate(input.clone());

        let mut reversed = input.clone();
        reversed.reverse();
        assert_eq!(aggregate(reversed), expected);

        let mut rotated = input;
        rotated.rotate_left(2);
        assert_eq!(aggregate(rotated), expected);
    }

    #[test]
    fn test_additive() {
        let first = rows(&[("JP", 30.0), ("US", 100.0)]);
        let second = rows(&[("JP", 20.0), ("DE", 5.0)]);

        let mut all = first.clone();
        all.extend(second.clone());

        let merged = aggregate(first).merge(&aggregate(second));
        assert_eq!(aggregate(all), merged);
        assert_eq!(merged.get("JP"), Some(50.0));
        assert_eq!(merged.get("DE"), Some(5.0));
    }
}
