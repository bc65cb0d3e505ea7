//! Domain models for the reconciliation pipeline.
//!
//! - [`Category`] - Which side of the report a file feeds (cost or revenue)
//! - [`KeyValueRow`] - One normalized (country, amount) record
//! - [`AggregateTable`] - Amounts summed per key for one category
//! - [`ReconciledRow`] / [`ReconciledTable`] - Outer join of both aggregates
//! - [`Totals`] - Whole-report sums

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Category
// =============================================================================

/// The two data kinds being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Ad spend (e.g. Google Ads cost reports).
    Cost,
    /// Ad revenue (e.g. AdMob earnings reports).
    Revenue,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Cost => write!(f, "cost"),
            Category::Revenue => write!(f, "revenue"),
        }
    }
}

// =============================================================================
// Normalized rows
// =============================================================================

/// A normalized record: a geographic key and a finite monetary amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValueRow {
    pub key: String,
    pub value: f64,
}

impl KeyValueRow {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

// =============================================================================
// Aggregate
// =============================================================================

/// Amounts summed per key. Every key appears exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateTable {
    totals: BTreeMap<String, f64>,
}

impl AggregateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the running sum for `key`.
    pub fn add(&mut self, key: impl Into<String>, value: f64) {
        *self.totals.entry(key.into()).or_insert(0.0) += value;
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.totals.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.totals.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// `true` when no rows were aggregated. Distinct from a table whose sums are zero.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.totals.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.totals.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum over all keys.
    pub fn total(&self) -> f64 {
        self.totals.values().sum()
    }

    /// Element-wise sum over the union of keys.
    pub fn merge(mut self, other: &AggregateTable) -> Self {
        for (key, value) in other.iter() {
            self.add(key, value);
        }
        self
    }
}

impl FromIterator<KeyValueRow> for AggregateTable {
    fn from_iter<I: IntoIterator<Item = KeyValueRow>>(iter: I) -> Self {
        let mut table = AggregateTable::new();
        for row in iter {
            table.add(row.key, row.value);
        }
        table
    }
}

// =============================================================================
// Reconciled output
// =============================================================================

/// One country after the outer join.
///
/// `roi` is `None` when `cost` is zero: the ratio is undefined there and is
/// serialized as `null` rather than as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRow {
    pub key: String,
    pub cost: f64,
    pub revenue: f64,
    pub profit_loss: f64,
    pub roi: Option<f64>,
}

impl ReconciledRow {
    pub fn new(key: impl Into<String>, cost: f64, revenue: f64) -> Self {
        let profit_loss = revenue - cost;
        Self {
            key: key.into(),
            cost,
            revenue,
            profit_loss,
            roi: roi(profit_loss, cost),
        }
    }

    /// ROI rounded to two decimals, for display.
    pub fn roi_rounded(&self) -> Option<f64> {
        self.roi.map(round2)
    }
}

/// Profit/loss as a percentage of cost; `None` when cost is zero.
pub fn roi(profit_loss: f64, cost: f64) -> Option<f64> {
    if cost == 0.0 {
        None
    } else {
        Some(profit_loss / cost * 100.0)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Full outer join of the cost and revenue aggregates, one row per key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciledTable {
    pub rows: Vec<ReconciledRow>,
}

impl ReconciledTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ReconciledRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Rows ordered by descending profit/loss, ties broken by key.
    pub fn sorted_by_profit(&self) -> Vec<&ReconciledRow> {
        let mut rows: Vec<&ReconciledRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            b.profit_loss
                .partial_cmp(&a.profit_loss)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        rows
    }

    /// Sums across every row.
    pub fn totals(&self) -> Totals {
        let cost: f64 = self.rows.iter().map(|r| r.cost).sum();
        let revenue: f64 = self.rows.iter().map(|r| r.revenue).sum();
        let profit_loss = revenue - cost;
        Totals {
            cost,
            revenue,
            profit_loss,
            roi: roi(profit_loss, cost),
        }
    }
}

/// Whole-report sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub cost: f64,
    pub revenue: f64,
    pub profit_loss: f64,
    pub roi: Option<f64>,
}
