//! Full outer join of the cost and revenue aggregates.
//!
//! ```text
//! costs          revenues              reconciled
//! US  100        US  150               US  100  150   50   50%
//! FR   50        DE   20       →       FR   50    0  -50  -100%
//!                                      DE    0   20   20   (none)
//! ```
//!
//! A key missing on one side is filled with an explicit zero. ROI is left
//! undefined (`None`) where cost is zero.

use std::collections::BTreeSet;

use crate::models::{AggregateTable, ReconciledRow, ReconciledTable};

/// Join `costs` and `revenues` on key; one row per key present in either.
///
/// Rows come out in key order; display ordering is left to the consumer
/// (see [`ReconciledTable::sorted_by_profit`]).
pub fn reconcile(costs: &AggregateTable, revenues: &AggregateTable) -> ReconciledTable {
    let keys: BTreeSet<&str> = costs.keys().chain(revenues.keys()).collect();

    let rows = keys
        .into_iter()
        .map(|key| {
            let cost = costs.get(key).unwrap_or(0.0);
            let revenue = revenues.get(key).unwrap_or(0.0);
            ReconciledRow::new(key, cost, revenue)
        })
        .collect();

    ReconciledTable { rows }
}
