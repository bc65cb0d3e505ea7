//! Pipeline configuration.
//!
//! Vendor exports name their columns freely ("Estimated Revenue (USD)",
//! "Spend", "Cost ($)"). Columns are recognized by case-insensitive
//! substring match against the fragment lists held here, so a new vendor
//! layout is usually a config change rather than a code change.
//!
//! Configuration can be loaded from a JSON file; every field is optional
//! and falls back to its default.
//!
//! ```json
//! {
//!   "costCandidates": ["Cost", "Spent", "Amount", "Spend", "Ausgaben"],
//!   "headerScanRows": 5
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::models::Category;

/// Environment variable holding a path to a JSON config file.
pub const CONFIG_ENV_VAR: &str = "ADRECON_CONFIG";

/// Default key-column fragments.
pub const DEFAULT_KEY_CANDIDATES: &[&str] = &["Country", "Territory", "Location", "Geo"];

/// Default cost-column fragments.
pub const DEFAULT_COST_CANDIDATES: &[&str] = &["Cost", "Spent", "Amount", "Spend"];

/// Default revenue-column fragments.
pub const DEFAULT_REVENUE_CANDIDATES: &[&str] = &["Revenue", "Earnings", "Estimated"];

/// Default vendor summary-row labels.
pub const DEFAULT_RESERVED_LABELS: &[&str] = &["total", "grand total"];

/// Default number of leading rows searched for the header row.
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 10;

/// Tunable parameters of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconConfig {
    /// Fragments recognizing the grouping (country) column.
    pub key_candidates: Vec<String>,

    /// Fragments recognizing the amount column in cost files.
    pub cost_candidates: Vec<String>,

    /// Fragments recognizing the amount column in revenue files.
    pub revenue_candidates: Vec<String>,

    /// Key values marking vendor summary rows, compared case-insensitively.
    pub reserved_labels: Vec<String>,

    /// How many leading rows of a section may precede the header row.
    pub header_scan_rows: usize,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            key_candidates: to_owned(DEFAULT_KEY_CANDIDATES),
            cost_candidates: to_owned(DEFAULT_COST_CANDIDATES),
            revenue_candidates: to_owned(DEFAULT_REVENUE_CANDIDATES),
            reserved_labels: to_owned(DEFAULT_RESERVED_LABELS),
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
        }
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ReconConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: ReconConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], or defaults when unset.
    pub fn from_env() -> ConfigResult<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject empty lists and blank fragments.
    pub fn validate(&self) -> ConfigResult<()> {
        check_list("key", &self.key_candidates)?;
        check_list("cost", &self.cost_candidates)?;
        check_list("revenue", &self.revenue_candidates)?;
        Ok(())
    }

    /// Value-column fragments for a category.
    pub fn candidates_for(&self, category: Category) -> &[String] {
        match category {
            Category::Cost => &self.cost_candidates,
            Category::Revenue => &self.revenue_candidates,
        }
    }

    /// Whether a (trimmed) key is a vendor summary label.
    pub fn is_reserved(&self, key: &str) -> bool {
        let key = key.trim();
        self.reserved_labels
            .iter()
            .any(|label| label.trim().eq_ignore_ascii_case(key))
    }

    /// Header scan depth, never less than one row.
    pub fn scan_rows(&self) -> usize {
        self.header_scan_rows.max(1)
    }
}

fn check_list(name: &'static str, fragments: &[String]) -> ConfigResult<()> {
    if fragments.is_empty() {
        return Err(ConfigError::EmptyCandidates(name));
    }
    if fragments.iter().any(|f| f.trim().is_empty()) {
        return Err(ConfigError::BlankFragment(name));
    }
    Ok(())
}
