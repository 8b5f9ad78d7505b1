// Harmonizer configuration.
//
// All tunables live in `HarmonizerConfig`, loadable from JSON. Missing fields
// take their defaults, so a config file only needs the values it changes:
//
//   { "strength_threshold": 0.5, "node_budget": 200000 }
//
// A custom `grammar` replaces the standard one wholesale; it is written as a
// map from degree to successor list, e.g. { "I": ["IV", "V"], "IV": ["V"], ... }.

use crate::grammar::Grammar;
use crate::melody::DEFAULT_STRENGTH_THRESHOLD;
use crate::search::SearchConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonizerConfig {
    /// Notes with beat strength at or above this are harmonized.
    pub strength_threshold: f64,
    /// Search gives up after this many prefix extensions.
    pub node_budget: u64,
    /// Melodies with more slots than this are refused before searching.
    pub max_slots: usize,
    /// Permitted degree transitions.
    pub grammar: Grammar,
}

impl Default for HarmonizerConfig {
    fn default() -> Self {
        let search = SearchConfig::default();
        HarmonizerConfig {
            strength_threshold: DEFAULT_STRENGTH_THRESHOLD,
            node_budget: search.node_budget,
            max_slots: search.max_depth,
            grammar: Grammar::default(),
        }
    }
}

impl HarmonizerConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: HarmonizerConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            node_budget: self.node_budget,
            max_depth: self.max_slots,
        }
    }
}
