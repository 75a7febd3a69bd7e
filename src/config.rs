use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Rule;

/// One entry of the rule configuration file. Fields other than
/// `expression` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleEntry {
    #[serde(default)]
    pub expression: Option<serde_json::Value>,
}

/// Parse the rule configuration: a JSON object mapping category name to an
/// entry with an `expression` string. Declaration order is kept.
///
/// Entries without a non-empty string `expression` are skipped with a warning.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when the input is not such an object.
pub fn parse_rule_config(input: &str) -> Result<Vec<Rule>, serde_json::Error> {
    let entries: IndexMap<String, RuleEntry> = serde_json::from_str(input)?;
    let mut rules = Vec::with_capacity(entries.len());
    for (name, entry) in entries {
        match entry.expression {
            Some(serde_json::Value::String(source)) if !source.trim().is_empty() => {
                rules.push(Rule { name, source });
            }
            Some(other) => {
                tracing::warn!(category = %name, expression = %other, "expression is not a non-empty string; category skipped");
            }
            None => {
                tracing::warn!(category = %name, "no expression configured; category skipped");
            }
        }
    }
    Ok(rules)
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Settings for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of documents processed concurrently. Values below 1 are treated as 1.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl BatchConfig {
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}
