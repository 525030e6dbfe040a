use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::CaseKind;
use crate::stats::DEFAULT_SERIES_DAYS;

/// Engine configuration. Everything has a default; a missing config file
/// is not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub collections: CollectionsConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Remote collection paths consumed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    #[serde(default = "default_requests_path")]
    pub requests: String,
    #[serde(default = "default_leaks_path")]
    pub leaks: String,
    #[serde(default = "default_notifications_root")]
    pub notifications_root: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            requests: default_requests_path(),
            leaks: default_leaks_path(),
            notifications_root: default_notifications_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_series_days")]
    pub series_days: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            series_days: default_series_days(),
        }
    }
}

impl EngineConfig {
    /// Remote collection path for the given case kind.
    #[must_use]
    pub fn collection_path(&self, kind: CaseKind) -> &str {
        match kind {
            CaseKind::Request => &self.collections.requests,
            CaseKind::Leak => &self.collections.leaks,
        }
    }
}

/// Load the engine config from `path`. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<EngineConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_requests_path() -> String {
    "requests".to_string()
}

fn default_leaks_path() -> String {
    "leaks".to_string()
}

fn default_notifications_root() -> String {
    "notifications".to_string()
}

const fn default_series_days() -> usize {
    DEFAULT_SERIES_DAYS
}
