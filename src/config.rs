use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::planner::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_FEASIBLE_CAP, DEFAULT_ILP_THRESHOLD, DEFAULT_RANKER_CAP,
    DEFAULT_RANKER_TIMEOUT_MS, DEFAULT_TIME_BUDGET_MS,
};

/// Runtime settings, read from an optional TOML file. Every field has a
/// default, so an empty file (or none) is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub menu: MenuConfig,
    pub search: SearchConfig,
    pub ranker: RankerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// File path or http(s) URL of the consolidated menu.
    pub source: String,
    /// `[{title, pattern}]` section definitions.
    pub sections: Option<PathBuf>,
    pub cache_ttl_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            source: "consolidated_menu.json".to_string(),
            sections: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            fetch_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub time_budget_ms: u64,
    pub feasible_cap: usize,
    pub ilp_threshold: usize,
    /// Brute-force worker threads; defaults to the CPU count.
    pub workers: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            feasible_cap: DEFAULT_FEASIBLE_CAP,
            ilp_threshold: DEFAULT_ILP_THRESHOLD,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// External ranking program; without one the best numeric fit is used.
    pub command: Option<String>,
    pub timeout_ms: u64,
    pub max_options: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_ms: DEFAULT_RANKER_TIMEOUT_MS,
            max_options: DEFAULT_RANKER_CAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` if given, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.feasible_cap == 0 {
            return Err(ConfigError::Invalid("search.feasible_cap must be at least 1".into()));
        }
        if self.search.workers == Some(0) {
            return Err(ConfigError::Invalid("search.workers must be at least 1".into()));
        }
        if self.ranker.command.is_some() {
            if self.ranker.max_options == 0 {
                return Err(ConfigError::Invalid("ranker.max_options must be at least 1".into()));
            }
            if self.ranker.timeout_ms >= self.search.time_budget_ms {
                return Err(ConfigError::Invalid(format!(
                    "ranker.timeout_ms ({}) must be smaller than search.time_budget_ms ({})",
                    self.ranker.timeout_ms, self.search.time_budget_ms
                )));
            }
        }
        if self.menu.source.trim().is_empty() {
            return Err(ConfigError::Invalid("menu.source must not be empty".into()));
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.search.time_budget_ms)
    }

    pub fn ranker_timeout(&self) -> Duration {
        Duration::from_millis(self.ranker.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.menu.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.menu.fetch_timeout_secs)
    }
}
