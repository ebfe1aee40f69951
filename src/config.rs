//! Fetch configuration: defaults, optionally overridden by a RON file, then by
//! command-line flags.

use std::path::Path;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::client::{API_BASE, IMAGE_BASE};

pub const DEFAULT_LIST_LIMIT: u32 = 905;
pub const DEFAULT_CONCURRENCY: usize = 12;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// What the list aggregator does when one item's enrichment fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FanoutPolicy {
    /// Skip the item, log it and report it in the result.
    #[default]
    BestEffort,
    /// Fail the whole batch on the first item error.
    FailFast,
}

/// Which successors the evolution walk follows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BranchPolicy {
    /// Only `evolves_to[0]`; branching evolutions beyond the first are ignored.
    #[default]
    First,
    /// Every branch, depth-first.
    All,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub image_base: String,
    pub list_limit: u32,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub fanout: FanoutPolicy,
    pub branches: BranchPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE.to_string(),
            image_base: IMAGE_BASE.to_string(),
            list_limit: DEFAULT_LIST_LIMIT,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            fanout: FanoutPolicy::default(),
            branches: BranchPolicy::default(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

impl FetchConfig {
    pub fn from_ron_str(path: &str, contents: &str) -> Result<Self, ConfigError> {
        ron::de::from_str(contents).map_err(|err| ConfigError::Parse {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_ron_str(&display, &contents)
    }

    /// Permits for the list fan-out; never zero.
    pub fn worker_permits(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
