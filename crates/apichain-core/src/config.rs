//! Project configuration for chained API runs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::alias::{DEFAULT_SOURCE_KEYS, PluralStripAliaser};
use crate::context::RunContext;
use crate::orchestrator::BatchRunner;

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenAPI spec path (local file)
    pub spec: PathBuf,

    /// Base URL of the server to test
    pub base_url: String,

    /// HTTP headers (Auth, API keys, etc.)
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Seed values for the run context (entity IDs known up front)
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// JSON file with per-operation test data
    #[serde(default)]
    pub test_data: Option<PathBuf>,

    /// Where the ambient context and result log are kept (default: ".apichain")
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Skip endpoints whose path still has placeholders after resolution
    #[serde(default)]
    pub skip_unresolved: bool,

    /// Generic id keys aliased per resource; later keys win
    #[serde(default = "default_alias_keys")]
    pub alias_keys: Vec<String>,
}

fn default_timeout_secs() -> f64 {
    10.0
}

fn default_alias_keys() -> Vec<String> {
    DEFAULT_SOURCE_KEYS.iter().map(|k| (*k).to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: PathBuf::from("openapi.yaml"),
            base_url: "http://localhost:8000".to_string(),
            headers: HashMap::new(),
            variables: HashMap::new(),
            test_data: None,
            state_dir: None,
            timeout_secs: default_timeout_secs(),
            skip_unresolved: false,
            alias_keys: default_alias_keys(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot drive a run.
    ///
    /// # Errors
    ///
    /// Returns error if `timeout_secs` is not a finite, positive number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "timeout_secs must be a positive number of seconds, got {}",
                self.timeout_secs
            )));
        }
        Ok(())
    }

    /// Load from default location (.apichain.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".apichain.toml", ".apichain.json", "apichain.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".apichain"))
    }

    /// Configured variables as a starting context.
    #[must_use]
    pub fn seed_context(&self) -> RunContext {
        self.variables
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Batch runner wired with this config's aliasing and skip policy.
    #[must_use]
    pub fn batch_runner(&self) -> BatchRunner {
        BatchRunner::new()
            .with_aliaser(PluralStripAliaser::with_source_keys(
                self.alias_keys.iter().cloned(),
            ))
            .with_skip_unresolved(self.skip_unresolved)
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# apichain configuration

# OpenAPI spec (local file path, JSON or YAML)
spec = "openapi.yaml"

# Server to test
base_url = "http://localhost:8000"

# Per-operation test data (keyed by operationId or "METHOD_/path")
# test_data = "testdata.json"

# Ambient context and result log location
# state_dir = ".apichain"

# Per-request timeout in seconds
# timeout_secs = 10.0

# Skip endpoints whose path placeholders could not be filled
# skip_unresolved = false

# Generic id keys copied into resource aliases (driver_id, driverId, driverOf);
# later keys overwrite earlier ones
# alias_keys = ["id", "uuid", "_id", "userId"]

# HTTP headers (auth, api keys)
[headers]
Authorization = "Bearer your-token-here"
# X-API-Key = "your-api-key"

# Values known before the first run
[variables]
# tenant_id = "acme"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
