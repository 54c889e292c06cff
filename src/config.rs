use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::problem::HandlerMismatchPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub lint: LintConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Prefix for working copies and candidate outputs (default: "pbmk")
    #[serde(default = "default_work_prefix")]
    pub work_prefix: String,

    /// Testcase worker pool size; 1 runs testcases strictly in order (default: 1)
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Per-process timeout in seconds; 0 disables it (default: 0)
    #[serde(default)]
    pub timeout: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            work_prefix: default_work_prefix(),
            jobs: default_jobs(),
            timeout: 0,
        }
    }
}

impl BuildConfig {
    pub fn get_timeout(&self) -> Option<Duration> {
        if self.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout))
        }
    }

    pub fn get_jobs(&self) -> usize {
        self.jobs.max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    /// What to do when a translation's handler family disagrees with the
    /// original's: "ignore", "warn" or "error" (default: "warn")
    #[serde(default = "default_handler_mismatch")]
    pub handler_mismatch: String,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            handler_mismatch: default_handler_mismatch(),
        }
    }
}

impl LintConfig {
    pub fn get_handler_mismatch(&self) -> HandlerMismatchPolicy {
        match self.handler_mismatch.to_lowercase().as_str() {
            "ignore" => HandlerMismatchPolicy::Ignore,
            "error" => HandlerMismatchPolicy::Error,
            _ => HandlerMismatchPolicy::Warn,
        }
    }
}

fn default_work_prefix() -> String {
    "pbmk".to_string()
}

fn default_jobs() -> usize {
    1
}

fn default_handler_mismatch() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path);
        }

        if let Some(config) = Self::load_if_present(Path::new("pbmkit.toml")) {
            debug!("Loaded config from ./pbmkit.toml");
            return Ok(config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("pbmkit").join("config.toml");
            if let Some(config) = Self::load_if_present(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    /// A search-path candidate: absent files are skipped quietly, unreadable
    /// or malformed ones with a warning.
    fn load_if_present(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_path(path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                None
            }
        }
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
