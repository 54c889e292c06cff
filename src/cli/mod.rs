pub mod clean;
pub mod compilers;
pub mod inspect;
pub mod lint;
pub mod make;
pub mod verify;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::compilers::{Registry, SystemRunner};
use crate::config::Config;
use crate::problem::AbstractProblem;

/// Load the configuration and apply command-line overrides.
pub fn load_config(
    config_path: Option<String>,
    jobs_override: Option<usize>,
    timeout_override: Option<u64>,
) -> Result<Config> {
    if let Some(ref cfg) = config_path {
        info!("Config: {}", cfg);
    }
    let mut config = Config::load_with_path(config_path)?;

    if let Some(jobs) = jobs_override {
        info!("CLI override: jobs = {}", jobs);
        config.build.jobs = jobs;
    }
    if let Some(timeout) = timeout_override {
        info!("CLI override: timeout = {}s", timeout);
        config.build.timeout = timeout;
    }
    Ok(config)
}

/// Load the bundle at `path` with the configured handler-mismatch policy.
pub fn load_bundle(path: &str, config: &Config) -> Result<AbstractProblem> {
    match AbstractProblem::load_with_policy(Path::new(path), config.lint.get_handler_mismatch()) {
        Ok(bundle) => Ok(bundle),
        Err(e) => {
            if e.is_structural() {
                warn!("Run `pbmkit lint {}` for a full report", path);
            }
            Err(e.into())
        }
    }
}

/// The standard registry backed by real processes.
pub fn system_registry(config: &Config) -> Registry {
    let runner = SystemRunner::new().with_timeout(config.build.get_timeout());
    Registry::standard(Arc::new(runner))
}
