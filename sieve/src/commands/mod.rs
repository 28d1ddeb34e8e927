// sieve/src/commands/mod.rs

pub mod detect;
pub mod inspect;
pub mod tables;

use sieve_core::SieveError;
use sieve_core::domain::ProjectConfig;
use sieve_core::infrastructure::config::load_project_config;
use sieve_core::infrastructure::error::InfrastructureError;
use std::path::Path;

/// Project config, or the built-in logistics defaults when the directory has none.
pub fn load_config_or_default(project_dir: &Path) -> anyhow::Result<ProjectConfig> {
    match load_project_config(project_dir) {
        Ok(config) => Ok(config),
        Err(SieveError::Infrastructure(InfrastructureError::ConfigNotFound(msg))) => {
            tracing::warn!(reason = %msg, "No sieve.yaml found, using built-in logistics registry");
            Ok(ProjectConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}
