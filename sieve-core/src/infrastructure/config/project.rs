// sieve-core/src/infrastructure/config/project.rs

use serde::{Deserialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::classification::TableFields;
use crate::domain::detection::DetectionMethod;
use crate::domain::project::ProjectConfig;
use crate::error::SieveError;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["sieve.yaml", "sieve_project_conf.yaml"];

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, SieveError> {
    // 1. Main file discovery
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    // 2. Base YAML
    let mut config: ProjectConfig = load_fragment(&config_path)?;

    // 3. Satellite table classifications (config/tables.yml)
    let satellite = project_dir.join("config").join("tables.yml");
    if satellite.exists() {
        #[derive(Deserialize)]
        struct TablesWrapper {
            tables: BTreeMap<String, TableFields>,
        }

        // A corrupted satellite stops everything
        let wrapper: TablesWrapper = load_fragment(&satellite)?;
        info!(tables = wrapper.tables.len(), "  📋 Satellite table classifications loaded");
        config.tables.extend(wrapper.tables);
    }

    // 4. Environment overrides (layering)
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    // 5. Fail fast on nonsense thresholds or overlapping fields
    config.validate_config()?;

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

/// Loads a typed configuration fragment from a YAML file.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|source| InfrastructureError::YamlError {
        path: path.to_path_buf(),
        source,
    })
}

/// `SIEVE_DB_PATH` and `SIEVE_METHODS` (comma separated) override the file.
fn apply_env_overrides<F>(config: &mut ProjectConfig, lookup: F) -> Result<(), SieveError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("SIEVE_DB_PATH") {
        info!(old = %config.store.db_path, new = %val, "Overriding store path via ENV");
        config.store.db_path = val;
    }
    if let Some(val) = lookup("SIEVE_METHODS") {
        let methods = val
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<DetectionMethod>)
            .collect::<Result<Vec<_>, _>>()?;
        info!(methods = %val, "Overriding detection methods via ENV");
        config.detection.methods = methods;
    }
    Ok(())
}
