use std::path::Path;

use database::DatabaseConfig;
use serde::Deserialize;

use crate::AdminError;

/// Contents of the optional YAML config file:
///
/// ```yaml
/// database:
///   url: /var/lib/palworld/registry.db
///   pool_size: 4
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub database: DatabaseSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: Option<String>,
    pub pool_size: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, AdminError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    pub fn database_config(&self, cli_arg: Option<String>) -> DatabaseConfig {
        let config =
            DatabaseConfig::from_cli_or_env_or_yaml(cli_arg, self.database.url.clone());
        match self.database.pool_size {
            Some(size) => config.with_pool_size(size),
            None => config,
        }
    }
}
