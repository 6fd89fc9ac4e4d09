//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError, StorageBackend};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "roles.toml",
    "./config/config.toml",
    "/etc/roles-api/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    search_default_paths: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            config_path: None,
            search_default_paths: true,
        }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
            search_default_paths: true,
        }
    }

    /// Only consult the explicit path and `ROLES_CONFIG`, never the
    /// standard search paths.
    pub fn without_search_paths(mut self) -> Self {
        self.search_default_paths = false;
        self
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) but resolves variables through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup)?;
        config.validate()?;

        Ok(config)
    }

    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured config file does not exist");
        }

        if let Some(path) = lookup("ROLES_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if !self.search_default_paths {
            return None;
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(val) = lookup("ROLES_HTTP_PORT") {
        match val.parse() {
            Ok(port) => config.http.port = port,
            Err(_) => warn!(value = %val, "Ignoring invalid ROLES_HTTP_PORT"),
        }
    }
    if let Some(val) = lookup("ROLES_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("ROLES_CORS_ORIGINS") {
        config.http.cors_origins = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // Storage
    if let Some(val) = lookup("ROLES_STORAGE_BACKEND") {
        config.storage.backend = StorageBackend::parse(&val).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "ROLES_STORAGE_BACKEND must be dynamodb or memory, got '{}'",
                val
            ))
        })?;
    }
    if let Some(val) = lookup("DYNAMODB_TABLE_ROLES") {
        config.storage.table_name = val;
    }
    if let Some(val) = lookup("AWS_REGION").or_else(|| lookup("APP_AWS_REGION")) {
        config.storage.region = val;
    }
    if let Some(val) = lookup("DYNAMODB_ENDPOINT") {
        config.storage.endpoint = Some(val).filter(|v| !v.is_empty());
    }
    if let Some(val) = lookup("ROLES_STORAGE_MAX_ATTEMPTS") {
        match val.parse() {
            Ok(n) => config.storage.retry.max_attempts = n,
            Err(_) => warn!(value = %val, "Ignoring invalid ROLES_STORAGE_MAX_ATTEMPTS"),
        }
    }

    if let Some(val) = lookup("ROLES_SERVICE_NAME") {
        config.service_name = val;
    }

    Ok(())
}
