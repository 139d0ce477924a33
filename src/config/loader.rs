//! Configuration File Loading
//!
//! Finds the configuration file in the usual locations, parses it as TOML
//! or JSON and validates it. Missing files fall back to defaults.

use super::Config;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "SLOTSHELL_CONFIG";

/// Configuration file loader
pub struct ConfigLoader {
    /// Candidate configuration files, in priority order
    search_paths: Vec<PathBuf>,
    /// Path the last configuration was loaded from
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension (TOML unless `.json`)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

impl ConfigLoader {
    /// Create a loader over the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            current_path: None,
        }
    }

    /// Load configuration from the first existing search path, or defaults
    pub fn load() -> Result<Config> {
        let mut loader = Self::new();
        loader.find_and_load()
    }

    /// Load configuration from an explicit file. The file must exist.
    pub fn load_from_path(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(Error::ConfigLoadFailed {
                path: path.to_path_buf(),
                reason: "Configuration file does not exist".to_string(),
            });
        }

        let config = Self::load_config_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Search the configured paths; defaults when nothing is found
    pub fn find_and_load(&mut self) -> Result<Config> {
        for path in &self.search_paths {
            if !path.is_file() {
                continue;
            }

            match Self::load_config_file(path) {
                Ok(config) => {
                    config.validate()?;
                    info!("Configuration loaded from {}", path.display());
                    self.current_path = Some(path.clone());
                    return Ok(config);
                }
                Err(e) => {
                    // Keep searching, a broken file should not stop startup
                    warn!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Save configuration, choosing the format from the extension
    pub fn save_to_path(&self, config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let format = ConfigFormat::from_path(path);
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                }
            })?,
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Parse one configuration file
    fn load_config_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;
        let format = ConfigFormat::from_path(path);

        match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                format: format.name().to_string(),
                reason: e.to_string(),
            }),
            ConfigFormat::Json => {
                serde_json::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Default search paths, highest priority first
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(explicit) = env::var_os(CONFIG_ENV_VAR) {
            paths.push(PathBuf::from(explicit));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("slotshell").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".slotshell").join("config.toml"));
        }

        paths
    }

    /// Get the path the current configuration came from
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
