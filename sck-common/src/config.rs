//! Configuration loading and config file resolution
//!
//! Config file location priority:
//! 1. Command-line argument (highest priority)
//! 2. `SCK_CONFIG` environment variable
//! 3. User config directory (`~/.config/sck/config.toml` on Linux)
//!
//! A missing file is not fatal: built-in defaults are used and a warning is
//! recorded. A file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_ENV_VAR: &str = "SCK_CONFIG";
pub const CATALOG_URL_ENV_VAR: &str = "SCK_CATALOG_URL";
pub const API_KEY_ENV_VAR: &str = "SCK_API_KEY";

/// Configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub write_back: WriteBackConfig,

    /// Default reorganizer settings (overridable on the command line)
    #[serde(default)]
    pub organize: Option<OrganizeConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote catalog endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// GraphQL endpoint, e.g. `http://localhost:9999/graphql`
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub api_key: String,
}

/// Mapping between catalog paths and the local filesystem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryConfig {
    /// Local directory the catalog prefix maps to
    #[serde(default)]
    pub data_root: Option<PathBuf>,

    /// Prefix of file paths as reported by the catalog server
    #[serde(default = "default_catalog_prefix")]
    pub catalog_prefix: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_root: None,
            catalog_prefix: default_catalog_prefix(),
        }
    }
}

/// Rating write-back throttling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WriteBackConfig {
    /// Delay between consecutive update calls
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for WriteBackConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

/// Reorganizer defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrganizeConfig {
    /// `flat`, `nested`, `performer-male` or `performer-female`
    #[serde(default)]
    pub structure: Option<String>,

    /// Filename template, e.g. `{studio} - {date} - {title}.{ext}`
    #[serde(default)]
    pub template: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_catalog_prefix() -> String {
    "/data".to_string()
}

fn default_delay_ms() -> u64 {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locates the config file
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Path of the config file to read, whether or not it exists
    pub fn resolve(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path()
    }

    /// Resolve and load, falling back to defaults when no file exists
    ///
    /// Runs before logging is set up, so warnings are collected instead of
    /// emitted. Call [`LoadedConfig::log`] once a subscriber is installed.
    pub fn load(&self) -> Result<LoadedConfig> {
        let mut warnings = Vec::new();
        let mut source = None;
        let mut config = match self.resolve() {
            Some(path) if path.exists() => {
                let config = load_toml_config(&path)?;
                source = Some(path);
                config
            }
            Some(path) => {
                warnings.push(format!(
                    "Config file {} not found, using defaults",
                    path.display()
                ));
                TomlConfig::default()
            }
            None => {
                warnings.push("Could not determine config directory, using defaults".to_string());
                TomlConfig::default()
            }
        };

        warnings.extend(apply_env_overrides(&mut config));
        Ok(LoadedConfig {
            config,
            source,
            warnings,
        })
    }
}

/// Resolved configuration plus what happened while resolving it
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    /// File the values came from, if one was read
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Report the config source and any resolution warnings
    pub fn log(&self) {
        if let Some(path) = &self.source {
            info!("Loaded config from {}", path.display());
        }
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}

/// `~/.config/sck/config.toml` (or the platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sck").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Write a TOML config file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Environment variables override file values
///
/// Returns a warning for every value set in both places so a stale file
/// entry is noticed.
pub fn apply_env_overrides(config: &mut TomlConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(url) = env_value(CATALOG_URL_ENV_VAR) {
        if !config.catalog.url.is_empty() && config.catalog.url != url {
            warnings.push(format!(
                "Catalog URL found in both TOML and {}. Using environment.",
                CATALOG_URL_ENV_VAR
            ));
        }
        config.catalog.url = url;
    }

    if let Some(key) = env_value(API_KEY_ENV_VAR) {
        if !config.catalog.api_key.is_empty() && config.catalog.api_key != key {
            warnings.push(format!(
                "API key found in both TOML and {}. Using environment.",
                API_KEY_ENV_VAR
            ));
        }
        config.catalog.api_key = key;
    }

    warnings
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl TomlConfig {
    /// Catalog connection settings, or a configuration error naming what is missing
    pub fn require_catalog(&self) -> Result<&CatalogConfig> {
        if self.catalog.url.trim().is_empty() {
            return Err(Error::Config(format!(
                "Catalog URL not configured. Run `sck-cu init` or set {}",
                CATALOG_URL_ENV_VAR
            )));
        }
        Ok(&self.catalog)
    }

    /// Local data root, or a configuration error
    pub fn require_data_root(&self) -> Result<&Path> {
        self.library
            .data_root
            .as_deref()
            .ok_or_else(|| Error::Config("library.data_root not configured".to_string()))
    }
}
