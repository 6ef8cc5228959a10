//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.beneficios.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Catalog and dataset locations.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Transparency API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where the catalog and dataset files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Root directory of the per-municipality dataset files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Optional JSON municipality index. When set, the JSON catalog variant
    /// is used instead of the directory tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipalities_file: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            municipalities_file: None,
        }
    }
}

fn default_data_dir() -> String {
    "dados/dados_por_municipio".to_string()
}

/// Transparency API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the transparency portal.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds for external calls.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// API key. Usually supplied via the API_KEY environment variable
    /// instead of the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// IBGE code shown on the home summary when none is given.
    #[serde(default = "default_ibge_code")]
    pub default_ibge_code: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            key: None,
            default_ibge_code: default_ibge_code(),
        }
    }
}

fn default_base_url() -> String {
    crate::transparency::DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    8
}

fn default_ibge_code() -> String {
    // Fátima, BA.
    "2910750".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".beneficios.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings; the API_KEY
    /// environment variable reaches here through clap's env fallback.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.catalog.data_dir = data_dir.display().to_string();
        }
        if let Some(ref municipalities_file) = args.municipalities_file {
            self.catalog.municipalities_file = Some(municipalities_file.display().to_string());
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(ref key) = args.api_key {
            self.api.key = Some(key.clone());
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// The effective API key, if any usable one is configured.
    pub fn api_key(&self) -> Option<String> {
        self.api
            .key
            .clone()
            .filter(|key| !key.trim().is_empty())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
