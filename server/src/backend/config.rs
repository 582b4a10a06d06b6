//! # Server Configuration
//!
//! Settings are resolved in three layers:
//!
//! 1. Built-in defaults
//! 2. The YAML file named by `HOMESTEAD_CONFIG`, when set
//! 3. Environment overrides (`HOMESTEAD_LISTEN_ADDRESS`, `DATABASE_URL`,
//!    `HOMESTEAD_CORS_ORIGIN`)
//!
//! ## YAML Format
//!
//! ```yaml
//! listen_address: "127.0.0.1:3000"
//! database_url: "sqlite:/var/lib/homestead/homestead.db"
//! cors_origin: "http://localhost:8080"
//! excluded_vendor: "discover"
//! log_format: "json"
//! ```
//!
//! Keys left out of the file keep their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_PATH_ENV: &str = "HOMESTEAD_CONFIG";
pub const LISTEN_ADDRESS_ENV: &str = "HOMESTEAD_LISTEN_ADDRESS";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const CORS_ORIGIN_ENV: &str = "HOMESTEAD_CORS_ORIGIN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listen_address: String,
    pub database_url: String,
    /// Front-end origin allowed by CORS
    pub cors_origin: String,
    /// Vendor left out of the "excluding vendor" budget total
    pub excluded_vendor: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:3000".to_string(),
            database_url: default_database_url(),
            cors_origin: "http://localhost:8080".to_string(),
            excluded_vendor: "discover".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

/// Directory holding the database when no URL is configured
pub fn default_data_directory() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("homestead")
}

fn default_database_url() -> String {
    format!("sqlite:{}", default_data_directory().join("homestead.db").display())
}

impl AppConfig {
    /// Resolve the configuration from the process environment
    pub fn load() -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(&env)
    }

    /// Resolve the configuration from an explicit set of variables
    pub fn load_from(env: &HashMap<String, String>) -> Result<Self> {
        let mut config = match env.get(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(path))?,
            None => Self::default(),
        };
        config.apply_overrides(env);
        Ok(config)
    }

    /// Read a YAML file; a missing file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        info!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    fn apply_overrides(&mut self, env: &HashMap<String, String>) {
        let overrides = [
            (LISTEN_ADDRESS_ENV, &mut self.listen_address),
            (DATABASE_URL_ENV, &mut self.database_url),
            (CORS_ORIGIN_ENV, &mut self.cors_origin),
        ];
        for (key, field) in overrides {
            if let Some(value) = env.get(key).filter(|value| !value.trim().is_empty()) {
                info!("Config override from {}", key);
                *field = value.trim().to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::load_from(&HashMap::new()).unwrap();
        assert_eq!(config.listen_address, "127.0.0.1:3000");
        assert_eq!(config.excluded_vendor, "discover");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.starts_with("sqlite:"));
        assert!(config.database_url.ends_with("homestead.db"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "excluded_vendor: amex\nlog_format: json").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.excluded_vendor, "amex");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.cors_origin, "http://localhost:8080");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "listen_address: \"0.0.0.0:8000\"\ndatabase_url: \"sqlite:file.db\"").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = AppConfig::load_from(&env(&[
            (CONFIG_PATH_ENV, &path),
            (DATABASE_URL_ENV, "sqlite::memory:"),
            (CORS_ORIGIN_ENV, "  "),
        ]))
        .unwrap();

        assert_eq!(config.listen_address, "0.0.0.0:8000");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.cors_origin, "http://localhost:8080");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_format: [not, a, format]").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }
}
