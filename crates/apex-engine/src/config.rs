//! # Engine Configuration
//!
//! Configuration management for the document engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     APEX_DATABASE_PATH=/srv/apex/apex.db                               │
//! │     APEX_DEFAULT_VAT_RATE=16                                           │
//! │     APEX_NUMBER_PREFIX=APEX                                            │
//! │     APEX_MAX_CONNECTIONS=5                                             │
//! │     APEX_OUTPUT_DIR=/srv/apex/documents                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/apex/apex.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.apex.documents/apex.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/apex/apex.db"
//! max_connections = 5
//!
//! [documents]
//! brand = "APEX"
//! default_vat_rate = "16"
//! output_dir = "/srv/apex/documents"
//! ```

use apex_core::validation::validate_vat_rate;
use apex_core::{Decimal, DEFAULT_NUMBER_BRAND, DEFAULT_VAT_RATE_PERCENT};
use apex_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

const CONFIG_FILE_NAME: &str = "apex.toml";
const DATABASE_FILE_NAME: &str = "apex.db";

// =============================================================================
// Database Settings
// =============================================================================

/// Where documents are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file. `:memory:` for a throwaway database.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Document Settings
// =============================================================================

/// How documents are numbered and priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// First segment of every document number.
    #[serde(default = "default_brand")]
    pub brand: String,

    /// VAT rate (percent) used when a request carries none.
    #[serde(default = "default_vat_rate")]
    pub default_vat_rate: Decimal,

    /// Where rendered documents are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_brand() -> String {
    DEFAULT_NUMBER_BRAND.to_string()
}

fn default_vat_rate() -> Decimal {
    Decimal::from(DEFAULT_VAT_RATE_PERCENT)
}

fn default_output_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("documents"))
        .unwrap_or_else(|| PathBuf::from("documents"))
}

impl Default for DocumentSettings {
    fn default() -> Self {
        DocumentSettings {
            brand: default_brand(),
            default_vat_rate: default_vat_rate(),
            output_dir: default_output_dir(),
        }
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub documents: DocumentSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (apex.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        let brand = &self.documents.brand;
        if brand.is_empty() || !brand.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(EngineError::InvalidConfig(format!(
                "brand must be non-empty and alphanumeric, got: '{}'",
                brand
            )));
        }

        validate_vat_rate(self.documents.default_vat_rate)
            .map_err(|e| EngineError::InvalidConfig(format!("default_vat_rate: {}", e)))?;

        if self.database.max_connections == 0 {
            return Err(EngineError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the environment in production).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("APEX_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("APEX_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %max, "Ignoring invalid APEX_MAX_CONNECTIONS"),
            }
        }

        if let Some(rate) = lookup("APEX_DEFAULT_VAT_RATE") {
            match rate.trim().parse::<Decimal>() {
                Ok(rate) => {
                    debug!(rate = %rate, "Overriding default VAT rate from environment");
                    self.documents.default_vat_rate = rate;
                }
                Err(_) => warn!(value = %rate, "Ignoring invalid APEX_DEFAULT_VAT_RATE"),
            }
        }

        if let Some(brand) = lookup("APEX_NUMBER_PREFIX") {
            self.documents.brand = brand.trim().to_uppercase();
        }

        if let Some(dir) = lookup("APEX_OUTPUT_DIR") {
            self.documents.output_dir = PathBuf::from(dir);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Database pool configuration for these settings.
    pub fn db_config(&self) -> DbConfig {
        if self.database.path.as_os_str() == ":memory:" {
            // Pool size stays 1: every connection would see its own database
            return DbConfig::in_memory();
        }
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "apex", "documents")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.documents.brand, "APEX");
        assert_eq!(config.documents.default_vat_rate, dec!(16));
        assert_eq!(config.database.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.documents.brand = "AP-EX".into();
        assert!(config.validate().is_err());

        config.documents.brand = "ACME".into();
        config.documents.default_vat_rate = dec!(120);
        assert!(config.validate().is_err());

        config.documents.default_vat_rate = dec!(7.5);
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("APEX_DATABASE_PATH", "/tmp/other.db"),
            ("APEX_DEFAULT_VAT_RATE", "8"),
            ("APEX_NUMBER_PREFIX", "acme"),
            ("APEX_MAX_CONNECTIONS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.documents.default_vat_rate, dec!(8));
        assert_eq!(config.documents.brand, "ACME");
        // Invalid value ignored
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [documents]
            brand = "ACME"
            default_vat_rate = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.documents.brand, "ACME");
        assert_eq!(config.documents.default_vat_rate, dec!(8));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("apex.toml");

        let mut config = EngineConfig::default();
        config.database.path = dir.path().join("apex.db");
        config.documents.default_vat_rate = dec!(7.5);
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[documents]"));

        let loaded: EngineConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_in_memory_db_config() {
        let mut config = EngineConfig::default();
        config.database.path = PathBuf::from(":memory:");
        assert!(config.db_config().is_in_memory());
    }
}
