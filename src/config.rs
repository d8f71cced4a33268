use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

use crate::vocabulary::SiteNames;

/// Environment variable that overrides `store_path`.
pub const STORE_PATH_ENV: &str = "RANCH_LEDGER_STORE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reports_directory: PathBuf,
    pub store_path: PathBuf,
    pub ignore_patterns: Vec<String>,
    pub file_extensions: Vec<String>,
    pub max_file_size: u64,
    pub sites: SiteNames,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// "text" or "json"
    pub format: String,
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
            file_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reports_directory: PathBuf::from("."),
            store_path: PathBuf::from("ranch-inventory.json"),
            ignore_patterns: vec![
                ".git".to_string(),
                "target".to_string(),
                "*.tmp".to_string(),
                "*.bak".to_string(),
            ],
            file_extensions: vec![
                "xlsx".to_string(),
                "xlsm".to_string(),
                "xlsb".to_string(),
                "xls".to_string(),
                "ods".to_string(),
            ],
            max_file_size: 20 * 1024 * 1024, // 20MB
            sites: SiteNames::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path (~/.ranch-ledger.toml)
    pub fn default_config_path() -> crate::Result<PathBuf> {
        let home_dir = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(PathBuf::from(home_dir).join(".ranch-ledger.toml"))
    }

    /// Load config from the default location, falling back to defaults if the
    /// file doesn't exist
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::default_config_path()?;

        let config = if config_path.exists() {
            tracing::info!(path = %config_path.display(), "loading configuration");
            Self::from_file(&config_path)?
        } else {
            tracing::info!(path = %config_path.display(), "no config file, using defaults");
            Self::default()
        };

        Ok(config.with_env_overrides())
    }

    /// Load config from a specific file path
    pub fn from_file(path: &PathBuf) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config.with_env_overrides())
    }

    /// Save config to a file
    pub fn to_file(&self, path: &PathBuf) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(store_path) = env::var_os(STORE_PATH_ENV).filter(|value| !value.is_empty()) {
            self.store_path = PathBuf::from(store_path);
        }
        self
    }

    /// Create a config file with all available options documented
    pub fn create_documented_config() -> String {
        r#"# Ranch Ledger Configuration File
# Controls how monthly movement reports are discovered, read and stored

# Directory scanned by `ranch-ledger import-dir` when no directory is given
reports_directory = "."

# Inventory store (JSON). Can also be set with RANCH_LEDGER_STORE
store_path = "ranch-inventory.json"

# File or directory names skipped during discovery ("*.ext" and "prefix*" allowed)
ignore_patterns = [".git", "target", "*.tmp", "*.bak"]

# Spreadsheet extensions treated as reports
file_extensions = ["xlsx", "xlsm", "xlsb", "xls", "ods"]

# Largest report read, in bytes (default 20MB)
max_file_size = 20971520

# Site names as they appear under each "INVENTARIO DE GANADO" header, and the
# names stored on inventory records
[sites.primary]
header = "EL ROSARIO"
display = "El Rosario"

[sites.secondary]
header = "SANTA FE"
display = "Santa Fe"

[logging]
# tracing filter, e.g. "info" or "ranch_ledger=debug" (RUST_LOG takes precedence)
level = "warn"

# "text" or "json"
format = "text"

# Append logs to a file instead of stderr
# file_path = "ranch-ledger.log"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_config_parses_to_defaults() {
        let config: Config = toml::from_str(&Config::create_documented_config()).unwrap();
        let defaults = Config::default();

        assert_eq!(config.store_path, defaults.store_path);
        assert_eq!(config.file_extensions, defaults.file_extensions);
        assert_eq!(config.max_file_size, defaults.max_file_size);
        assert_eq!(config.sites, defaults.sites);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
store_path = "/var/lib/ranch/inventory.json"

[sites.secondary]
header = "LA LOMA"
display = "La Loma"
"#,
        )
        .unwrap();

        assert_eq!(config.store_path, PathBuf::from("/var/lib/ranch/inventory.json"));
        assert_eq!(config.sites.secondary.display, "La Loma");
        assert_eq!(config.sites.primary, SiteNames::default().primary);
        assert_eq!(config.file_extensions.len(), 5);
    }

    #[test]
    fn round_trips_through_file() {
        let dir = std::env::temp_dir().join(format!("ranch-ledger-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");

        let mut config = Config::default();
        config.max_file_size = 1024;
        config.to_file(&path).unwrap();

        let loaded: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.max_file_size, 1024);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
