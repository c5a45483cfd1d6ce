//! Configuration management with YAML support

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::export::OutputFormat;
use crate::transcode::DisplayZone;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Source database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Export defaults, overridable from the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub with_number: bool,

    #[serde(default)]
    pub timezone: DisplayZone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "warn" or "wadump=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_database_path() -> String {
    "ChatStorage.sqlite".to_string()
}

fn default_output_dir() -> String {
    "chats".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
            with_number: false,
            timezone: DisplayZone::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./wadump.yaml (current directory)
    /// 3. ~/.config/wadump/wadump.yaml
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut search_paths = vec![];
        if let Some(p) = path {
            let explicit = shellexpand::tilde(p).to_string();
            if !std::path::Path::new(&explicit).exists() {
                anyhow::bail!("Config file not found: {}", explicit);
            }
            search_paths.push(explicit);
        }
        search_paths.push("wadump.yaml".to_string());
        search_paths.push(shellexpand::tilde("~/.config/wadump/wadump.yaml").to_string());

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)
                    .with_context(|| format!("Failed to read config: {}", search_path))?;
                let config: Config = serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse config: {}", search_path))?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.database.path).to_string())
    }

    /// Get the export directory, expanding ~ to home directory
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.export.output_dir).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, "ChatStorage.sqlite");
        assert_eq!(config.export.output_dir, "chats");
        assert_eq!(config.export.format, OutputFormat::Text);
        assert_eq!(config.export.timezone, DisplayZone::Local);
        assert!(!config.export.with_number);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
database:
  path: ~/backup/ChatStorage.sqlite

export:
  output_dir: /tmp/chats
  format: html
  timezone: utc
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database.path, "~/backup/ChatStorage.sqlite");
        assert_eq!(config.export.format, OutputFormat::Html);
        assert_eq!(config.export.timezone, DisplayZone::Utc);
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/chats"));
        assert!(!config.export.with_number);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wadump.yaml");
        std::fs::write(&path, "logging:\n  level: debug\n").unwrap();

        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.database.path, "ChatStorage.sqlite");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.yaml");
        assert!(Config::load(path.to_str()).is_err());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "export:\n  format: pdf\n").unwrap();
        assert!(Config::load(path.to_str()).is_err());
    }
}
