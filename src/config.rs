//! Configuration management and validation.
//!
//! Provides the [`ImportConfig`] passed explicitly to every pipeline stage.
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command-line overrides applied by the CLI.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BATCH_SIZE, DEFAULT_MAX_FILE_SIZE_BYTES,
    DEFAULT_MAX_ROWS, DEFAULT_PREVIEW_SAMPLE_ROWS, DEFAULT_PROGRESS_INTERVAL_ROWS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Limits and tuning knobs for a single import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Maximum number of data rows accepted (header excluded)
    pub max_rows: usize,

    /// Maximum accepted buffer size in bytes
    pub max_file_size_bytes: usize,

    /// Persistence instructions per batch
    pub batch_size: usize,

    /// Row-level progress is emitted every N rows
    pub progress_interval_rows: usize,

    /// Number of parsed rows echoed back by a validation preview
    pub preview_sample_rows: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval_rows: DEFAULT_PROGRESS_INTERVAL_ROWS,
            preview_sample_rows: DEFAULT_PREVIEW_SAMPLE_ROWS,
        }
    }
}

impl ImportConfig {
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_max_file_size_bytes(mut self, bytes: usize) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_progress_interval(mut self, rows: usize) -> Self {
        self.progress_interval_rows = rows;
        self
    }

    pub fn with_preview_sample_rows(mut self, rows: usize) -> Self {
        self.preview_sample_rows = rows;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_rows == 0 {
            return Err("max_rows must be greater than 0".to_string());
        }
        if self.max_file_size_bytes == 0 {
            return Err("max_file_size_bytes must be greater than 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.progress_interval_rows == 0 {
            return Err("progress_interval_rows must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Default configuration file location (`<config dir>/grade-import/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Unable to determine configuration directory"))
    }

    /// Parse configuration from TOML text; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Invalid configuration file: {}", e)))?;
        config.validate().map_err(Error::configuration)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(
                format!("Failed to read config file {}", path.display()),
                e,
            )
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Load defaults, then the explicit file if given, else the default
    /// config file when it exists
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        match config_file {
            Some(path) => Self::from_file(path),
            None => match Self::default_config_path() {
                Ok(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert_eq!(config.max_rows, 1000);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.progress_interval_rows, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = ImportConfig::default()
            .with_max_rows(20)
            .with_batch_size(5)
            .with_progress_interval(2);
        assert_eq!(config.max_rows, 20);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.progress_interval_rows, 2);
    }

    #[test]
    fn test_validation_rejects_zero_batch_size() {
        let config = ImportConfig::default().with_batch_size(0);
        assert!(config.validate().unwrap_err().contains("batch_size"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ImportConfig::from_toml_str("batch_size = 25\n").unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.max_rows, 1000);
    }

    #[test]
    fn test_invalid_toml_values_rejected() {
        let result = ImportConfig::from_toml_str("max_rows = 0\n");
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_rows = 200").unwrap();
        writeln!(file, "preview_sample_rows = 3").unwrap();

        let config = ImportConfig::load_layered(Some(file.path())).unwrap();
        assert_eq!(config.max_rows, 200);
        assert_eq!(config.preview_sample_rows, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = ImportConfig::from_file(Path::new("/nonexistent/grade-import.toml"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }
}
