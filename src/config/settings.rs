//! Application settings loaded from `config.toml`.
//!
//! The file seeds the catalog skeleton (categories with their subcategories, and
//! warehouses) on startup and tunes the bulk import limits. Every section is
//! optional; a missing file yields the defaults.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Largest CSV payload accepted by bulk import (10 MiB).
pub const DEFAULT_IMPORT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Bulk import limits
    #[serde(default)]
    pub import: ImportConfig,
    /// Warehouses to create when missing
    #[serde(default)]
    pub warehouses: Vec<WarehouseConfig>,
    /// Categories (and their subcategories) to create when missing
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

/// Bulk import settings
#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Maximum accepted CSV size in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_IMPORT_MAX_BYTES,
        }
    }
}

const fn default_max_bytes() -> usize {
    DEFAULT_IMPORT_MAX_BYTES
}

/// A warehouse to seed
#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    /// Warehouse location name
    pub location: String,
}

/// A category to seed
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Category name
    pub name: String,
    /// Subcategory names under this category
    #[serde(default)]
    pub subcategories: Vec<String>,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads configuration from `./config.toml`, or the defaults if the file is absent.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if !path.exists() {
        tracing::info!("No config.toml found, using default settings.");
        return Ok(AppConfig::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [import]
            max_bytes = 2048

            [[warehouses]]
            location = "Main Warehouse"

            [[warehouses]]
            location = "Downtown Store"

            [[categories]]
            name = "Guitars"
            subcategories = ["Electric", "Acoustic"]

            [[categories]]
            name = "Drums"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.import.max_bytes, 2048);
        assert_eq!(config.warehouses.len(), 2);
        assert_eq!(config.warehouses[1].location, "Downtown Store");
        assert_eq!(config.categories[0].subcategories, vec!["Electric", "Acoustic"]);
        assert!(config.categories[1].subcategories.is_empty());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.import.max_bytes, DEFAULT_IMPORT_MAX_BYTES);
        assert!(config.warehouses.is_empty());
        assert!(config.categories.is_empty());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
