// SPDX-License-Identifier: MPL-2.0
//! This module handles the engine configuration stored in `settings.toml`.
//!
//! # Configuration Sections
//!
//! - `[general]` - Language override
//! - `[engine]` - Preference key, document attribute and mutation watching
//!
//! # Path Resolution
//!
//! 1. Use `load_from_path()`/`save_to_path()` with explicit path
//! 2. Set `DASHBOARD_I18N_CONFIG_DIR` environment variable
//! 3. Falls back to platform-specific config directory
//!
//! # Examples
//!
//! ```no_run
//! use dashboard_i18n::config::{self, Config};
//!
//! let (mut config, _warning) = config::load();
//! config.general.language = Some("zh-CN".to_string());
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

pub use defaults::*;

use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";

/// General settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Locale forced at startup, bypassing the stored preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Localization engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Preference store key holding the chosen locale.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Document element attribute mirroring the active locale.
    #[serde(default = "default_locale_attribute")]
    pub locale_attribute: String,

    /// Translate inserted elements automatically.
    #[serde(default = "default_observe_mutations")]
    pub observe_mutations: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            locale_attribute: default_locale_attribute(),
            observe_mutations: DEFAULT_OBSERVE_MUTATIONS,
        }
    }
}

/// Application configuration with logical sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_locale_attribute() -> String {
    DEFAULT_LOCALE_ATTRIBUTE.to_string()
}

fn default_observe_mutations() -> bool {
    DEFAULT_OBSERVE_MUTATIONS
}

fn get_config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    paths::get_app_config_dir_with_override(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads the configuration from the default path.
///
/// Returns a tuple of (config, optional_warning). If loading fails, returns
/// default config with a warning key explaining what went wrong.
pub fn load() -> (Config, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from a custom directory.
pub fn load_with_override(base_dir: Option<PathBuf>) -> (Config, Option<String>) {
    if let Some(path) = get_config_path_with_override(base_dir) {
        if path.exists() {
            match load_from_path(&path) {
                Ok(config) => return (config, None),
                Err(error) => {
                    log::warn!("failed to load {}: {error}", path.display());
                    return (
                        Config::default(),
                        Some("notification-config-load-error".to_string()),
                    );
                }
            }
        }
    }
    (Config::default(), None)
}

/// Loads configuration from a specific path.
///
/// # Errors
///
/// Returns an error when the file cannot be read or is not valid TOML.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Saves the configuration to the default path.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn save(config: &Config) -> Result<()> {
    match get_config_path_with_override(None) {
        Some(path) => save_to_path(config, &path),
        None => Ok(()),
    }
}

/// Saves configuration to a specific path, creating parent directories.
///
/// # Errors
///
/// Returns an error when serialization or the write fails.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_sections() {
        let config = Config {
            general: GeneralConfig {
                language: Some("zh-CN".to_string()),
            },
            engine: EngineConfig {
                storage_key: "lang".to_string(),
                locale_attribute: "data-lang".to_string(),
                observe_mutations: false,
            },
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = toml::from_str("[engine]\nstorage_key = \"lang\"\n").unwrap();
        assert_eq!(config.engine.storage_key, "lang");
        assert_eq!(config.engine.locale_attribute, DEFAULT_LOCALE_ATTRIBUTE);
        assert!(config.engine.observe_mutations);
        assert!(config.general.language.is_none());
    }

    #[test]
    fn load_with_override_warns_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        fs::write(temp_dir.path().join(CONFIG_FILE), "not = valid = toml").unwrap();

        let (config, warning) = load_with_override(Some(temp_dir.path().to_path_buf()));

        assert_eq!(config, Config::default());
        assert_eq!(warning.as_deref(), Some("notification-config-load-error"));
    }

    #[test]
    fn load_with_override_defaults_when_file_absent() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let (config, warning) = load_with_override(Some(temp_dir.path().to_path_buf()));
        assert_eq!(config, Config::default());
        assert!(warning.is_none());
    }

    #[test]
    fn default_engine_config_matches_constants() {
        let engine = EngineConfig::default();
        assert_eq!(engine.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(engine.locale_attribute, DEFAULT_LOCALE_ATTRIBUTE);
        assert_eq!(engine.observe_mutations, DEFAULT_OBSERVE_MUTATIONS);
    }
}
