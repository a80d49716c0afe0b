//! # Engine Settings
//!
//! Settings shared by every store created for a managed configuration.
//!
//! # Environment Variables
//! - `LIVECFG_FORMAT`: format for locations without an extension
//!   (toml/yaml/json, default: "toml")
//! - `LIVECFG_PRETTY`: pretty-print persisted documents (true/false,
//!   default: true)
//! - `LIVECFG_CREATE_DIRS`: create missing parent directories on save
//!   (true/false, default: true)

use crate::format::DocumentFormat;
use errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;

/// Settings applied to the stores of a managed configuration.
///
/// ## Usage
/// ```rust
/// use livecfg::{DocumentFormat, Settings};
///
/// let settings = Settings {
///     default_format: DocumentFormat::Yaml,
///     ..Settings::default()
/// };
/// assert!(settings.pretty);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Format used for locations that carry no file extension
    #[serde(default)]
    pub default_format: DocumentFormat,

    /// Pretty-print persisted documents
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Create missing parent directories when saving a file store
    #[serde(default = "default_true")]
    pub create_dirs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: DocumentFormat::default(),
            pretty: true,
            create_dirs: true,
        }
    }
}

/// Load settings from `LIVECFG_*` environment variables.
///
/// Unset variables keep their defaults; set but unparsable variables are an
/// `InvalidSetting` error.
pub fn load_from_env() -> Result<Settings, ConfigError> {
    let defaults = Settings::default();

    Ok(Settings {
        default_format: parse_env("LIVECFG_FORMAT")?.unwrap_or(defaults.default_format),
        pretty: parse_env("LIVECFG_PRETTY")?.unwrap_or(defaults.pretty),
        create_dirs: parse_env("LIVECFG_CREATE_DIRS")?.unwrap_or(defaults.create_dirs),
    })
}

fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidSetting {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            env::remove_var("LIVECFG_FORMAT");
            env::remove_var("LIVECFG_PRETTY");
            env::remove_var("LIVECFG_CREATE_DIRS");
        }
    }

    #[test]
    #[serial]
    fn test_load_from_env_defaults() {
        clear_env();
        let settings = load_from_env().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    #[serial]
    fn test_load_from_env_overrides() {
        unsafe {
            env::set_var("LIVECFG_FORMAT", "yaml");
            env::set_var("LIVECFG_PRETTY", "false");
        }

        let settings = load_from_env().unwrap();
        assert_eq!(settings.default_format, DocumentFormat::Yaml);
        assert!(!settings.pretty);
        assert!(settings.create_dirs);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_invalid_value() {
        unsafe {
            env::set_var("LIVECFG_CREATE_DIRS", "sometimes");
        }

        let result = load_from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSetting { ref key, .. }) if key == "LIVECFG_CREATE_DIRS"
        ));

        clear_env();
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: Settings = toml::from_str("default_format = \"json\"").unwrap();
        assert_eq!(settings.default_format, DocumentFormat::Json);
        assert!(settings.pretty);
        assert!(settings.create_dirs);
    }
}
