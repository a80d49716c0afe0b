//! # livecfg Errors
//!
//! Error handling for the managed-configuration engine.
//!
//! - Uses `thiserror` for structured error definitions
//! - Every variant carries named fields so messages stay debuggable
//! - `PathError` is raised by document path parsing and navigation,
//!   `ConfigError` by everything that touches a store

use thiserror::Error;

/// Document path errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A segment met a node it cannot step into, or the key/index is absent.
    #[error("Cannot navigate '{segment}' on {found}: {reason}")]
    Navigation {
        segment: String,
        found: String,
        reason: String
    },

    #[error("Malformed path '{input}' at offset {offset}: {reason}")]
    Format {
        input: String,
        offset: usize,
        reason: String
    },

    #[error("Cannot clear '{path}': final segment must be a key")]
    Unclearable { path: String }
}

impl PathError {
    pub fn is_navigation(&self) -> bool {
        matches!(self, PathError::Navigation { .. })
    }
}

/// Configuration engine errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Nothing persisted at {location}")]
    NotFound { location: String },

    #[error("Cannot activate a default {type_name}: {reason}")]
    Activation { type_name: String, reason: String },

    #[error("IO error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error
    },

    #[error("Failed to parse {format} document from {location}: {reason}")]
    Parse {
        location: String,
        format: String,
        reason: String
    },

    #[error("Failed to serialize {format} document: {reason}")]
    Serialize { format: String, reason: String },

    #[error("Failed to map document: {reason}")]
    Mapping { reason: String },

    #[error("Unsupported document format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("No configuration source given")]
    NoSources,

    /// The live object is already borrowed by an enclosing get/set closure.
    #[error("Configuration handle is busy")]
    Busy
}

impl ConfigError {
    pub fn io(location: impl Into<String>, source: std::io::Error) -> Self {
        ConfigError::Io {
            location: location.into(),
            source
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_message_names_segment_and_kind() {
        let err = PathError::Navigation {
            segment: "/port".to_string(),
            found: "array".to_string(),
            reason: "not a table".to_string()
        };
        let msg = err.to_string();
        assert!(msg.contains("/port"));
        assert!(msg.contains("array"));
        assert!(err.is_navigation());
    }

    #[test]
    fn test_path_error_converts_into_config_error() {
        let err: ConfigError = PathError::Unclearable {
            path: "/a[0]".to_string()
        }
        .into();
        assert!(matches!(err, ConfigError::Path(PathError::Unclearable { .. })));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = ConfigError::io(
            "cfg.toml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
        );
        assert!(err.to_string().contains("cfg.toml"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
