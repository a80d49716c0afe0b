//! # Document Formats
//!
//! Text codecs for persisted documents (TOML, YAML, JSON).
//!
//! The format of a file location is detected from its extension.

use crate::document::Document;
use errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path as FsPath;
use std::str::FromStr;

/// Text representation of a persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Toml,
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Toml => "toml",
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Json => "json",
        }
    }

    /// Detect the format of a location from its extension.
    ///
    /// ## Supported Extensions
    /// - `.toml`: TOML
    /// - `.yaml` / `.yml`: YAML
    /// - `.json`: JSON
    ///
    /// A location without an extension uses `fallback`.
    pub fn detect(location: &str, fallback: DocumentFormat) -> Result<Self, ConfigError> {
        let Some(extension) = FsPath::new(location).extension().and_then(|s| s.to_str()) else {
            return Ok(fallback);
        };

        extension.parse()
    }

    pub fn parse(&self, text: &str, location: &str) -> Result<Document, ConfigError> {
        let parsed = match self {
            DocumentFormat::Toml => toml::from_str::<Document>(text).map_err(|e| e.to_string()),
            DocumentFormat::Yaml => {
                serde_yaml::from_str::<Document>(text).map_err(|e| e.to_string())
            }
            DocumentFormat::Json => {
                serde_json::from_str::<Document>(text).map_err(|e| e.to_string())
            }
        };

        parsed.map_err(|reason| ConfigError::Parse {
            location: location.to_string(),
            format: self.as_str().to_string(),
            reason,
        })
    }

    pub fn serialize(&self, document: &Document, pretty: bool) -> Result<String, ConfigError> {
        let text = match (self, pretty) {
            (DocumentFormat::Toml, true) => toml::to_string_pretty(document).map_err(|e| e.to_string()),
            (DocumentFormat::Toml, false) => toml::to_string(document).map_err(|e| e.to_string()),
            (DocumentFormat::Yaml, _) => serde_yaml::to_string(document).map_err(|e| e.to_string()),
            (DocumentFormat::Json, true) => {
                serde_json::to_string_pretty(document).map_err(|e| e.to_string())
            }
            (DocumentFormat::Json, false) => serde_json::to_string(document).map_err(|e| e.to_string()),
        };

        text.map_err(|reason| ConfigError::Serialize {
            format: self.as_str().to_string(),
            reason,
        })
    }
}

impl FromStr for DocumentFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "toml" => Ok(DocumentFormat::Toml),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
