//! # Document Model
//!
//! Tree of tables, arrays and values that every store persists.
//!
//! The node type is `toml::Value`; a document root is always a table.
//! Plain objects are mapped to and from documents through `serde`.

use errors::ConfigError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A single node of a document tree.
pub type DocumentNode = toml::Value;

/// The root table of a document.
pub type Document = toml::Table;

/// Human readable kind of a node, used in navigation errors.
///
/// An array whose elements are all tables is reported as a table array.
pub fn node_kind(node: &DocumentNode) -> &'static str {
    match node {
        DocumentNode::Table(_) => "table",
        DocumentNode::Array(items) if !items.is_empty() && items.iter().all(|i| i.is_table()) => {
            "table array"
        }
        DocumentNode::Array(_) => "array",
        DocumentNode::String(_) => "string",
        DocumentNode::Integer(_) => "integer",
        DocumentNode::Float(_) => "float",
        DocumentNode::Boolean(_) => "boolean",
        DocumentNode::Datetime(_) => "datetime",
    }
}

/// Overlay `overlay` onto `base`.
///
/// Tables merge key by key, recursively. Any other node, arrays included,
/// replaces the node in `base` wholesale.
pub fn merge(base: &mut Document, overlay: Document) {
    for (key, node) in overlay {
        match (base.get_mut(&key), node) {
            (Some(DocumentNode::Table(existing)), DocumentNode::Table(incoming)) => {
                merge(existing, incoming);
            }
            (_, node) => {
                base.insert(key, node);
            }
        }
    }
}

/// Map a plain object onto a document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, ConfigError> {
    match DocumentNode::try_from(value) {
        Ok(DocumentNode::Table(table)) => Ok(table),
        Ok(other) => Err(ConfigError::Mapping {
            reason: format!("object maps to a {} instead of a table", node_kind(&other)),
        }),
        Err(e) => Err(ConfigError::Mapping {
            reason: e.to_string(),
        }),
    }
}

/// Map a document back onto a plain object of type `T`.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, ConfigError> {
    DocumentNode::Table(document)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Mapping {
            reason: e.to_string(),
        })
}
