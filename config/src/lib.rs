//! # livecfg
//!
//! Managed configuration: typed configuration objects kept in sync with
//! their persisted documents.
//!
//! This crate provides:
//! - Path addressing into documents (`/server/endpoints[0]/port`)
//! - Stores persisting one whole document per location (files, memory)
//! - Source sets merging several stores with precedence and write routing
//! - Managed handles that reload on every read and persist on every write
//! - Transactions batching many writes into one persisted write
//!
//! # Usage
//!
//! ```rust,no_run
//! use livecfg::{Settings, config_shape};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Limits {
//!     retries: u32,
//! }
//!
//! config_shape! {
//!     pub trait LimitsAccess for Limits {
//!         fields { retries / set_retries: u32 }
//!     }
//! }
//!
//! # fn main() -> Result<(), livecfg::ConfigError> {
//! let limits = livecfg::setup(
//!     ["/etc/app/limits.toml", "/home/me/.app/limits.toml"],
//!     || Limits { retries: 3 },
//!     &Settings::default(),
//! )?;
//!
//! let tx = limits.config().start_transaction();
//! limits.set_retries(5)?;
//! limits.set_retries(6)?;
//! tx.commit()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Threading
//! Handles are single-threaded (`!Send`, `!Sync`). Share a configuration
//! across threads by giving each thread its own handle over the same
//! locations.

pub mod binding;
pub mod config;
pub mod document;
pub mod format;
pub mod handle;
mod macros;
pub mod path;
pub mod settings;
pub mod source;
pub mod store;
pub mod transaction;

pub use binding::{Field, Sections, Shape};
pub use config::Config;
pub use document::{Document, DocumentNode};
pub use errors::{ConfigError, PathError};
pub use format::DocumentFormat;
pub use handle::{Managed, Node};
pub use path::{Path, Segment};
pub use settings::{Settings, load_from_env};
pub use source::{Persistable, SourceSet, SourceSpec};
pub use store::{FileStore, MemoryStore, Store};
pub use transaction::Transaction;

/// Create a managed configuration over file `locations`, in ascending precedence.
///
/// Defaults from `create_default` are persisted first when none of the
/// locations holds a document yet.
pub fn setup<T, I>(
    locations: I,
    create_default: impl Fn() -> T + 'static,
    settings: &Settings,
) -> Result<Managed<T>, ConfigError>
where
    T: Shape,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    setup_with(SourceSet::from_files(locations, settings)?, create_default)
}

/// Create a managed configuration over an explicit source set.
pub fn setup_with<T: Shape>(
    sources: SourceSet,
    create_default: impl Fn() -> T + 'static,
) -> Result<Managed<T>, ConfigError> {
    Config::create(create_default, sources)?.managed()
}
