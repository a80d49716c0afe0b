//! # Configuration Sources
//!
//! Composes one or more stores into one logical document.
//!
//! # Precedence Order
//! Sources are listed in ascending precedence: a later source overrides an
//! earlier one on conflicting keys. Tables merge key by key; any other node
//! is replaced wholesale.
//!
//! # Write Routing
//! Every source may claim subtrees of the document through routing paths.
//! The highest-precedence source without explicit routes implicitly claims
//! the whole document. On save each part of the document goes to the source
//! with the most specific claim covering it; when two sources claim the same
//! path, the higher-precedence source wins. A source that ends up owning
//! nothing is never written, and a routed source is not created for an
//! empty part. The default source is always written, so a saved
//! configuration exists afterwards even when its document is empty.

use crate::document::{Document, DocumentNode, merge};
use crate::path::{Path, Segment};
use crate::settings::Settings;
use crate::store::{FileStore, Store};
use errors::{ConfigError, PathError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A persistence target: anything a configuration can be loaded from and
/// saved to as one document.
pub trait Persistable {
    /// Whether anything has been persisted yet.
    fn exists(&self) -> Result<bool, ConfigError>;

    fn load(&self) -> Result<Document, ConfigError>;

    fn save(&self, document: &Document) -> Result<(), ConfigError>;

    /// Persist `default` once, if nothing has been persisted yet.
    fn ensure_exists(&self, default: &Document) -> Result<(), ConfigError> {
        if !self.exists()? {
            info!("No persisted configuration found, writing defaults");
            self.save(default)?;
        }
        Ok(())
    }
}

/// Serializable description of one source.
///
/// ```toml
/// [[sources]]
/// location = "/etc/app/base.toml"
///
/// [[sources]]
/// location = "~/.app/user.toml"
/// routes = ["/user", "/ui/theme"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub location: String,

    #[serde(default)]
    pub routes: Vec<Path>,
}

struct Source {
    store: Box<dyn Store>,
    routes: Vec<Path>,
}

/// Ordered composition of stores into one logical document.
#[derive(Default)]
pub struct SourceSet {
    sources: Vec<Source>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(store: impl Store + 'static) -> Self {
        Self::new().with_source(store)
    }

    /// Append a source with higher precedence than every source so far.
    pub fn with_source(mut self, store: impl Store + 'static) -> Self {
        self.sources.push(Source {
            store: Box::new(store),
            routes: Vec::new(),
        });
        self
    }

    /// Append a source that owns the subtrees named by `routes`.
    ///
    /// Every route must end in a key: a subtree carved out of another
    /// source's document is removed by key.
    pub fn with_routed_source(
        mut self,
        store: impl Store + 'static,
        routes: impl IntoIterator<Item = Path>,
    ) -> Result<Self, ConfigError> {
        let routes: Vec<Path> = routes.into_iter().collect();
        let ends_in_index =
            |route: &&Path| matches!(route.segments().last(), Some(Segment::Index(_)));
        if let Some(route) = routes.iter().find(ends_in_index) {
            return Err(PathError::Unclearable {
                path: route.to_string(),
            }
            .into());
        }

        self.sources.push(Source {
            store: Box::new(store),
            routes,
        });
        Ok(self)
    }

    /// One file source per location, in ascending precedence.
    pub fn from_files<I>(locations: I, settings: &Settings) -> Result<Self, ConfigError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut set = Self::new();
        for location in locations {
            set = set.with_source(FileStore::new(location.as_ref(), settings)?);
        }
        if set.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(set)
    }

    pub fn from_specs(specs: &[SourceSpec], settings: &Settings) -> Result<Self, ConfigError> {
        let mut set = Self::new();
        for spec in specs {
            let store = FileStore::new(&spec.location, settings)?;
            set = set.with_routed_source(store, spec.routes.iter().cloned())?;
        }
        if set.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Locations in ascending precedence.
    pub fn locations(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.store.location()).collect()
    }

    /// Location of the source a write to `path` is routed to.
    pub fn owner_of(&self, path: &Path) -> Option<&str> {
        self.claims()
            .into_iter()
            .filter(|(claim, _)| path.starts_with(claim))
            .max_by_key(|(claim, _)| claim.len())
            .map(|(_, index)| self.sources[index].store.location())
    }

    /// Route claims, one owner per path.
    fn claims(&self) -> Vec<(Path, usize)> {
        let Some(default_index) = self.default_index() else {
            return Vec::new();
        };

        let mut owners: HashMap<Path, usize> = HashMap::new();
        owners.insert(Path::root(), default_index);
        for (index, source) in self.sources.iter().enumerate() {
            for route in &source.routes {
                owners.insert(route.clone(), index);
            }
        }

        let mut claims: Vec<(Path, usize)> = owners.into_iter().collect();
        claims.sort_by_key(|(path, _)| (path.len(), path.to_string()));
        claims
    }

    /// The source receiving everything not claimed by a more specific route.
    fn default_index(&self) -> Option<usize> {
        self.sources
            .iter()
            .rposition(|s| s.routes.is_empty())
            .or_else(|| self.sources.len().checked_sub(1))
    }

    /// Split a full document into per-source documents.
    ///
    /// `None` marks a source that owns nothing and is left untouched.
    fn split(&self, document: &Document) -> Result<Vec<Option<Document>>, ConfigError> {
        let full = DocumentNode::Table(document.clone());
        let claims = self.claims();
        let mut parts: Vec<Option<Document>> = vec![None; self.sources.len()];

        for (path, owner) in &claims {
            let part = parts[*owner].get_or_insert_with(Document::new);

            match path.apply(&full) {
                Ok(DocumentNode::Table(table)) if path.is_root() => *part = table.clone(),
                Ok(node) => {
                    path.insert(part, node.clone())?;
                }
                Err(e) if e.is_navigation() => {
                    warn!(
                        "Route {} of {} is not present in the document: {}",
                        path,
                        self.sources[*owner].store.location(),
                        e
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            // Carve out subtrees that more specific routes hand to other sources.
            for (other, other_owner) in &claims {
                if other_owner != owner && other.len() > path.len() && other.starts_with(path) {
                    match other.clear(part) {
                        Ok(_) => {}
                        Err(e) if e.is_navigation() => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Ok(parts)
    }
}

impl Persistable for SourceSet {
    fn exists(&self) -> Result<bool, ConfigError> {
        for source in &self.sources {
            if source.store.exists()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn load(&self) -> Result<Document, ConfigError> {
        let mut merged: Option<Document> = None;

        for source in &self.sources {
            if !source.store.exists()? {
                continue;
            }
            let document = source.store.load_document()?;
            match merged.as_mut() {
                Some(base) => merge(base, document),
                None => merged = Some(document),
            }
        }

        merged.ok_or_else(|| ConfigError::NotFound {
            location: self.locations().join(", "),
        })
    }

    fn save(&self, document: &Document) -> Result<(), ConfigError> {
        let parts = self.split(document)?;
        let default_index = self.default_index();

        for (index, (source, part)) in self.sources.iter().zip(parts).enumerate() {
            let Some(part) = part else {
                continue;
            };
            if part.is_empty() && Some(index) != default_index && !source.store.exists()? {
                debug!("Nothing routed to {}, not creating it", source.store.location());
                continue;
            }
            source.store.save_document(&part)?;
        }

        Ok(())
    }
}
