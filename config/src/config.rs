//! # Configuration Handle
//!
//! [`Config`] ties a persistence target to the factory of default objects.
//!
//! It offers untyped access to the merged document (`get`, `set`,
//! `unmanaged`), typed snapshots (`load`), transactions, and the managed
//! binding tree (`managed`). Every view created from one `Config` shares its
//! active target, so a transaction started on it batches the writes of all
//! of them.

use crate::binding::{Shape, bind_root};
use crate::document::{Document, from_document, merge, to_document};
use crate::handle::{Managed, Node};
use crate::source::{Persistable, SourceSet};
use crate::transaction::{TargetSlot, Transaction};
use errors::ConfigError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// A configuration persisted in a [`SourceSet`].
pub struct Config<T> {
    target: TargetSlot,
    activator: Rc<dyn Fn() -> T>,
}

impl<T> Clone for Config<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            activator: Rc::clone(&self.activator),
        }
    }
}

impl<T: Serialize + DeserializeOwned + 'static> Config<T> {
    /// Create a configuration over `sources`.
    ///
    /// When nothing is persisted yet the default object is written first, so
    /// a new configuration is immediately loadable.
    pub fn create(
        create_default: impl Fn() -> T + 'static,
        sources: SourceSet,
    ) -> Result<Self, ConfigError> {
        if sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        let activator: Rc<dyn Fn() -> T> = Rc::new(create_default);
        let default = to_document(&activator()).map_err(|e| ConfigError::Activation {
            type_name: type_name::<T>().to_string(),
            reason: e.to_string(),
        })?;
        sources.ensure_exists(&default)?;

        debug!("Created configuration over {}", sources.locations().join(", "));
        Ok(Self::from_parts(TargetSlot::new(Rc::new(sources)), activator))
    }

    /// Read the merged document through `select`.
    pub fn get<V>(&self, select: impl FnOnce(&Document) -> V) -> Result<V, ConfigError> {
        let document = self.target.current().load()?;
        Ok(select(&document))
    }

    /// Load the merged document, apply `mutate`, and save it back.
    pub fn set<V>(&self, mutate: impl FnOnce(&mut Document) -> V) -> Result<V, ConfigError> {
        let target = self.target.current();
        let mut document = target.load()?;
        let value = mutate(&mut document);
        target.save(&document)?;
        Ok(value)
    }

    /// Batch all saves through this configuration until the transaction closes.
    pub fn start_transaction(&self) -> Transaction {
        Transaction::start(&self.target)
    }

    /// The raw current document.
    pub fn unmanaged(&self) -> Result<Document, ConfigError> {
        self.target.current().load()
    }

    /// Typed snapshot of the persisted state; keys not persisted keep their defaults.
    pub fn load(&self) -> Result<T, ConfigError> {
        let target = self.target.current();
        let mut document = to_document(&(self.activator)())?;
        if target.exists()? {
            merge(&mut document, target.load()?);
        }
        from_document(document)
    }

    /// Managed binding tree over this configuration.
    pub fn managed(&self) -> Result<Managed<T>, ConfigError>
    where
        T: Shape,
    {
        let (root, binding) = bind_root(self.target.clone(), Rc::clone(&self.activator))?;
        Ok(Node::new(root, binding))
    }
}

impl<T> Config<T> {
    pub(crate) fn from_parts(target: TargetSlot, activator: Rc<dyn Fn() -> T>) -> Self {
        Self { target, activator }
    }
}

impl<T> fmt::Debug for Config<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("type", &type_name::<T>())
            .finish_non_exhaustive()
    }
}
