//! # Managed Handles
//!
//! A [`Node`] is a live view of one object inside a managed configuration:
//! every read first reloads the persisted state, every write persists the
//! whole configuration afterwards.
//!
//! ```rust,no_run
//! use livecfg::{Settings, config_shape};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Server {
//!     port: u16,
//! }
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct App {
//!     name: String,
//!     server: Server,
//! }
//!
//! config_shape! {
//!     pub trait ServerAccess for Server {
//!         fields { port / set_port: u16 }
//!     }
//! }
//!
//! config_shape! {
//!     pub trait AppAccess for App {
//!         fields { name / set_name: String }
//!         sections { server: Server }
//!     }
//! }
//!
//! # fn main() -> Result<(), livecfg::ConfigError> {
//! let app = livecfg::setup(["app.toml"], App::default, &Settings::default())?;
//! app.server()?.set_port(8080)?;
//! assert_eq!(app.server()?.port()?, 8080);
//! # Ok(())
//! # }
//! ```
//!
//! # Threading
//! Handles are neither `Send` nor `Sync`. Calling into a handle from inside
//! one of its own `get`/`set` closures fails with [`ConfigError::Busy`].

use crate::binding::{Field, Locate, RootBinding, Shape};
use crate::config::Config;
use crate::path::Path;
use errors::ConfigError;
use std::fmt;
use std::rc::Rc;

/// Live handle on an object of type `T` inside the managed root object `R`.
pub struct Node<R, T> {
    root: Rc<RootBinding<R>>,
    binding: Rc<dyn Locate<R, T>>,
}

/// Handle on the root of a managed configuration.
pub type Managed<T> = Node<T, T>;

impl<R, T> Clone for Node<R, T> {
    fn clone(&self) -> Self {
        Self {
            root: Rc::clone(&self.root),
            binding: Rc::clone(&self.binding),
        }
    }
}

impl<R: Shape, T> Node<R, T> {
    pub(crate) fn new(root: Rc<RootBinding<R>>, binding: Rc<dyn Locate<R, T>>) -> Self {
        Self { root, binding }
    }

    /// Reload, then read through `select`.
    pub fn get<V>(&self, select: impl FnOnce(&T) -> V) -> Result<V, ConfigError> {
        if self.binding.is_active() {
            self.root.load()?;
        }

        let live = self.root.live.try_borrow().map_err(|_| ConfigError::Busy)?;
        Ok(select(self.binding.locate(&live)))
    }

    /// Reload, apply `mutate`, then persist the whole configuration.
    ///
    /// Because of the reload, a persisted document that cannot be parsed or
    /// mapped blocks writes as well as reads; `mutate` is not applied then.
    /// When persisting fails the in-memory object keeps the mutation.
    pub fn set<V>(&self, mutate: impl FnOnce(&mut T) -> V) -> Result<V, ConfigError> {
        let active = self.binding.is_active();
        if active {
            self.root.load()?;
        }

        let value = {
            let mut live = self.root.live.try_borrow_mut().map_err(|_| ConfigError::Busy)?;
            mutate(self.binding.locate_mut(&mut live))
        };

        if active {
            self.root.save()?;
        }
        Ok(value)
    }

    /// Handle on the nested configuration object behind `field`.
    pub fn section<C: Shape>(&self, field: Field<T, C>) -> Result<Node<R, C>, ConfigError>
    where
        T: Shape,
    {
        let path = self.binding.path().with_key(field.name());
        if let Some(binding) = self.root.lookup::<C>(&path) {
            return Ok(Node::new(Rc::clone(&self.root), binding));
        }

        let created = self.root.bind(&self.binding, |sections| sections.section(field))?;
        if self.binding.is_active() {
            for binding in &created {
                binding.activate();
            }
        }

        self.root
            .lookup::<C>(&path)
            .map(|binding| Node::new(Rc::clone(&self.root), binding))
            .ok_or_else(|| ConfigError::Activation {
                type_name: std::any::type_name::<C>().to_string(),
                reason: format!("section {path} is bound to another type"),
            })
    }

    /// Reload and clone the current object.
    pub fn snapshot(&self) -> Result<T, ConfigError>
    where
        T: Clone,
    {
        self.get(T::clone)
    }

    /// Location of this object inside the root document.
    pub fn path(&self) -> &Path {
        self.binding.path()
    }

    /// Untyped view of the configuration this handle belongs to.
    ///
    /// Transactions started on it also batch this handle's writes.
    pub fn config(&self) -> Config<R> {
        Config::from_parts(self.root.target.clone(), Rc::clone(&self.root.activator))
    }
}

impl<R, T> fmt::Debug for Node<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.binding.path().to_string())
            .field("active", &self.binding.is_active())
            .finish()
    }
}
