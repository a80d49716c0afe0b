//! # Binding Tree
//!
//! Mirrors the shape of a configuration object graph and routes every
//! access through load and save.
//!
//! The root binding owns the live object and the persistence target; it is
//! the only binding that performs I/O. A sub-binding owns nothing: it holds
//! its parent binding and the field accessor that locates its object inside
//! the parent's object, so its object is always re-derived from the root's
//! current live object, even after a load replaced the whole graph.

use crate::document::{from_document, merge, to_document};
use crate::path::Path;
use crate::source::Persistable;
use crate::transaction::TargetSlot;
use errors::ConfigError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, type_name};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// A configuration object type that can be managed.
///
/// Nested configuration objects are declared in [`Shape::sections`]; each one
/// gets its own binding. Usually implemented through [`config_shape!`].
///
/// [`config_shape!`]: crate::config_shape
pub trait Shape: Serialize + DeserializeOwned + 'static {
    /// Declare the nested configuration objects of this type.
    fn sections<R: Shape>(sections: &mut Sections<'_, R, Self>) -> Result<(), ConfigError> {
        let _ = sections;
        Ok(())
    }
}

/// Accessor for a named field of type `C` inside a `P`.
pub struct Field<P, C> {
    name: &'static str,
    get: fn(&P) -> &C,
    get_mut: fn(&mut P) -> &mut C,
}

impl<P, C> Field<P, C> {
    pub const fn new(name: &'static str, get: fn(&P) -> &C, get_mut: fn(&mut P) -> &mut C) -> Self {
        Self { name, get, get_mut }
    }

    /// Key of the field in the document.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<P, C> Clone for Field<P, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, C> Copy for Field<P, C> {}

impl<P, C> fmt::Debug for Field<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Loading,
    Saving,
}

pub(crate) trait Binding {
    fn path(&self) -> &Path;

    /// Whether accesses through this binding trigger load and save.
    fn is_active(&self) -> bool;

    fn activate(&self);
}

/// Locates the object a binding observes inside the root object `R`.
pub(crate) trait Locate<R, T>: Binding {
    fn locate<'r>(&self, root: &'r R) -> &'r T;

    fn locate_mut<'r>(&self, root: &'r mut R) -> &'r mut T;
}

#[derive(Default)]
pub(crate) struct RootLocator {
    path: Path,
    active: Cell<bool>,
}

impl Binding for RootLocator {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn activate(&self) {
        self.active.set(true);
    }
}

impl<R> Locate<R, R> for RootLocator {
    fn locate<'r>(&self, root: &'r R) -> &'r R {
        root
    }

    fn locate_mut<'r>(&self, root: &'r mut R) -> &'r mut R {
        root
    }
}

struct SubBinding<R, P, C> {
    parent: Rc<dyn Locate<R, P>>,
    field: Field<P, C>,
    path: Path,
    active: Cell<bool>,
}

impl<R, P, C> Binding for SubBinding<R, P, C> {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn activate(&self) {
        self.active.set(true);
    }
}

impl<R, P: 'static, C> Locate<R, C> for SubBinding<R, P, C> {
    fn locate<'r>(&self, root: &'r R) -> &'r C {
        (self.field.get)(self.parent.locate(root))
    }

    fn locate_mut<'r>(&self, root: &'r mut R) -> &'r mut C {
        (self.field.get_mut)(self.parent.locate_mut(root))
    }
}

type Registry = RefCell<HashMap<Path, Box<dyn Any>>>;

/// Collects the sub-bindings of one object while a binding tree is generated.
pub struct Sections<'a, R, P> {
    parent: Rc<dyn Locate<R, P>>,
    sample: &'a P,
    registry: &'a Registry,
    created: &'a mut Vec<Rc<dyn Binding>>,
}

impl<R: Shape, P: Shape> Sections<'_, R, P> {
    /// Declare `field` as a nested configuration object with its own binding.
    pub fn section<C: Shape>(&mut self, field: Field<P, C>) -> Result<(), ConfigError> {
        let path = self.parent.path().with_key(field.name());
        let sample = (field.get)(self.sample);
        if let Err(e) = to_document(sample) {
            return Err(ConfigError::Activation {
                type_name: type_name::<C>().to_string(),
                reason: format!("section {path}: {e}"),
            });
        }

        let binding = Rc::new(SubBinding {
            parent: Rc::clone(&self.parent),
            field,
            path: path.clone(),
            active: Cell::new(false),
        });
        self.created.push(binding.clone());

        let locate: Rc<dyn Locate<R, C>> = binding;
        debug!("Bound section {}", path);
        self.registry
            .borrow_mut()
            .insert(path, Box::new(Rc::clone(&locate)));

        let mut nested = Sections {
            parent: locate,
            sample,
            registry: self.registry,
            created: &mut *self.created,
        };
        C::sections(&mut nested)
    }
}

/// Owner of the live object and the persistence target of one binding tree.
pub(crate) struct RootBinding<R> {
    pub(crate) live: RefCell<R>,
    pub(crate) target: TargetSlot,
    pub(crate) activator: Rc<dyn Fn() -> R>,
    phase: Cell<Phase>,
    sections: Registry,
}

impl<R: Shape> RootBinding<R> {
    pub(crate) fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Replace the live object with the persisted state.
    ///
    /// With nothing persisted the live object stands. The live object is
    /// only replaced once the whole document mapped cleanly.
    pub(crate) fn load(&self) -> Result<(), ConfigError> {
        if self.phase.get() != Phase::Idle {
            return Ok(());
        }
        let target = self.target.current();
        if !target.exists()? {
            debug!("Nothing persisted, keeping in-memory defaults");
            return Ok(());
        }

        self.phase.set(Phase::Loading);
        let result = self.reload(&*target);
        self.phase.set(Phase::Idle);
        result
    }

    fn reload(&self, target: &dyn Persistable) -> Result<(), ConfigError> {
        let mut document = to_document(&(self.activator)())?;
        merge(&mut document, target.load()?);
        let fresh: R = from_document(document)?;

        let mut live = self.live.try_borrow_mut().map_err(|_| ConfigError::Busy)?;
        *live = fresh;
        Ok(())
    }

    /// Persist the whole live object.
    pub(crate) fn save(&self) -> Result<(), ConfigError> {
        if self.phase.get() != Phase::Idle {
            return Ok(());
        }

        self.phase.set(Phase::Saving);
        let result = self.persist();
        self.phase.set(Phase::Idle);
        result
    }

    fn persist(&self) -> Result<(), ConfigError> {
        let document = {
            let live = self.live.try_borrow().map_err(|_| ConfigError::Busy)?;
            to_document(&*live)?
        };
        self.target.current().save(&document)
    }

    pub(crate) fn lookup<C: Shape>(&self, path: &Path) -> Option<Rc<dyn Locate<R, C>>> {
        self.sections
            .borrow()
            .get(path)
            .and_then(|entry| entry.downcast_ref::<Rc<dyn Locate<R, C>>>())
            .cloned()
    }

    /// Generate the bindings below `parent`, in top-down order and inactive.
    pub(crate) fn bind<P: Shape>(
        &self,
        parent: &Rc<dyn Locate<R, P>>,
        generate: impl FnOnce(&mut Sections<'_, R, P>) -> Result<(), ConfigError>,
    ) -> Result<Vec<Rc<dyn Binding>>, ConfigError> {
        let mut created: Vec<Rc<dyn Binding>> = Vec::new();
        {
            let live = self.live.try_borrow().map_err(|_| ConfigError::Busy)?;
            let sample = parent.locate(&live);
            let mut sections = Sections {
                parent: Rc::clone(parent),
                sample,
                registry: &self.sections,
                created: &mut created,
            };
            generate(&mut sections)?;
        }
        Ok(created)
    }
}

/// Build the binding tree of a root object and activate it top-down.
pub(crate) fn bind_root<R: Shape>(
    target: TargetSlot,
    activator: Rc<dyn Fn() -> R>,
) -> Result<(Rc<RootBinding<R>>, Rc<dyn Locate<R, R>>), ConfigError> {
    let default = activator();
    to_document(&default).map_err(|e| ConfigError::Activation {
        type_name: type_name::<R>().to_string(),
        reason: e.to_string(),
    })?;

    let root = Rc::new(RootBinding {
        live: RefCell::new(default),
        target,
        activator,
        phase: Cell::new(Phase::Idle),
        sections: RefCell::new(HashMap::new()),
    });
    let locator = Rc::new(RootLocator::default());
    let parent: Rc<dyn Locate<R, R>> = locator.clone();
    let created = root.bind(&parent, |sections| R::sections(sections))?;

    locator.activate();
    for binding in &created {
        binding.activate();
    }
    debug!("Activated binding tree of {} with {} sections", type_name::<R>(), created.len());

    Ok((root, parent))
}
