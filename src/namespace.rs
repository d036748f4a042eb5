use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

/// A mutable, insertion-ordered name-to-value mapping with shared ownership.
///
/// Cloning the handle aliases the same underlying map: modules, classes and
/// instances hand their dict around by reference, so a write through any
/// alias is visible to every holder. This is the one namespace structure
/// behind module globals, class bodies, instance attributes and function
/// locals.
#[derive(Debug, Clone, Default)]
pub struct AttrDict(Rc<RefCell<IndexMap<String, Value>>>);

impl AttrDict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self(Rc::new(RefCell::new(pairs.into_iter().collect())))
    }

    /// Looks up a name, cloning the stored value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.borrow().get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    /// Binds `name` to `value`, overwriting any previous binding.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().insert(name.into(), value);
    }

    /// Removes a binding, preserving the insertion order of the remaining
    /// entries. Returns the removed value, or `None` if the name was absent.
    pub fn delete(&self, name: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(name)
    }

    /// Snapshot of all entries in insertion order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, Value)> {
        self.0.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Whether two handles alias the same underlying map.
    #[must_use]
    pub fn shares(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Selects which dict of a [`Scope`] receives writes and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveScope {
    Local,
    Module,
}

/// The three lookup tiers plus the active-write selector.
///
/// Reads consult `local`, then `module`, then `builtin`. Writes and deletes
/// go to the dict selected by `active`. At module top level `local` and
/// `module` alias the same dict, so the selector is moot there.
#[derive(Debug, Clone)]
pub struct Scope {
    pub local: AttrDict,
    pub module: AttrDict,
    pub builtin: AttrDict,
    pub active: ActiveScope,
}

impl Scope {
    /// Scope for module-level execution: `local` aliases `module`.
    #[must_use]
    pub fn module_scope(module: AttrDict, builtin: AttrDict) -> Self {
        Self {
            local: module.clone(),
            module,
            builtin,
            active: ActiveScope::Module,
        }
    }

    /// Scope for a function body: a fresh local dict in front of the module
    /// and builtin tiers.
    #[must_use]
    pub fn function_scope(local: AttrDict, module: AttrDict, builtin: AttrDict) -> Self {
        Self {
            local,
            module,
            builtin,
            active: ActiveScope::Local,
        }
    }

    /// First match across the three tiers, or `None`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.local
            .get(name)
            .or_else(|| self.module.get(name))
            .or_else(|| self.builtin.get(name))
    }

    fn active_dict(&self) -> &AttrDict {
        match self.active {
            ActiveScope::Local => &self.local,
            ActiveScope::Module => &self.module,
        }
    }

    /// Binds `name` in the active writable dict.
    pub fn bind(&self, name: impl Into<String>, value: Value) {
        self.active_dict().set(name, value);
    }

    /// Copies every pair of `dict` into the active writable dict. Used by
    /// glob imports.
    pub fn bind_all(&self, dict: &AttrDict) {
        for (name, value) in dict.pairs() {
            self.active_dict().set(name, value);
        }
    }

    /// Deletes `name` from the active writable dict. Returns false if the
    /// name was not bound there.
    pub fn unbind(&self, name: &str) -> bool {
        self.active_dict().delete(name).is_some()
    }
}

/// An activation record: a name for diagnostics and the scope it runs in.
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: Rc<str>,
    pub scope: Scope,
}

impl Frame {
    #[must_use]
    pub fn new(name: impl Into<Rc<str>>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }
}
