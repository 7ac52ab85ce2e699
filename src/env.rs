//! Name→value bindings shared by reference across an execution.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A shared, mutable name table.
///
/// Cloning a `Scope` clones the handle, not the table: the globals scope is
/// one table visible to the whole execution, includes and user-function
/// closures included. Locals are a fresh `Scope` per user-function call and
/// absent at top level and inside includes.
#[derive(Clone, Default)]
pub struct Scope {
    vars: Rc<RefCell<HashMap<String, Value>>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars.borrow().get(name).cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }

    /// Insert `value` under `name` only when the name is not already bound.
    pub fn set_if_absent(&self, name: &str, value: Value) {
        let mut vars = self.vars.borrow_mut();
        if !vars.contains_key(name) {
            vars.insert(name.to_string(), value);
        }
    }

    pub fn len(&self) -> usize {
        self.vars.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.borrow().is_empty()
    }
}
