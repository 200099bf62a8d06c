//! Lexical scoping.
//!
//! A flat `Vec<HashMap<..>>` pushed and popped as blocks are entered and
//! left is enough when nothing outlives the stack, but HispanoLang has
//! closures: a function value can escape the block that created it and
//! still needs its defining scope alive. So each frame here is its own
//! `Rc<RefCell<_>>` node with an explicit `parent` link instead of an index
//! into a shared vector; a closure just clones the `Rc` of the environment
//! it was created in.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{HispanoError, Result};
use crate::value::Value;

#[derive(Debug)]
struct Frame {
    bindings: IndexMap<String, Value>,
    constants: HashSet<String>,
    parent: Option<Environment>,
}

/// A reference-counted handle to one lexical frame. Cheap to clone; cloning
/// shares the frame rather than copying its bindings.
#[derive(Debug, Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    pub fn new() -> Self {
        Environment(Rc::new(RefCell::new(Frame {
            bindings: IndexMap::new(),
            constants: HashSet::new(),
            parent: None,
        })))
    }

    /// A child frame nested inside `self` — entering a block, function call,
    /// or loop iteration all create one of these.
    pub fn child(&self) -> Self {
        Environment(Rc::new(RefCell::new(Frame {
            bindings: IndexMap::new(),
            constants: HashSet::new(),
            parent: Some(self.clone()),
        })))
    }

    pub fn define(&self, name: &str, value: Value) {
        let mut frame = self.0.borrow_mut();
        frame.bindings.insert(name.to_string(), value);
        frame.constants.remove(name);
    }

    pub fn define_constant(&self, name: &str, value: Value) {
        let mut frame = self.0.borrow_mut();
        frame.bindings.insert(name.to_string(), value);
        frame.constants.insert(name.to_string());
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        let frame = self.0.borrow();
        if let Some(value) = frame.bindings.get(name) {
            return Ok(value.clone());
        }
        match &frame.parent {
            Some(parent) => parent.get(name, line),
            None => Err(HispanoError::UndefinedVariable { name: name.to_string(), line }),
        }
    }

    /// Walks outward to the innermost frame that already defines `name` and
    /// overwrites the binding there. Fails if no frame defines it, or if the
    /// frame that does marked it a constant (`constante` bindings never
    /// reassign, even from an enclosing scope).
    pub fn assign(&self, name: &str, value: Value, line: usize) -> Result<()> {
        let mut frame = self.0.borrow_mut();
        if frame.bindings.contains_key(name) {
            if frame.constants.contains(name) {
                return Err(HispanoError::ConstantReassignment { name: name.to_string(), line });
            }
            frame.bindings.insert(name.to_string(), value);
            return Ok(());
        }
        match &frame.parent {
            Some(parent) => parent.assign(name, value, line),
            None => Err(HispanoError::UndefinedVariable { name: name.to_string(), line }),
        }
    }

    pub fn is_constant(&self, name: &str) -> bool {
        let frame = self.0.borrow();
        if frame.bindings.contains_key(name) {
            return frame.constants.contains(name);
        }
        match &frame.parent {
            Some(parent) => parent.is_constant(name),
            None => false,
        }
    }

    /// Insertion-ordered `(name, value)` pairs bound directly in this frame,
    /// not including parents — used by the REPL to report top-level state.
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        let frame = self.0.borrow();
        frame.bindings.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
