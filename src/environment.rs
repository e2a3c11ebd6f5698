//! Lexical scope frames.
//!
//! A frame owns its bindings plus a reference-counted link to the frame it
//! nests inside.  Closures keep frames alive long after the block that
//! created them has finished, so frames are shared `Rc<RefCell<_>>` handles
//! rather than stack values.  Name lookup comes in two flavours: chain
//! searches (`get`/`assign`, used for globals) and distance-indexed access
//! (`get_at`/`assign_at`, used for everything the resolver pinned down).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

fn undefined(name: &str, line: usize) -> LoxError {
    LoxError::runtime(line, format!("Undefined variable '{}'.", name))
}

impl Environment {
    /// Root frame with no parent.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// Child frame nested inside `parent`.
    pub fn with_enclosing(parent: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(parent),
        }
    }

    /// Binds `name` in this frame, shadowing any enclosing binding of the
    /// same name.  Re-declaring in the same frame is not an error; the new
    /// value simply replaces the old one.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Reads `name` from the innermost frame that binds it.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        // Own frame first; it is the one frame reachable without a RefCell.
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }

        let frame = Environment::binding_frame(self.enclosing.clone(), name)
            .ok_or_else(|| undefined(name, line))?;

        let value: Value = frame
            .borrow()
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| undefined(name, line))?;

        Ok(value)
    }

    /// Overwrites `name` in the innermost frame that already binds it.
    /// Assignment never creates a binding; a name bound nowhere on the
    /// chain is an error.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            return Ok(());
        }

        let frame = Environment::binding_frame(self.enclosing.clone(), name)
            .ok_or_else(|| undefined(name, line))?;

        frame.borrow_mut().values.insert(name.to_string(), value);

        Ok(())
    }

    /// First frame at or above `start` that already binds `name`.
    ///
    /// Both `get` and `assign` funnel through this walk; it is iterative so
    /// deeply nested closures cannot grow the native stack.
    fn binding_frame(
        start: Option<Rc<RefCell<Environment>>>,
        name: &str,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut next: Option<Rc<RefCell<Environment>>> = start;

        while let Some(frame) = next {
            if frame.borrow().values.contains_key(name) {
                return Some(frame);
            }

            next = frame.borrow().enclosing.clone();
        }

        None
    }

    /// The frame exactly `distance` parent links away, if the chain is that
    /// deep.
    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut current: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Reads `name` directly out of the frame `distance` links up, without
    /// walking the rest of the chain.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        Environment::ancestor(env, distance)
            .and_then(|frame| frame.borrow().values.get(name).cloned())
    }

    /// Writes `name` directly into the frame `distance` links up.  Returns
    /// false when the chain is shallower than `distance` or the frame has no
    /// such binding.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        match Environment::ancestor(env, distance) {
            Some(frame) => {
                let mut frame = frame.borrow_mut();

                if frame.values.contains_key(name) {
                    frame.values.insert(name.to_string(), value);
                    true
                } else {
                    false
                }
            }

            None => false,
        }
    }
}
