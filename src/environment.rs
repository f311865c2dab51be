/*!
Lexically nested variable scopes.

Each [`Environment`] is one frame mapping names to values plus an optional
link to its enclosing frame.  Frames are shared through `Rc<RefCell<..>>` so
closures can keep their defining scope alive after the block that created it
has finished executing.

Lookups come in two flavors.  [`Environment::get`]/[`Environment::assign`]
walk the chain outward and can fail with `Undefined variable`; they serve
globals, which stay late-bound.  [`Environment::get_at`] and
[`Environment::assign_at`] jump straight to a frame the resolver measured
and never fail: if the frame or name is missing, the static analysis that
vouched for it is broken, and panicking is the honest response.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Result, RoxError};
use crate::token::Token;
use crate::value::Value;

/// One scope frame.  Keys borrow from the source text, so a frame never
/// outlives the program it belongs to.
#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<&'a str, Value<'a>>,
    enclosing: Option<Rc<RefCell<Environment<'a>>>>,
}

impl<'a> Environment<'a> {
    /// A root frame with no parent.  The interpreter creates exactly one of
    /// these for globals.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A frame nested inside `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment<'a>>>) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this frame.  Rebinding an existing name is allowed
    /// here; the resolver rejects duplicate declarations in local scopes
    /// before execution ever starts, so this permissiveness is only
    /// observable at global scope.
    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        self.values.insert(name, value);
    }

    /// Read `name`, searching this frame and then outward.
    pub fn get(&self, name: &Token<'a>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(ref enclosing) = self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(RoxError::runtime(
            name.line,
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    /// Overwrite an existing binding, searching this frame and then
    /// outward.  Assignment never creates a binding.
    pub fn assign(&mut self, name: &Token<'a>, value: Value<'a>) -> Result<()> {
        if let std::collections::hash_map::Entry::Occupied(mut entry) =
            self.values.entry(name.lexeme)
        {
            entry.insert(value);

            return Ok(());
        }

        if let Some(ref enclosing) = self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RoxError::runtime(
            name.line,
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    /// Read `name` from the frame exactly `distance` hops out.
    pub fn get_at(&self, distance: usize, name: &str) -> Value<'a> {
        if distance == 0 {
            return self
                .values
                .get(name)
                .cloned()
                .expect("resolved local missing from its frame");
        }

        let frame = self.ancestor(distance);
        let value = frame.borrow().values.get(name).cloned();

        value.expect("resolved local missing from its frame")
    }

    /// Write `name` in the frame exactly `distance` hops out.
    pub fn assign_at(&mut self, distance: usize, name: &'a str, value: Value<'a>) {
        if distance == 0 {
            self.values.insert(name, value);

            return;
        }

        self.ancestor(distance).borrow_mut().values.insert(name, value);
    }

    /// The frame `distance` hops out (`distance >= 1`).
    fn ancestor(&self, distance: usize) -> Rc<RefCell<Environment<'a>>> {
        let mut frame = self
            .enclosing
            .clone()
            .expect("resolver measured a deeper chain than exists");

        for _ in 1..distance {
            let next = frame
                .borrow()
                .enclosing
                .clone()
                .expect("resolver measured a deeper chain than exists");

            frame = next;
        }

        frame
    }
}
