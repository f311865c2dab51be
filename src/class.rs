/*!
Class and instance runtime objects.

A [`RoxClass`] is a name, an optional superclass, and a method table; method
lookup walks the superclass chain, so an override in a subclass shadows the
inherited body.  A [`RoxInstance`] points back at its class and owns a field
map that starts empty and is populated by assignment.  Fields shadow methods
on property access.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, RoxError};
use crate::function::RoxFunction;
use crate::token::Token;
use crate::value::Value;

pub struct RoxClass<'a> {
    pub name: &'a str,
    superclass: Option<Rc<RoxClass<'a>>>,
    methods: HashMap<&'a str, Rc<RoxFunction<'a>>>,
}

impl<'a> RoxClass<'a> {
    pub fn new(
        name: &'a str,
        superclass: Option<Rc<RoxClass<'a>>>,
        methods: HashMap<&'a str, Rc<RoxFunction<'a>>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Look `name` up on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<RoxFunction<'a>>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// Calling a class takes whatever its initializer takes; zero if it
    /// has none.
    pub fn arity(&self) -> usize {
        self.find_method("init")
            .map_or(0, |initializer| initializer.arity())
    }
}

impl fmt::Display for RoxClass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub struct RoxInstance<'a> {
    pub class: Rc<RoxClass<'a>>,
    fields: HashMap<&'a str, Value<'a>>,
}

impl<'a> RoxInstance<'a> {
    pub fn new(class: Rc<RoxClass<'a>>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property access: fields first, then methods (bound to the receiver).
    ///
    /// Takes the shared handle rather than `&self` because a method hit has
    /// to capture the receiver in the bound closure.
    pub fn get(
        instance: &Rc<RefCell<RoxInstance<'a>>>,
        name: &Token<'a>,
    ) -> Result<Value<'a>> {
        if let Some(value) = instance.borrow().fields.get(name.lexeme) {
            return Ok(value.clone());
        }

        let method = instance.borrow().class.find_method(name.lexeme);

        if let Some(method) = method {
            return Ok(Value::Function(Rc::new(method.bind(instance.clone()))));
        }

        Err(RoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Property write.  Creates the field if it does not exist; there is no
    /// declare step for fields.
    pub fn set(&mut self, name: &Token<'a>, value: Value<'a>) {
        self.fields.insert(name.lexeme, value);
    }
}
