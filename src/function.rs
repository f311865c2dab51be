/*!
User-defined function values.

A [`RoxFunction`] pairs borrowed pieces of its declaration (name, parameter
tokens, body statements) with the environment that was current when the
declaration executed.  Calls always extend that captured environment, never
the caller's, which is the whole of lexical closure semantics.
*/

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::Stmt;
use crate::class::RoxInstance;
use crate::environment::Environment;
use crate::error::Result;
use crate::interpreter::{Completion, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// A function or method value.  Cheap to clone: the AST is borrowed and the
/// closure is reference-counted.
#[derive(Clone)]
pub struct RoxFunction<'a> {
    name: &'a Token<'a>,
    params: &'a [&'a Token<'a>],
    body: &'a [Stmt<'a>],
    closure: Rc<RefCell<Environment<'a>>>,
    is_initializer: bool,
}

impl<'a> RoxFunction<'a> {
    pub fn new(
        name: &'a Token<'a>,
        params: &'a [&'a Token<'a>],
        body: &'a [Stmt<'a>],
        closure: Rc<RefCell<Environment<'a>>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            name,
            params,
            body,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// A copy of this function whose closure is extended by one frame
    /// binding `this` to `instance`.  Method access does this on every
    /// lookup, so each bound method remembers its receiver.
    pub fn bind(&self, instance: Rc<RefCell<RoxInstance<'a>>>) -> RoxFunction<'a> {
        let mut frame = Environment::with_enclosing(self.closure.clone());
        frame.define("this", Value::Instance(instance));

        RoxFunction {
            name: self.name,
            params: self.params,
            body: self.body,
            closure: Rc::new(RefCell::new(frame)),
            is_initializer: self.is_initializer,
        }
    }

    /// Execute the body in a fresh frame under the captured closure.
    ///
    /// A `Return` completion becomes the call's value; falling off the end
    /// yields `nil`.  Initializers ignore both and hand back `this` from
    /// their closure, so `Foo()` and a stray `return;` inside `init` both
    /// produce the instance.
    pub fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!(
            "Calling fn '{}' with {} argument(s)",
            self.name.lexeme,
            arguments.len()
        );

        let mut frame = Environment::with_enclosing(self.closure.clone());

        for (param, argument) in self.params.iter().zip(arguments) {
            frame.define(param.lexeme, argument);
        }

        let completion = interpreter.execute_block(self.body, Rc::new(RefCell::new(frame)))?;

        if self.is_initializer {
            return Ok(self.closure.borrow().get_at(0, "this"));
        }

        match completion {
            Completion::Return(value) => Ok(value),
            Completion::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Display for RoxFunction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}
