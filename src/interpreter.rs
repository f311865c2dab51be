/*!
Tree-walking evaluator.

Executes resolved programs by direct recursion over the syntax tree, one
activation per `call`, depth-first and single-threaded.

Two pieces of state do most of the work:

- the **environment chain** (`Rc<RefCell<Environment>>`): `environment`
  points at the innermost live frame and is swapped for the duration of a
  block or call, then restored on every exit path, normal or not;
- the **side table** (`locals`): node address → scope distance, populated by
  the resolver before execution.  An expression present in the table reads
  and writes through `get_at`/`assign_at` on the current chain; an absent
  one goes straight to globals.  Run-of-the-mill programs never search.

Statement execution returns a [`Completion`] so `return` can unwind through
nested blocks and loops to the owning call activation as an ordinary value,
leaving the error channel to actual errors.

Output from `print` goes through an injectable `Write` sink, stdout unless a
test substitutes its own buffer.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::class::{RoxClass, RoxInstance};
use crate::environment::Environment;
use crate::error::{Result, RoxError};
use crate::function::RoxFunction;
use crate::token::{Token, TokenType};
use crate::value::{NativeFunction, Value};

/// How a statement finished: fell through, or hit `return`.
#[derive(Debug)]
pub enum Completion<'a> {
    Normal,
    Return(Value<'a>),
}

pub struct Interpreter<'a> {
    globals: Rc<RefCell<Environment<'a>>>,
    environment: Rc<RefCell<Environment<'a>>>,
    locals: HashMap<usize, usize>,
    output: Box<dyn Write>,
}

impl<'a> Interpreter<'a> {
    /// An interpreter printing to stdout, with the native functions already
    /// installed in globals.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Like [`Interpreter::new`], but `print` writes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(NativeFunction {
                name: "clock",
                arity: 0,
                func: native_clock,
            }),
        );

        info!("Interpreter created, natives installed");

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    // ───────────────────── resolver interface ─────────────────────

    /// Record that `expr` refers to a binding `distance` scopes out.
    /// Called by the resolver; node addresses are stable because the tree
    /// outlives the interpreter and is never mutated.
    pub fn note_local(&mut self, expr: &Expr<'a>, distance: usize) {
        self.locals.insert(node_addr(expr), distance);
    }

    /// The resolved side table (node address → distance).
    pub fn locals(&self) -> &HashMap<usize, usize> {
        &self.locals
    }

    // ──────────────────────── entry points ────────────────────────

    /// Execute a resolved program.  The first runtime error aborts the
    /// remaining statements and is returned to the driver.
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for statement in statements {
            // Top-level `return` is rejected statically, so no completion
            // other than Normal can surface here.
            self.execute(statement)?;
        }

        Ok(())
    }

    /// Evaluate a single expression, for the `evaluate` driver stage.
    pub fn evaluate_expression(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        self.evaluate(expr)
    }

    // ───────────────────────── statements ─────────────────────────

    fn execute(&mut self, stmt: &'a Stmt<'a>) -> Result<Completion<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Completion::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{value}")?;

                Ok(Completion::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(name.lexeme, value);

                Ok(Completion::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(self.environment.clone());

                self.execute_block(statements, Rc::new(RefCell::new(frame)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Completion::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body)? {
                        Completion::Normal => {}
                        ret @ Completion::Return(_) => return Ok(ret),
                    }
                }

                Ok(Completion::Normal)
            }

            Stmt::Function { name, params, body } => {
                let function =
                    RoxFunction::new(name, params, body, self.environment.clone(), false);

                self.environment
                    .borrow_mut()
                    .define(name.lexeme, Value::Function(Rc::new(function)));

                Ok(Completion::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Completion::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass, methods),
        }
    }

    /// Run `statements` with `environment` as the innermost frame, then put
    /// the previous frame back no matter how execution ended.
    pub fn execute_block(
        &mut self,
        statements: &'a [Stmt<'a>],
        environment: Rc<RefCell<Environment<'a>>>,
    ) -> Result<Completion<'a>> {
        let previous = mem::replace(&mut self.environment, environment);

        let mut outcome = Ok(Completion::Normal);

        for statement in statements {
            match self.execute(statement) {
                Ok(Completion::Normal) => continue,
                other => {
                    outcome = other;

                    break;
                }
            }
        }

        self.environment = previous;

        outcome
    }

    fn execute_class(
        &mut self,
        name: &'a Token<'a>,
        superclass: &'a Option<Expr<'a>>,
        methods: &'a [Stmt<'a>],
    ) -> Result<Completion<'a>> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass_value = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let line = match expr {
                        Expr::Variable(token) => token.line,
                        _ => name.line,
                    };

                    return Err(RoxError::runtime(line, "Superclass must be a class."));
                }
            },
            None => None,
        };

        // The name is visible (as nil) while methods are built, and the
        // finished class is assigned over it afterwards.
        self.environment.borrow_mut().define(name.lexeme, Value::Nil);

        let previous = self.environment.clone();

        if let Some(ref superclass_rc) = superclass_value {
            let mut frame = Environment::with_enclosing(self.environment.clone());
            frame.define("super", Value::Class(superclass_rc.clone()));

            self.environment = Rc::new(RefCell::new(frame));
        }

        let mut method_map: HashMap<&'a str, Rc<RoxFunction<'a>>> = HashMap::new();

        for method in methods {
            if let Stmt::Function {
                name: method_name,
                params,
                body,
            } = method
            {
                let function = RoxFunction::new(
                    method_name,
                    params,
                    body,
                    self.environment.clone(),
                    method_name.lexeme == "init",
                );

                method_map.insert(method_name.lexeme, Rc::new(function));
            }
        }

        let class = RoxClass::new(name.lexeme, superclass_value, method_map);

        self.environment = previous;

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        Ok(Completion::Normal)
    }

    // ───────────────────────── expressions ────────────────────────

    fn evaluate(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RoxError::runtime(
                            operator.line,
                            "Operand must be a number.",
                        )),
                    },

                    TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

                    _ => unreachable!("parser only builds '!' and '-' unaries"),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                // Short-circuit yields the deciding operand itself, not a
                // coerced boolean.
                let keep_left = match operator.token_type {
                    TokenType::OR => is_truthy(&left),
                    _ => !is_truthy(&left),
                };

                if keep_left {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable(name) => self.look_up_variable(name, expr),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(&node_addr(expr)) {
                    Some(&distance) => {
                        self.environment
                            .borrow_mut()
                            .assign_at(distance, name.lexeme, value.clone());
                    }
                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut argument_values = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    argument_values.push(self.evaluate(argument)?);
                }

                self.call_value(callee, argument_values, paren)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => RoxInstance::get(&instance, name),
                _ => Err(RoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;

                    instance.borrow_mut().set(name, value.clone());

                    Ok(value)
                }
                _ => Err(RoxError::runtime(name.line, "Only instances have fields.")),
            },

            Expr::This(keyword) => self.look_up_variable(keyword, expr),

            Expr::Super { keyword, method } => {
                let distance = *self
                    .locals
                    .get(&node_addr(expr))
                    .expect("unresolved 'super' expression");

                let superclass_value = self.environment.borrow().get_at(distance, "super");
                let receiver_value = self.environment.borrow().get_at(distance - 1, "this");

                let (Value::Class(superclass), Value::Instance(receiver)) =
                    (superclass_value, receiver_value)
                else {
                    unreachable!("'super' frames hold a class one hop out from 'this'");
                };

                match superclass.find_method(method.lexeme) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(receiver)))),
                    None => Err(RoxError::runtime(
                        keyword.line,
                        format!("Undefined property '{}'.", method.lexeme),
                    )),
                }
            }
        }
    }

    fn binary(
        &mut self,
        left: &'a Expr<'a>,
        operator: &'a Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = numeric_operands(left, right, operator)?;

                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = numeric_operands(left, right, operator)?;

                Ok(Value::Number(a * b))
            }

            // Division is IEEE-754: dividing by zero produces an infinity
            // (or NaN for 0/0), never an error.
            TokenType::SLASH => {
                let (a, b) = numeric_operands(left, right, operator)?;

                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = numeric_operands(left, right, operator)?;

                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = numeric_operands(left, right, operator)?;

                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = numeric_operands(left, right, operator)?;

                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = numeric_operands(left, right, operator)?;

                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => unreachable!("parser only builds arithmetic, comparison and equality binaries"),
        }
    }

    // ─────────────────────────── calls ────────────────────────────

    fn call_value(
        &mut self,
        callee: Value<'a>,
        arguments: Vec<Value<'a>>,
        paren: &'a Token<'a>,
    ) -> Result<Value<'a>> {
        match callee {
            Value::NativeFunction(native) => {
                check_arity(native.arity, arguments.len(), paren)?;

                (native.func)(&arguments)
                    .map_err(|message| RoxError::runtime(paren.line, message))
            }

            Value::Function(function) => {
                check_arity(function.arity(), arguments.len(), paren)?;

                function.call(self, arguments)
            }

            Value::Class(class) => {
                check_arity(class.arity(), arguments.len(), paren)?;

                self.instantiate(class, arguments)
            }

            _ => Err(RoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    /// Calling a class makes a fresh instance and runs `init` on it (bound
    /// to the new instance) when the class has one.
    fn instantiate(
        &mut self,
        class: Rc<RoxClass<'a>>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(RefCell::new(RoxInstance::new(class.clone())));

        if let Some(initializer) = class.find_method("init") {
            initializer.bind(instance.clone()).call(self, arguments)?;
        }

        Ok(Value::Instance(instance))
    }

    // ────────────────────── variable lookups ──────────────────────

    fn look_up_variable(&self, name: &'a Token<'a>, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match self.locals.get(&node_addr(expr)) {
            Some(&distance) => Ok(self.environment.borrow().get_at(distance, name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }
}

impl Default for Interpreter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────── free helpers ───────────────────────────

/// An expression node's identity is its address.
#[inline(always)]
fn node_addr(expr: &Expr<'_>) -> usize {
    expr as *const Expr<'_> as usize
}

/// `false` and `nil` are falsy; every other value, `0` and `""` included,
/// is truthy.
#[inline(always)]
fn is_truthy(value: &Value<'_>) -> bool {
    !matches!(value, Value::Nil | Value::Bool(false))
}

fn literal_value<'a>(literal: &LiteralValue) -> Value<'a> {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn check_arity(arity: usize, supplied: usize, paren: &Token<'_>) -> Result<()> {
    if supplied != arity {
        return Err(RoxError::runtime(
            paren.line,
            format!("Expected {arity} arguments but got {supplied}."),
        ));
    }

    Ok(())
}

fn numeric_operands(
    left: Value<'_>,
    right: Value<'_>,
    operator: &Token<'_>,
) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((a, b)),
        _ => Err(RoxError::runtime(operator.line, "Operands must be numbers.")),
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
fn native_clock<'a>(_arguments: &[Value<'a>]) -> std::result::Result<Value<'a>, String> {
    Ok(Value::Number(
        chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
    ))
}
