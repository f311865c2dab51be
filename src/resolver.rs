/*!
Static resolution pass.

A single pre-order walk over the freshly parsed program, run after parsing
and before any evaluation.  It does two jobs:

1. **Binding.** For every variable-ish expression (`Variable`, `Assign`,
   `this`, `super`) it measures how many scopes out the referenced binding
   lives and records that distance in the interpreter's side table, keyed by
   the expression node itself.  Names that resolve to no surrounding scope
   are left out of the table and looked up in globals at run time, which is
   what keeps globals late-bound while locals stay frozen to the scope that
   was visible at closure creation.

2. **Static errors.** Scope-shape mistakes (`return` at top level, `this`
   outside a class, reading a local in its own initializer, and the rest of
   the catalogue below) are collected here, all of them in one walk; the
   driver refuses to execute a program that produced any.

The scope stack mirrors only *local* block structure.  A name maps to
`false` between its declaration and the end of its initializer, `true` once
it is usable; the global scope is deliberately not on the stack.
*/

use std::collections::HashMap;
use std::mem;

use log::{debug, info};

use crate::ast::{Expr, Stmt};
use crate::error::RoxError;
use crate::interpreter::Interpreter;
use crate::token::Token;

/// What kind of function body the walk is currently inside.  Gates the
/// `return` rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body the walk is currently inside.  Gates `this` and
/// `super`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'i, 'a> {
    interpreter: &'i mut Interpreter<'a>,
    scopes: Vec<HashMap<&'a str, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<RoxError>,
}

impl<'i, 'a> Resolver<'i, 'a> {
    pub fn new(interpreter: &'i mut Interpreter<'a>) -> Self {
        Self {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Resolve a whole program.  Never stops early; every error found goes
    /// into the accumulator.
    pub fn resolve(&mut self, statements: &'a [Stmt<'a>]) {
        info!("Resolving {} top-level declaration(s)", statements.len());

        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    /// All static errors found, in source order.  Empty means the program
    /// is clear to run.
    pub fn into_errors(self) -> Vec<RoxError> {
        self.errors
    }

    // ───────────────────────── statements ─────────────────────────

    fn resolve_stmt(&mut self, stmt: &'a Stmt<'a>) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for statement in statements {
                    self.resolve_stmt(statement);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);

                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }

                self.define(name);
            }

            Stmt::Function { name, params, body } => {
                // Declared and defined before the body resolves, so the
                // function can call itself.
                self.declare(name);
                self.define(name);

                self.resolve_function(params, body, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword.line, "Can't return from top-level code.");
                }

                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword.line, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(value);
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

                self.declare(name);
                self.define(name);

                if let Some(superclass) = superclass {
                    if let Expr::Variable(superclass_name) = superclass {
                        if superclass_name.lexeme == name.lexeme {
                            self.error(
                                superclass_name.line,
                                "A class can't inherit from itself.",
                            );
                        }
                    }

                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass);

                    // Methods of a subclass see `super` one scope out from
                    // `this`.
                    self.begin_scope();
                    self.scope_insert("super");
                }

                self.begin_scope();
                self.scope_insert("this");

                for method in methods {
                    if let Stmt::Function { name, params, body } = method {
                        let declaration = if name.lexeme == "init" {
                            FunctionType::Initializer
                        } else {
                            FunctionType::Method
                        };

                        self.resolve_function(params, body, declaration);
                    }
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }
        }
    }

    // ───────────────────────── expressions ────────────────────────

    fn resolve_expr(&mut self, expr: &'a Expr<'a>) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable(name) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme) == Some(&false) {
                        self.error(
                            name.line,
                            "Can't read local variable in its own initializer.",
                        );
                    }
                }

                self.resolve_local(expr, name);
            }

            Expr::Assign { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(expr, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            // Property names are looked up dynamically; only the object
            // expression resolves statically.
            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This(keyword) => {
                if self.current_class == ClassType::None {
                    self.error(keyword.line, "Can't use 'this' outside of a class.");

                    return;
                }

                self.resolve_local(expr, keyword);
            }

            Expr::Super { keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword.line, "Can't use 'super' outside of a class.");
                    }
                    ClassType::Class => {
                        self.error(
                            keyword.line,
                            "Can't use 'super' in a class with no superclass.",
                        );
                    }
                    ClassType::Subclass => {}
                }

                self.resolve_local(expr, keyword);
            }
        }
    }

    // ─────────────────────────── helpers ──────────────────────────

    fn resolve_function(
        &mut self,
        params: &'a [&'a Token<'a>],
        body: &'a [Stmt<'a>],
        declaration: FunctionType,
    ) {
        let enclosing_function = mem::replace(&mut self.current_function, declaration);

        self.begin_scope();

        for param in params {
            self.declare(param);
            self.define(param);
        }

        for statement in body {
            self.resolve_stmt(statement);
        }

        self.end_scope();

        self.current_function = enclosing_function;
    }

    /// Find the innermost scope containing `name` and record its distance
    /// for this expression.  No hit means the name is global (or undefined,
    /// which only surfaces at run time).
    fn resolve_local(&mut self, expr: &'a Expr<'a>, name: &Token<'a>) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme) {
                debug!("Resolved '{}' at distance {}", name.lexeme, distance);

                self.interpreter.note_local(expr, distance);

                return;
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Mark `name` as declared-but-unusable in the innermost scope.  No-op
    /// at global scope.
    fn declare(&mut self, name: &'a Token<'a>) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(name.lexeme) {
            self.errors.push(RoxError::resolve(
                name.line,
                "Already a variable with this name in this scope.",
            ));
        }

        scope.insert(name.lexeme, false);
    }

    /// Mark `name` as fully usable.
    fn define(&mut self, name: &'a Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, true);
        }
    }

    /// Directly install an implicit binding (`this`, `super`) in the
    /// innermost scope.
    fn scope_insert(&mut self, name: &'a str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, true);
        }
    }

    fn error<S: Into<String>>(&mut self, line: usize, message: S) {
        self.errors.push(RoxError::resolve(line, message));
    }
}
