//! Syntax tree for the Rox language: two sum types, one per node family
//! (expressions and statements), plus the literal payload enum.
//!
//! Nodes are immutable once built and borrow their tokens from the scanner's
//! token buffer (`&'a Token<'a>`), so the tree is a pure index over the
//! source.  Consumers (resolver, interpreter, printer) each do exhaustive
//! `match`es over both families; adding a variant breaks every consumer at
//! compile time, which is the point.
//!
//! An expression node's *address* doubles as its identity: the resolver's
//! side table is keyed by it, so two syntactically identical expressions at
//! different source positions are distinct entries.  This holds because the
//! driver keeps a parsed program alive and unmoved for as long as the
//! interpreter may consult the table.

use serde::Serialize;

use crate::token::Token;

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the terminal leaves of the expression tree and do not
/// retain a reference to the originating [`Token`]; the parser copies (or
/// converts) the value at parse time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE-754 `f64`.  Integral lexemes such as
    /// `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// **Expression node.**  Lifetime `'a` ties nodes that contain token
/// references back to the borrowed token slice held by the parser's caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr<'a> {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression, `!isReady` or `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: &'a Token<'a>,

        /// Operand to which the operator is applied.
        right: Box<Expr<'a>>,
    },

    /// Infix binary operator expression, `a + b` or `x <= y`.
    Binary {
        left: Box<Expr<'a>>,

        /// Operator token such as `+`, `*`, `==`, ...
        operator: &'a Token<'a>,

        right: Box<Expr<'a>>,
    },

    /// Parenthesised sub-expression: `"(" expression ")"`.
    Grouping(Box<Expr<'a>>),

    /// Variable access; resolves to the identifier's current value.
    Variable(&'a Token<'a>),

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// Short-circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>, // AND or OR
        right: Box<Expr<'a>>,
    },

    /// Function, method, or class-constructor call, `add(1, 2)`.
    Call {
        /// Expression that evaluates to a callable (variable, property, ...).
        callee: Box<Expr<'a>>,

        /// The closing `)` token, retained for error reporting.
        paren: &'a Token<'a>,

        /// Argument list (may be empty).
        arguments: Vec<Expr<'a>>,
    },

    /// Property read: `object.property`.
    Get {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
    },

    /// Property write: `object.property = value`.
    Set {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// The `this` keyword inside a method body.
    This(&'a Token<'a>),

    /// Superclass method access inside a subclass method: `super.method`.
    Super {
        /// The `super` keyword token.
        keyword: &'a Token<'a>,

        /// The method name after the dot.
        method: &'a Token<'a>,
    },
}

/// **Statement node.**  A program is the sequence of these produced by the
/// parser.
///
/// There is intentionally no `For` variant: the parser desugars `for` loops
/// into `Block`/`While`, so downstream passes only ever see this closed set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt<'a> {
    /// Stand-alone expression terminated by a semicolon.
    Expression(Expr<'a>),

    /// `print` statement.
    Print(Expr<'a>),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: &'a Token<'a>,
        initializer: Option<Expr<'a>>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt<'a>>),

    /// `if` / `else` conditional.
    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    /// `while` loop.
    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
    },

    /// Function declaration; becomes a first-class callable value.  Also
    /// used for the methods inside a [`Stmt::Class`].
    Function {
        name: &'a Token<'a>,

        /// Parameter name tokens (arity <= 255).
        params: Vec<&'a Token<'a>>,

        /// Body executed when the function is called.
        body: Vec<Stmt<'a>>,
    },

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: &'a Token<'a>,

        /// Optional expression to return; absent means `nil`.
        value: Option<Expr<'a>>,
    },

    /// Class declaration with optional superclass and method list.
    Class {
        name: &'a Token<'a>,

        /// `< Superclass` clause, parsed as a [`Expr::Variable`] so the
        /// resolver and interpreter treat it like any other name reference.
        superclass: Option<Expr<'a>>,

        /// Method declarations; each element is a [`Stmt::Function`].
        methods: Vec<Stmt<'a>>,
    },
}
