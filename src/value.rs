/*!
Runtime values.

Numbers, strings and booleans compare by value; functions, classes and
instances compare by identity (`Rc::ptr_eq`), so two structurally identical
instances are still distinct objects.
*/

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::class::{RoxClass, RoxInstance};
use crate::function::RoxFunction;

/// A built-in function implemented in Rust, callable from Lox code.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: for<'a> fn(&[Value<'a>]) -> std::result::Result<Value<'a>, String>,
}

/// Every value a Rox program can produce or store.
#[derive(Clone)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction(NativeFunction),
    Function(Rc<RoxFunction<'a>>),
    Class(Rc<RoxClass<'a>>),
    Instance(Rc<RefCell<RoxInstance<'a>>>),
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // NaN equals NaN: this is observational equality, not IEEE
            // comparison.
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            // Natives are a fixed, uniquely named set.
            (Value::NativeFunction(a), Value::NativeFunction(b)) => a.name == b.name,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{b}"),

            // Integral numbers print without a trailing ".0".
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{n:.0}")
                } else {
                    write!(f, "{n}")
                }
            }

            Value::String(s) => write!(f, "{s}"),

            Value::NativeFunction(native) => write!(f, "<native fn {}>", native.name),

            Value::Function(function) => write!(f, "{function}"),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class.name),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::NativeFunction(native) => write!(f, "NativeFunction({})", native.name),
            Value::Function(function) => write!(f, "Function({})", function.name()),
            Value::Class(class) => write!(f, "Class({})", class.name),
            Value::Instance(instance) => write!(f, "Instance({})", instance.borrow().class.name),
        }
    }
}
