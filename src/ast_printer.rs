/*!
Lisp-style prefix printer for expression trees.

Used by the `parse` driver stage and by parser tests to assert tree shape
without pattern-matching the whole AST.  Statements are not printed here;
structured dumps of full programs go through serde instead.
*/

use crate::ast::{Expr, LiteralValue};

/// Renders an [`Expr`] as a parenthesized prefix string, e.g.
/// `(* (- 123.0) (group 45.67))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&self, expr: &Expr<'_>) -> String {
        match expr {
            Expr::Literal(value) => self.literal(value),

            Expr::Unary { operator, right } => self.parenthesize(operator.lexeme, &[right]),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.parenthesize(operator.lexeme, &[left, right]),

            Expr::Grouping(inner) => self.parenthesize("group", &[inner]),

            Expr::Variable(name) => name.lexeme.to_string(),

            Expr::Assign { name, value } => {
                format!("(= {} {})", name.lexeme, self.print(value))
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => self.parenthesize(operator.lexeme, &[left, right]),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = String::from("(call ");
                out.push_str(&self.print(callee));

                for arg in arguments {
                    out.push(' ');
                    out.push_str(&self.print(arg));
                }

                out.push(')');
                out
            }

            Expr::Get { object, name } => {
                format!("(. {} {})", self.print(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                format!(
                    "(set {} {} {})",
                    self.print(object),
                    name.lexeme,
                    self.print(value)
                )
            }

            Expr::This(_) => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    fn literal(&self, value: &LiteralValue) -> String {
        match value {
            // Numbers always carry a decimal point so `1` and `"1"` cannot
            // print alike.
            LiteralValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{n:.1}")
                } else {
                    format!("{n}")
                }
            }

            LiteralValue::Str(s) => s.clone(),
            LiteralValue::True => "true".to_string(),
            LiteralValue::False => "false".to_string(),
            LiteralValue::Nil => "nil".to_string(),
        }
    }

    fn parenthesize(&self, name: &str, exprs: &[&Expr<'_>]) -> String {
        let mut out = String::with_capacity(name.len() + 2 + exprs.len() * 8);

        out.push('(');
        out.push_str(name);

        for expr in exprs {
            out.push(' ');
            out.push_str(&self.print(expr));
        }

        out.push(')');
        out
    }
}
