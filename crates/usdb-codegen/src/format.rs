//! printf / scanf conversion inference
//!
//! Inspection is shallow: only literals, plain identifiers, binary operators
//! and the math built-ins are looked at. Anything else prints with `%d`.

use usdb_ast::{Expression, ExpressionKind, LValue, PrimitiveType};

use crate::GenContext;

/// Built-ins whose result is printed as a real
pub(crate) const MATH_BUILTINS: &[&str] = &[
    "sqrt", "abs", "sin", "cos", "tan", "ln", "log", "exp", "floor", "ceil", "round",
];

pub(crate) fn is_math_builtin(name: &str) -> bool {
    MATH_BUILTINS.iter().any(|b| b.eq_ignore_ascii_case(name))
}

pub(crate) fn print_format(ctx: &GenContext<'_>, expr: &Expression) -> &'static str {
    match &expr.kind {
        ExpressionKind::Integer(_) | ExpressionKind::Boolean(_) => "%d",
        ExpressionKind::Real(_) => "%f",
        ExpressionKind::Char(_) => "%c",
        ExpressionKind::String(_) => "%s",
        ExpressionKind::Identifier(name) => match ctx.lookup_type(name) {
            Some(PrimitiveType::Real) => "%f",
            Some(PrimitiveType::Char) => "%c",
            Some(PrimitiveType::String) => "%s",
            _ => "%d",
        },
        ExpressionKind::Binary { left, right, .. } => {
            if print_format(ctx, left) == "%f" || print_format(ctx, right) == "%f" {
                "%f"
            } else {
                "%d"
            }
        }
        ExpressionKind::FunctionCall { name, .. }
            if ctx.routine(name).is_none() && is_math_builtin(name) =>
        {
            "%f"
        }
        _ => "%d",
    }
}

pub(crate) fn scan_format(ctx: &GenContext<'_>, target: &LValue) -> &'static str {
    match ctx.lookup_type(&target.name) {
        Some(PrimitiveType::Real) => "%lf",
        Some(PrimitiveType::Char) => " %c",
        Some(PrimitiveType::String) => "%s",
        _ => "%d",
    }
}
