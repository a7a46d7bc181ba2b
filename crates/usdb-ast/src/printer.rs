//! Algo text for expressions and statement headers
//!
//! Produces single-line Algo spellings, used for flowchart labels and
//! diagnostics. Parenthesized expressions keep their parentheses, so no
//! precedence-driven bracketing is needed.

use crate::{Accessor, Expression, ExpressionKind, LValue, Statement, StatementKind, UnaryOperator};

/// Trait for converting AST nodes to Algo text
pub trait ToAlgo {
    fn to_algo(&self) -> String;
}

fn escape_string(s: &str) -> String {
    let mut result = String::new();
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            _ => result.push(c),
        }
    }
    result
}

fn escape_char(c: char) -> String {
    match c {
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        _ => c.to_string(),
    }
}

fn real(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn list(items: &[Expression]) -> String {
    items.iter().map(ToAlgo::to_algo).collect::<Vec<_>>().join(", ")
}

// ===== Expressions =====

impl ToAlgo for Expression {
    fn to_algo(&self) -> String {
        match &self.kind {
            ExpressionKind::Integer(v) => v.to_string(),
            ExpressionKind::Real(v) => real(*v),
            ExpressionKind::Boolean(true) => "TRUE".to_string(),
            ExpressionKind::Boolean(false) => "FALSE".to_string(),
            ExpressionKind::Char(c) => format!("'{}'", escape_char(*c)),
            ExpressionKind::String(s) => format!("\"{}\"", escape_string(s)),
            ExpressionKind::Identifier(name) => name.clone(),
            ExpressionKind::Binary { operator, left, right } => {
                format!("{} {} {}", left.to_algo(), operator.symbol(), right.to_algo())
            }
            ExpressionKind::Unary { operator: UnaryOperator::Neg, operand } => {
                format!("-{}", operand.to_algo())
            }
            ExpressionKind::Unary { operator: UnaryOperator::Not, operand } => {
                format!("NOT {}", operand.to_algo())
            }
            ExpressionKind::ArrayAccess { array, indices } => {
                format!("{}[{}]", array.to_algo(), list(indices))
            }
            ExpressionKind::FieldAccess { object, field } => {
                format!("{}.{}", object.to_algo(), field)
            }
            ExpressionKind::FunctionCall { name, arguments } => {
                format!("{}({})", name, list(arguments))
            }
            ExpressionKind::Paren(inner) => format!("({})", inner.to_algo()),
        }
    }
}

impl ToAlgo for LValue {
    fn to_algo(&self) -> String {
        let mut text = self.name.clone();
        for accessor in &self.accessors {
            match accessor {
                Accessor::Index(indices) => {
                    text.push('[');
                    text.push_str(&list(indices));
                    text.push(']');
                }
                Accessor::Field(field) => {
                    text.push('.');
                    text.push_str(field);
                }
            }
        }
        text
    }
}

// ===== Statements =====

/// Simple statements print in full; compound ones print their header line
impl ToAlgo for Statement {
    fn to_algo(&self) -> String {
        match &self.kind {
            StatementKind::Assignment { target, value } => {
                format!("{} <- {}", target.to_algo(), value.to_algo())
            }
            StatementKind::If { condition, .. } => format!("IF {} THEN", condition.to_algo()),
            StatementKind::While { condition, .. } => format!("WHILE {} DO", condition.to_algo()),
            StatementKind::DoWhile { condition, .. } => format!("DO ... WHILE {}", condition.to_algo()),
            StatementKind::For { variable, start, end, step, .. } => {
                let mut text = format!("FOR {} <- {} TO {}", variable, start.to_algo(), end.to_algo());
                if let Some(step) = step {
                    text.push_str(" STEP ");
                    text.push_str(&step.to_algo());
                }
                text.push_str(" DO");
                text
            }
            StatementKind::Switch { expression, .. } => format!("SWITCH {} OF", expression.to_algo()),
            StatementKind::Call { name, arguments } if arguments.is_empty() => name.clone(),
            StatementKind::Call { name, arguments } => format!("{}({})", name, list(arguments)),
            StatementKind::Scan { targets } => {
                let targets: Vec<String> = targets.iter().map(ToAlgo::to_algo).collect();
                format!("SCAN({})", targets.join(", "))
            }
            StatementKind::Print { expressions } => format!("PRINT({})", list(expressions)),
            StatementKind::Return { value: Some(value) } => format!("RETURN {}", value.to_algo()),
            StatementKind::Return { value: None } => "RETURN".to_string(),
            StatementKind::Block { .. } => "BEGIN ... END".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOperator, Span};

    fn expr(kind: ExpressionKind) -> Expression {
        Expression::new(kind, Span::dummy())
    }

    fn ident(name: &str) -> Expression {
        expr(ExpressionKind::Identifier(name.to_string()))
    }

    #[test]
    fn test_binary_uses_algo_operators() {
        let e = expr(ExpressionKind::Binary {
            operator: BinaryOperator::NotEq,
            left: Box::new(expr(ExpressionKind::Binary {
                operator: BinaryOperator::Mod,
                left: Box::new(ident("n")),
                right: Box::new(expr(ExpressionKind::Integer(2))),
            })),
            right: Box::new(expr(ExpressionKind::Integer(0))),
        });
        assert_eq!(e.to_algo(), "n MOD 2 <> 0");
    }

    #[test]
    fn test_parens_and_literals_are_kept() {
        let e = expr(ExpressionKind::Paren(Box::new(expr(ExpressionKind::Unary {
            operator: UnaryOperator::Not,
            operand: Box::new(expr(ExpressionKind::Boolean(true))),
        }))));
        assert_eq!(e.to_algo(), "(NOT TRUE)");
        assert_eq!(expr(ExpressionKind::Real(2.0)).to_algo(), "2.0");
        assert_eq!(expr(ExpressionKind::String("a\"b".into())).to_algo(), "\"a\\\"b\"");
        assert_eq!(expr(ExpressionKind::Char('x')).to_algo(), "'x'");
    }

    #[test]
    fn test_lvalue_accessors() {
        let target = LValue {
            name: "grid".to_string(),
            accessors: vec![
                Accessor::Index(vec![ident("i"), ident("j")]),
                Accessor::Field("score".to_string()),
            ],
            span: Span::dummy(),
        };
        assert_eq!(target.to_algo(), "grid[i, j].score");
    }

    #[test]
    fn test_statement_headers() {
        let stmt = Statement::new(
            StatementKind::For {
                variable: "i".to_string(),
                start: expr(ExpressionKind::Integer(10)),
                end: expr(ExpressionKind::Integer(1)),
                step: Some(expr(ExpressionKind::Unary {
                    operator: UnaryOperator::Neg,
                    operand: Box::new(expr(ExpressionKind::Integer(1))),
                })),
                body: Box::new(Statement::new(StatementKind::Block { statements: vec![] }, Span::dummy())),
            },
            Span::dummy(),
        );
        assert_eq!(stmt.to_algo(), "FOR i <- 10 TO 1 STEP -1 DO");

        let call = Statement::new(StatementKind::Call { name: "Show".into(), arguments: vec![] }, Span::dummy());
        assert_eq!(call.to_algo(), "Show");
    }
}
