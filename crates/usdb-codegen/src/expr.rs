//! Expression emission

use usdb_ast::*;

use crate::GenContext;

/// C operator for an Algo binary operator; `^` never gets here
fn c_operator(operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::Add => "+",
        BinaryOperator::Sub => "-",
        BinaryOperator::Mul => "*",
        BinaryOperator::Div | BinaryOperator::IntDiv => "/",
        BinaryOperator::Mod => "%",
        BinaryOperator::Pow => "^",
        BinaryOperator::Eq => "==",
        BinaryOperator::NotEq => "!=",
        BinaryOperator::Lt => "<",
        BinaryOperator::Le => "<=",
        BinaryOperator::Gt => ">",
        BinaryOperator::Ge => ">=",
        BinaryOperator::And => "&&",
        BinaryOperator::Or => "||",
    }
}

/// C library name of an Algo built-in
fn builtin_c_name(name: &str) -> Option<&'static str> {
    let c_name = match name.to_lowercase().as_str() {
        "sqrt" => "sqrt",
        "abs" => "fabs",
        "sin" => "sin",
        "cos" => "cos",
        "tan" => "tan",
        "ln" => "log",
        "log" => "log10",
        "exp" => "exp",
        "floor" => "floor",
        "ceil" => "ceil",
        "round" => "round",
        "length" => "strlen",
        _ => return None,
    };
    Some(c_name)
}

pub fn generate_expression(ctx: &GenContext<'_>, expr: &Expression) -> String {
    match &expr.kind {
        ExpressionKind::Integer(n) => n.to_string(),
        ExpressionKind::Real(r) => real_literal(*r),
        ExpressionKind::Boolean(b) => b.to_string(),
        ExpressionKind::Char(c) => char_literal(*c),
        ExpressionKind::String(s) => string_literal(s),
        ExpressionKind::Identifier(name) => {
            if ctx.is_ref_param(name) {
                format!("(*{})", ctx.c_name(name))
            } else if ctx.routine(name).is_some_and(|r| r.is_function) {
                // A parameterless function named without parentheses
                format!("{}()", ctx.c_name(name))
            } else {
                ctx.c_name(name)
            }
        }
        ExpressionKind::Binary {
            operator,
            left,
            right,
        } => generate_binary(ctx, *operator, left, right),
        ExpressionKind::Unary { operator, operand } => {
            let inner = generate_expression(ctx, operand);
            let inner = if is_atomic(operand) {
                inner
            } else {
                format!("({})", inner)
            };
            match operator {
                UnaryOperator::Neg => format!("-{}", inner),
                UnaryOperator::Not => format!("!{}", inner),
            }
        }
        ExpressionKind::ArrayAccess { array, indices } => {
            let mut out = generate_expression(ctx, array);
            for index in indices {
                out.push_str(&format!("[{}]", generate_expression(ctx, index)));
            }
            out
        }
        ExpressionKind::FieldAccess { object, field } => {
            format!("{}.{}", generate_expression(ctx, object), ctx.c_name(field))
        }
        ExpressionKind::FunctionCall { name, arguments } => {
            generate_call(ctx, name, arguments)
        }
        ExpressionKind::Paren(inner) => format!("({})", generate_expression(ctx, inner)),
    }
}

pub(crate) fn generate_call(ctx: &GenContext<'_>, name: &str, arguments: &[Expression]) -> String {
    let callee = match ctx.routine(name) {
        Some(_) => ctx.c_name(name),
        None => builtin_c_name(name)
            .map(str::to_string)
            .unwrap_or_else(|| ctx.c_name(name)),
    };
    let args: Vec<String> = arguments
        .iter()
        .map(|arg| generate_expression(ctx, arg))
        .collect();
    format!("{}({})", callee, args.join(", "))
}

pub(crate) fn generate_lvalue(ctx: &GenContext<'_>, target: &LValue) -> String {
    let mut out = if ctx.is_ref_param(&target.name) {
        format!("(*{})", ctx.c_name(&target.name))
    } else {
        ctx.c_name(&target.name)
    };
    for accessor in &target.accessors {
        match accessor {
            Accessor::Index(indices) => {
                for index in indices {
                    out.push_str(&format!("[{}]", generate_expression(ctx, index)));
                }
            }
            Accessor::Field(field) => {
                out.push('.');
                out.push_str(&ctx.c_name(field));
            }
        }
    }
    out
}

fn generate_binary(
    ctx: &GenContext<'_>,
    operator: BinaryOperator,
    left: &Expression,
    right: &Expression,
) -> String {
    if operator == BinaryOperator::Pow {
        return format!(
            "pow({}, {})",
            generate_expression(ctx, left),
            generate_expression(ctx, right)
        );
    }

    if operator.is_relational() && (is_string_operand(ctx, left) || is_string_operand(ctx, right)) {
        return format!(
            "strcmp({}, {}) {} 0",
            generate_expression(ctx, left),
            generate_expression(ctx, right),
            c_operator(operator)
        );
    }

    let l = operand(ctx, operator, left, false);
    let r = operand(ctx, operator, right, true);
    format!("{} {} {}", l, c_operator(operator), r)
}

/// Operand text, parenthesized where C would group it differently
fn operand(ctx: &GenContext<'_>, parent: BinaryOperator, child: &Expression, is_right: bool) -> String {
    let text = generate_expression(ctx, child);
    let child_op = match &child.kind {
        ExpressionKind::Binary { operator, .. } if *operator != BinaryOperator::Pow => *operator,
        _ => return text,
    };

    // C splits Algo's single relational level into equality and comparison
    let needs_parens = child_op.precedence() < parent.precedence()
        || (child_op.precedence() == parent.precedence() && is_right)
        || (child_op.is_relational() && parent.is_relational());

    if needs_parens {
        format!("({})", text)
    } else {
        text
    }
}

fn is_atomic(expr: &Expression) -> bool {
    !matches!(
        expr.kind,
        ExpressionKind::Binary { .. } | ExpressionKind::Unary { .. }
    ) || matches!(
        expr.kind,
        ExpressionKind::Binary {
            operator: BinaryOperator::Pow,
            ..
        }
    )
}

fn is_string_operand(ctx: &GenContext<'_>, expr: &Expression) -> bool {
    match &expr.kind {
        ExpressionKind::String(_) => true,
        ExpressionKind::Identifier(name) => ctx.lookup_type(name) == Some(PrimitiveType::String),
        _ => false,
    }
}

fn real_literal(r: f64) -> String {
    // Debug keeps a fractional part: 2.0 rather than 2
    format!("{:?}", r)
}

fn escape_char(c: char, quote: char) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        '\\' => "\\\\".to_string(),
        '\0' => "\\0".to_string(),
        c if c == quote => format!("\\{}", c),
        c => c.to_string(),
    }
}

pub(crate) fn char_literal(c: char) -> String {
    format!("'{}'", escape_char(c, '\''))
}

pub(crate) fn string_literal(s: &str) -> String {
    let body: String = s.chars().map(|c| escape_char(c, '"')).collect();
    format!("\"{}\"", body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodegenOptions;

    fn generated(source_expr: &str) -> String {
        let source = format!(
            "ALGORITHM T\nVAR a, b, c : INTEGER; s : STRING; r : REAL\nBEGIN\na <- {}\nEND.",
            source_expr
        );
        let program = usdb_parser::parse(&source).ast.expect("program");
        let options = CodegenOptions::default();
        let mut ctx = GenContext::new(&program, &options);
        ctx.register_variables(&program.variables, false);
        match &program.body[0].kind {
            StatementKind::Assignment { value, .. } => generate_expression(&ctx, value),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_operator_mapping() {
        assert_eq!(generated("a = b"), "a == b");
        assert_eq!(generated("a <> b"), "a != b");
        assert_eq!(generated("a > 0 AND NOT (b < 0)"), "a > 0 && !(b < 0)");
        assert_eq!(generated("a DIV b MOD c"), "a / b % c");
        assert_eq!(generated("a > 0 OR b > 0"), "a > 0 || b > 0");
    }

    #[test]
    fn test_power_lowers_to_pow() {
        assert_eq!(generated("a ^ 2 + 1"), "pow(a, 2) + 1");
        assert_eq!(generated("2 ^ 3 ^ 2"), "pow(2, pow(3, 2))");
    }

    #[test]
    fn test_precedence_parentheses() {
        assert_eq!(generated("a - (b - c)"), "a - (b - c)");
        assert_eq!(generated("(a + b) * c"), "(a + b) * c");
        assert_eq!(generated("-(a + b)"), "-(a + b)");
    }

    #[test]
    fn test_chained_relational_is_grouped() {
        // Algo reads a = b < c as (a = b) < c; C would bind < first
        assert_eq!(generated("a = b < c"), "(a == b) < c");
    }

    #[test]
    fn test_builtins_map_to_libm() {
        assert_eq!(generated("abs(r) + ln(r)"), "fabs(r) + log(r)");
        assert_eq!(generated("length(s)"), "strlen(s)");
    }

    #[test]
    fn test_string_comparison_uses_strcmp() {
        assert_eq!(generated("s = \"yes\""), "strcmp(s, \"yes\") == 0");
    }

    #[test]
    fn test_literals() {
        assert_eq!(real_literal(2.0), "2.0");
        assert_eq!(char_literal('\''), "'\\''");
        assert_eq!(string_literal("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
    }
}
