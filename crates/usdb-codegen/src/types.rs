//! C declarators for Algo types

use usdb_ast::{ExpressionKind, Literal, PrimitiveType, TypeExpression};

use crate::expr::generate_expression;
use crate::GenContext;

pub(crate) fn literal_primitive(literal: &Literal) -> Option<PrimitiveType> {
    Some(match literal {
        Literal::Integer(_) => PrimitiveType::Integer,
        Literal::Real(_) => PrimitiveType::Real,
        Literal::Boolean(_) => PrimitiveType::Boolean,
        Literal::Char(_) => PrimitiveType::Char,
        Literal::String(_) => PrimitiveType::String,
    })
}

pub(crate) fn primitive_c_type(p: PrimitiveType) -> &'static str {
    match p {
        PrimitiveType::Integer => "int",
        PrimitiveType::Real => "double",
        PrimitiveType::Boolean => "bool",
        PrimitiveType::Char => "char",
        PrimitiveType::String => "char",
    }
}

/// `int x`, `char name[256]`, `double m[4][5]`, `Point p`.
///
/// Array bounds get one extra slot so Algo's 1-based indices stay in range.
pub(crate) fn declarator(ctx: &GenContext<'_>, ty: &TypeExpression, name: &str) -> String {
    match ty {
        TypeExpression::Primitive(PrimitiveType::String) => {
            format!("char {}[{}]", name, ctx.options.string_length)
        }
        TypeExpression::Primitive(p) => format!("{} {}", primitive_c_type(*p), name),
        TypeExpression::Array {
            dimensions,
            element_type,
        } => {
            let mut inner = name.to_string();
            for dimension in dimensions {
                inner.push_str(&format!("[{}]", array_bound(ctx, dimension)));
            }
            declarator(ctx, element_type, &inner)
        }
        TypeExpression::Structure { fields } => {
            let mut body = String::new();
            for field in fields {
                for field_name in &field.names {
                    body.push_str(&declarator(ctx, &field.var_type, &ctx.c_name(field_name)));
                    body.push_str("; ");
                }
            }
            format!("struct {{ {}}} {}", body, name)
        }
        TypeExpression::Enumeration { values } => {
            let values: Vec<String> = values.iter().map(|v| ctx.c_name(v)).collect();
            format!("enum {{ {} }} {}", values.join(", "), name)
        }
        TypeExpression::Reference { name: type_name } => {
            format!("{} {}", ctx.c_name(type_name), name)
        }
    }
}

fn array_bound(ctx: &GenContext<'_>, dimension: &usdb_ast::Expression) -> String {
    match dimension.kind {
        ExpressionKind::Integer(n) => match n.checked_add(1) {
            Some(bound) => bound.to_string(),
            None => format!("{} + 1", n),
        },
        _ => format!("{} + 1", generate_expression(ctx, dimension)),
    }
}

/// Parameter declarator; strings decay to `char *`, `VAR` scalars become pointers
pub(crate) fn parameter(ctx: &GenContext<'_>, param: &usdb_ast::Parameter) -> String {
    let name = ctx.c_name(&param.name);
    if ctx.primitive_of(&param.param_type) == Some(PrimitiveType::String) {
        return format!("char *{}", name);
    }
    if param.by_reference && !ctx.is_pointer_like(&param.param_type) {
        return declarator(ctx, &param.param_type, &format!("*{}", name));
    }
    declarator(ctx, &param.param_type, &name)
}

/// Return type of a function; strings come back as `char *`
pub(crate) fn return_type(ctx: &GenContext<'_>, ty: &TypeExpression) -> String {
    match ctx.primitive_of(ty) {
        Some(PrimitiveType::String) => "char *".to_string(),
        Some(p) => format!("{} ", primitive_c_type(p)),
        None => match ty {
            TypeExpression::Reference { name } => format!("{} ", ctx.c_name(name)),
            other => declarator(ctx, other, ""),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodegenOptions;

    fn with_context(source: &str, f: impl FnOnce(&GenContext<'_>, &usdb_ast::Program)) {
        let program = usdb_parser::parse(source).ast.expect("program");
        let options = CodegenOptions::default();
        let mut ctx = GenContext::new(&program, &options);
        ctx.register_variables(&program.variables, false);
        f(&ctx, &program);
    }

    #[test]
    fn test_primitive_declarators() {
        with_context("ALGORITHM T\nVAR a : INTEGER; b : REAL; c : BOOLEAN; d : CHAR; e : STRING\nBEGIN\nEND.", |ctx, program| {
            let decls: Vec<String> = program
                .variables
                .iter()
                .map(|v| declarator(ctx, &v.var_type, &v.names[0]))
                .collect();
            assert_eq!(
                decls,
                vec!["int a", "double b", "bool c", "char d", "char e[256]"]
            );
        });
    }

    #[test]
    fn test_array_declarator() {
        with_context("ALGORITHM T\nCONST N = 3\nVAR m : ARRAY[N, 4] OF REAL; names : ARRAY[5] OF STRING\nBEGIN\nEND.", |ctx, program| {
            assert_eq!(
                declarator(ctx, &program.variables[0].var_type, "m"),
                "double m[N + 1][5]"
            );
            assert_eq!(
                declarator(ctx, &program.variables[1].var_type, "names"),
                "char names[6][256]"
            );
        });
    }

    #[test]
    fn test_parameter_declarators() {
        with_context(
            "ALGORITHM T\nPROCEDURE p(VAR n : INTEGER; s : STRING; VAR a : ARRAY[3] OF INTEGER)\nBEGIN\nEND\nBEGIN\nEND.",
            |ctx, program| {
                let params: Vec<String> = program.procedures[0]
                    .parameters
                    .iter()
                    .map(|p| parameter(ctx, p))
                    .collect();
                assert_eq!(params, vec!["int *n", "char *s", "int a[4]"]);
            },
        );
    }
}
