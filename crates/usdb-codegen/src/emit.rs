//! Program, declaration and statement emission

use usdb_ast::*;

use crate::expr::{char_literal, generate_call, generate_expression, generate_lvalue, string_literal};
use crate::format::{print_format, scan_format};
use crate::types::{declarator, parameter, primitive_c_type, return_type};
use crate::GenContext;

const INCLUDES: &[&str] = &["stdio.h", "stdlib.h", "string.h", "math.h", "stdbool.h"];

pub(crate) fn emit_program(ctx: &mut GenContext<'_>, program: &Program) {
    if ctx.options.emit_header {
        ctx.writeln(&format!(
            "/* {} - generated from USDB Algo, do not edit */",
            program.name
        ));
        ctx.writeln("");
    }
    for include in INCLUDES {
        ctx.writeln(&format!("#include <{}>", include));
    }
    ctx.writeln("");

    if !program.types.is_empty() {
        for decl in &program.types {
            emit_typedef(ctx, decl);
        }
        ctx.writeln("");
    }

    if !program.constants.is_empty() {
        for constant in &program.constants {
            let line = format!(
                "#define {} {}",
                ctx.c_name(&constant.name),
                define_value(&constant.value)
            );
            ctx.writeln(&line);
        }
        ctx.writeln("");
    }

    ctx.register_variables(&program.variables, false);
    if !program.variables.is_empty() {
        emit_variables(ctx, &program.variables);
        ctx.writeln("");
    }

    let routines: Vec<Routine<'_>> = program.routines().collect();
    if !routines.is_empty() {
        for routine in &routines {
            let line = format!("{};", signature(ctx, *routine));
            ctx.writeln(&line);
        }
        ctx.writeln("");
        for routine in &routines {
            emit_routine(ctx, *routine);
            ctx.writeln("");
        }
    }

    ctx.set_in_main(true);
    ctx.writeln("int main(void) {");
    ctx.indent();
    emit_block(ctx, &program.body);
    ctx.writeln("return 0;");
    ctx.dedent();
    ctx.writeln("}");
    ctx.set_in_main(false);
}

// === Declarations ===

fn emit_typedef(ctx: &mut GenContext<'_>, decl: &TypeDeclaration) {
    let name = ctx.c_name(&decl.name);
    match &decl.definition {
        TypeExpression::Structure { fields } => {
            ctx.writeln("typedef struct {");
            ctx.indent();
            for field in fields {
                for field_name in &field.names {
                    let line = format!(
                        "{};",
                        declarator(ctx, &field.var_type, &ctx.c_name(field_name))
                    );
                    ctx.writeln(&line);
                }
            }
            ctx.dedent();
            ctx.writeln(&format!("}} {};", name));
        }
        TypeExpression::Enumeration { values } => {
            let values: Vec<String> = values.iter().map(|v| ctx.c_name(v)).collect();
            ctx.writeln(&format!("typedef enum {{ {} }} {};", values.join(", "), name));
        }
        other => {
            let line = format!("typedef {};", declarator(ctx, other, &name));
            ctx.writeln(&line);
        }
    }
}

fn define_value(value: &Literal) -> String {
    match value {
        Literal::Integer(n) if *n < 0 => format!("({})", n),
        Literal::Integer(n) => n.to_string(),
        Literal::Real(r) if *r < 0.0 => format!("({:?})", r),
        Literal::Real(r) => format!("{:?}", r),
        Literal::Boolean(b) => b.to_string(),
        Literal::Char(c) => char_literal(*c),
        Literal::String(s) => string_literal(s),
    }
}

fn emit_variables(ctx: &mut GenContext<'_>, variables: &[VarDeclaration]) {
    for decl in variables {
        for name in &decl.names {
            let line = format!("{};", declarator(ctx, &decl.var_type, &ctx.c_name(name)));
            ctx.writeln(&line);
        }
    }
}

fn emit_local_constants(ctx: &mut GenContext<'_>, constants: &[ConstDeclaration]) {
    for constant in constants {
        let name = ctx.c_name(&constant.name);
        let line = match &constant.value {
            Literal::String(s) => format!("const char *{} = {};", name, string_literal(s)),
            value => {
                let c_type = crate::types::literal_primitive(value)
                    .map(primitive_c_type)
                    .unwrap_or("int");
                format!("const {} {} = {};", c_type, name, define_value(value))
            }
        };
        ctx.writeln(&line);
    }
}

// === Routines ===

fn signature(ctx: &mut GenContext<'_>, routine: Routine<'_>) -> String {
    // Parameter types are spelled in the routine's own scope
    ctx.enter_routine(routine);
    let params: Vec<String> = routine
        .parameters()
        .iter()
        .map(|p| parameter(ctx, p))
        .collect();
    let params = if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    };
    let head = match routine.return_type() {
        Some(ty) => return_type(ctx, ty),
        None => "void ".to_string(),
    };
    let sig = format!("{}{}({})", head, ctx.c_name(routine.name()), params);
    ctx.leave_routine();
    sig
}

fn emit_routine(ctx: &mut GenContext<'_>, routine: Routine<'_>) {
    let sig = signature(ctx, routine);
    ctx.writeln(&format!("{} {{", sig));

    ctx.enter_routine(routine);
    ctx.indent();
    for decl in routine.types() {
        emit_typedef(ctx, decl);
    }
    emit_local_constants(ctx, routine.constants());
    emit_variables(ctx, routine.variables());
    emit_block(ctx, routine.body());
    ctx.dedent();
    ctx.leave_routine();

    ctx.writeln("}");
}

// === Statements ===

fn emit_block(ctx: &mut GenContext<'_>, statements: &[Statement]) {
    for stmt in statements {
        emit_statement(ctx, stmt);
    }
}

/// Body of a control structure; a BEGIN..END block is inlined into the braces
fn emit_body(ctx: &mut GenContext<'_>, stmt: &Statement) {
    ctx.indent();
    match &stmt.kind {
        StatementKind::Block { statements } => emit_block(ctx, statements),
        _ => emit_statement(ctx, stmt),
    }
    ctx.dedent();
}

fn condition(ctx: &GenContext<'_>, expr: &Expression) -> String {
    generate_expression(ctx, expr.unparenthesized())
}

fn emit_statement(ctx: &mut GenContext<'_>, stmt: &Statement) {
    match &stmt.kind {
        StatementKind::Assignment { target, value } => {
            let lhs = generate_lvalue(ctx, target);
            let rhs = generate_expression(ctx, value);
            let is_string = target.is_plain()
                && ctx.lookup_type(&target.name) == Some(PrimitiveType::String);
            let line = if is_string {
                format!("strcpy({}, {});", lhs, rhs)
            } else {
                format!("{} = {};", lhs, rhs)
            };
            ctx.writeln(&line);
        }
        StatementKind::If {
            condition: cond,
            then_branch,
            else_branch,
        } => {
            let mut header = format!("if ({}) {{", condition(ctx, cond));
            let mut then_branch: &Statement = then_branch;
            let mut else_branch = else_branch.as_deref();
            loop {
                ctx.writeln(&header);
                emit_body(ctx, then_branch);
                match else_branch {
                    Some(Statement {
                        kind:
                            StatementKind::If {
                                condition: next_cond,
                                then_branch: next_then,
                                else_branch: next_else,
                            },
                        ..
                    }) => {
                        header = format!("}} else if ({}) {{", condition(ctx, next_cond));
                        then_branch = &**next_then;
                        else_branch = next_else.as_deref();
                    }
                    Some(other) => {
                        ctx.writeln("} else {");
                        emit_body(ctx, other);
                        ctx.writeln("}");
                        break;
                    }
                    None => {
                        ctx.writeln("}");
                        break;
                    }
                }
            }
        }
        StatementKind::While { condition: cond, body } => {
            let line = format!("while ({}) {{", condition(ctx, cond));
            ctx.writeln(&line);
            emit_body(ctx, body);
            ctx.writeln("}");
        }
        StatementKind::DoWhile { body, condition: cond } => {
            ctx.writeln("do {");
            emit_body(ctx, body);
            let line = format!("}} while ({});", condition(ctx, cond));
            ctx.writeln(&line);
        }
        StatementKind::For {
            variable,
            start,
            end,
            step,
            body,
        } => {
            let var = if ctx.is_ref_param(variable) {
                format!("(*{})", ctx.c_name(variable))
            } else {
                ctx.c_name(variable)
            };
            let descending = step.as_ref().is_some_and(is_negative_literal);
            let step_text = step
                .as_ref()
                .map(|s| generate_expression(ctx, s))
                .unwrap_or_else(|| "1".to_string());
            let line = format!(
                "for ({v} = {}; {v} {} {}; {v} += {}) {{",
                generate_expression(ctx, start),
                if descending { ">=" } else { "<=" },
                generate_expression(ctx, end),
                step_text,
                v = var
            );
            ctx.writeln(&line);
            emit_body(ctx, body);
            ctx.writeln("}");
        }
        StatementKind::Switch {
            expression,
            cases,
            default_case,
        } => {
            let line = format!("switch ({}) {{", condition(ctx, expression));
            ctx.writeln(&line);
            ctx.indent();
            for case in cases {
                for value in &case.values {
                    let label = format!("case {}:", generate_expression(ctx, value));
                    ctx.writeln(&label);
                }
                ctx.indent();
                emit_block(ctx, &case.body);
                ctx.writeln("break;");
                ctx.dedent();
            }
            if let Some(default_case) = default_case {
                ctx.writeln("default:");
                ctx.indent();
                emit_block(ctx, default_case);
                ctx.writeln("break;");
                ctx.dedent();
            }
            ctx.dedent();
            ctx.writeln("}");
        }
        StatementKind::Call { name, arguments } => {
            let line = format!("{};", generate_call(ctx, name, arguments));
            ctx.writeln(&line);
        }
        StatementKind::Scan { targets } => {
            let formats: String = targets.iter().map(|t| scan_format(ctx, t)).collect();
            let args: Vec<String> = targets
                .iter()
                .map(|t| format!("&{}", generate_lvalue(ctx, t)))
                .collect();
            let line = format!("scanf(\"{}\", {});", formats, args.join(", "));
            ctx.writeln(&line);
        }
        StatementKind::Print { expressions } => {
            let formats: String = expressions.iter().map(|e| print_format(ctx, e)).collect();
            let line = if expressions.is_empty() {
                "printf(\"\\n\");".to_string()
            } else {
                let args: Vec<String> = expressions
                    .iter()
                    .map(|e| generate_expression(ctx, e))
                    .collect();
                format!("printf(\"{}\\n\", {});", formats, args.join(", "))
            };
            ctx.writeln(&line);
        }
        StatementKind::Return { value } => {
            let line = if ctx.in_main() {
                "return 0;".to_string()
            } else {
                match value {
                    Some(value) if ctx.in_function() => {
                        format!("return {};", generate_expression(ctx, value.unparenthesized()))
                    }
                    _ => "return;".to_string(),
                }
            };
            ctx.writeln(&line);
        }
        StatementKind::Block { statements } => {
            ctx.writeln("{");
            ctx.indent();
            emit_block(ctx, statements);
            ctx.dedent();
            ctx.writeln("}");
        }
    }
}

fn is_negative_literal(expr: &Expression) -> bool {
    match &expr.unparenthesized().kind {
        ExpressionKind::Integer(n) => *n < 0,
        ExpressionKind::Real(r) => *r < 0.0,
        ExpressionKind::Unary {
            operator: UnaryOperator::Neg,
            operand,
        } => matches!(
            operand.kind,
            ExpressionKind::Integer(_) | ExpressionKind::Real(_)
        ),
        _ => false,
    }
}
