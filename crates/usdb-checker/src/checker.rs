//! Main semantic checker implementation
//!
//! Diagnostics are collected, never thrown: an unresolvable sub-expression
//! becomes `SymbolType::Unknown`, which is compatible with everything, so a
//! single mistake produces a single diagnostic.

use usdb_ast::*;

use crate::{Compatibility, ParamType, SemanticError, Symbol, SymbolTable, SymbolType};

/// Real to real built-ins
const MATH_BUILTINS: &[&str] = &[
    "sqrt", "abs", "sin", "cos", "tan", "ln", "log", "exp", "floor", "ceil", "round",
];

/// Which body is being checked
#[derive(Debug, Clone)]
enum Context {
    Main,
    Function { name: String, return_type: SymbolType },
    Procedure { name: String },
}

pub struct Checker {
    pub symbols: SymbolTable,
    diagnostics: Vec<SemanticError>,
    context: Context,
    saw_return: bool,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    pub fn new() -> Self {
        let mut checker = Self {
            symbols: SymbolTable::new(),
            diagnostics: Vec::new(),
            context: Context::Main,
            saw_return: false,
        };
        checker.define_builtins();
        // Built-ins live in their own outermost scope so programs may shadow them
        checker.symbols.enter_scope();
        checker
    }

    fn define_builtins(&mut self) {
        for name in MATH_BUILTINS {
            let ty = SymbolType::Function {
                params: vec![ParamType {
                    ty: SymbolType::Real,
                    by_reference: false,
                }],
                return_type: Box::new(SymbolType::Real),
            };
            let _ = self.symbols.define(Symbol::variable(*name, ty));
        }
        let length = SymbolType::Function {
            params: vec![ParamType {
                ty: SymbolType::String,
                by_reference: false,
            }],
            return_type: Box::new(SymbolType::Integer),
        };
        let _ = self.symbols.define(Symbol::variable("length", length));
    }

    /// Check a whole program and hand back every diagnostic, in discovery order
    pub fn check_program(mut self, program: &Program) -> Vec<SemanticError> {
        self.declare_types(&program.types);
        self.declare_constants(&program.constants);
        self.declare_variables(&program.variables);

        // Signatures first so forward and mutually recursive calls resolve
        let signatures: Vec<SymbolType> = program
            .routines()
            .map(|routine| self.declare_signature(routine))
            .collect();
        for (routine, signature) in program.routines().zip(signatures) {
            self.check_routine(routine, signature);
        }

        self.context = Context::Main;
        self.check_block(&program.body);

        self.diagnostics
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(SemanticError::error(message, span));
    }

    fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(SemanticError::warning(message, span));
    }

    fn define(&mut self, symbol: Symbol, span: Span) {
        let name = symbol.name.clone();
        if self.symbols.define(symbol).is_err() {
            self.error(format!("Duplicate declaration of '{}'", name), span);
        }
    }

    // === Declarations ===

    fn declare_types(&mut self, types: &[TypeDeclaration]) {
        for decl in types {
            let ty = self.resolve_named_type(&decl.definition, Some(&decl.name), decl.span);
            if !self.symbols.define_type(&decl.name, ty) {
                self.error(format!("Duplicate type '{}'", decl.name), decl.span);
            }
        }
    }

    fn declare_constants(&mut self, constants: &[ConstDeclaration]) {
        for decl in constants {
            let ty = literal_type(&decl.value);
            self.define(
                Symbol::constant(decl.name.clone(), ty, decl.value.clone()),
                decl.span,
            );
        }
    }

    fn declare_variables(&mut self, variables: &[VarDeclaration]) {
        for decl in variables {
            let ty = self.resolve_type(&decl.var_type, decl.span);
            for name in &decl.names {
                self.define(Symbol::variable(name.clone(), ty.clone()), decl.span);
            }
        }
    }

    /// Resolve and define a routine's type, returning it for the body check
    fn declare_signature(&mut self, routine: Routine<'_>) -> SymbolType {
        let params = self.resolve_parameters(routine.parameters());
        let ty = match routine.return_type() {
            Some(return_type) => SymbolType::Function {
                params,
                return_type: Box::new(self.resolve_type(return_type, routine.span())),
            },
            None => SymbolType::Procedure { params },
        };
        self.define(Symbol::variable(routine.name(), ty.clone()), routine.span());
        ty
    }

    fn resolve_parameters(&mut self, parameters: &[Parameter]) -> Vec<ParamType> {
        parameters
            .iter()
            .map(|p| ParamType {
                ty: self.resolve_type(&p.param_type, p.span),
                by_reference: p.by_reference,
            })
            .collect()
    }

    // === Types ===

    pub(crate) fn resolve_type(&mut self, ty: &TypeExpression, span: Span) -> SymbolType {
        self.resolve_named_type(ty, None, span)
    }

    fn resolve_named_type(
        &mut self,
        ty: &TypeExpression,
        name: Option<&str>,
        span: Span,
    ) -> SymbolType {
        match ty {
            TypeExpression::Primitive(p) => primitive_type(*p),
            TypeExpression::Array {
                dimensions,
                element_type,
            } => {
                for dimension in dimensions {
                    let dim_ty = self.infer_expression(dimension);
                    if !dim_ty.is_unknown() && !dim_ty.is_ordinal() {
                        self.error(
                            format!("Array size must be an integer, found {}", dim_ty),
                            dimension.span,
                        );
                    }
                    // C storage holds one extra element for 1-based indexing
                    if let ExpressionKind::Integer(n) = dimension.kind {
                        if !(1..i64::MAX).contains(&n) {
                            self.error(format!("Array size {} is out of range", n), dimension.span);
                        }
                    }
                }
                SymbolType::Array {
                    dimensions: dimensions.len(),
                    element: Box::new(self.resolve_type(element_type, span)),
                }
            }
            TypeExpression::Structure { fields } => {
                let mut resolved: Vec<(String, SymbolType)> = Vec::new();
                for field in fields {
                    let field_ty = self.resolve_type(&field.var_type, field.span);
                    for field_name in &field.names {
                        if resolved.iter().any(|(n, _)| n.eq_ignore_ascii_case(field_name)) {
                            self.error(format!("Duplicate field '{}'", field_name), field.span);
                            continue;
                        }
                        resolved.push((field_name.clone(), field_ty.clone()));
                    }
                }
                SymbolType::Structure {
                    name: name.map(str::to_string),
                    fields: resolved,
                }
            }
            TypeExpression::Enumeration { values } => {
                let enum_ty = SymbolType::Enumeration {
                    name: name.unwrap_or("enumeration").to_string(),
                };
                for (ordinal, value) in values.iter().enumerate() {
                    self.define(
                        Symbol::constant(
                            value.clone(),
                            enum_ty.clone(),
                            Literal::Integer(ordinal as i64),
                        ),
                        span,
                    );
                }
                enum_ty
            }
            TypeExpression::Reference { name } => match self.symbols.lookup_type(name) {
                Some(ty) => ty.clone(),
                None => {
                    self.error(format!("Unknown type '{}'", name), span);
                    SymbolType::Unknown
                }
            },
        }
    }

    // === Routines ===

    fn check_routine(&mut self, routine: Routine<'_>, signature: SymbolType) {
        self.symbols.enter_scope();

        let (params, return_type) = match signature {
            SymbolType::Function {
                params,
                return_type,
            } => (params, Some(*return_type)),
            SymbolType::Procedure { params } => (params, None),
            _ => (Vec::new(), None),
        };
        for (param, resolved) in routine.parameters().iter().zip(params) {
            self.define(
                Symbol::parameter(param.name.clone(), resolved.ty, param.by_reference),
                param.span,
            );
        }
        self.declare_types(routine.types());
        self.declare_constants(routine.constants());
        self.declare_variables(routine.variables());

        self.context = match return_type {
            Some(return_type) => Context::Function {
                name: routine.name().to_string(),
                return_type,
            },
            None => Context::Procedure {
                name: routine.name().to_string(),
            },
        };
        self.saw_return = false;

        self.check_block(routine.body());

        if !routine.is_procedure() && !self.saw_return {
            self.warning(
                format!("Function '{}' has no RETURN statement", routine.name()),
                routine.span(),
            );
        }

        self.symbols.exit_scope();
    }

    // === Statements ===

    fn check_block(&mut self, statements: &[Statement]) {
        for stmt in statements {
            self.check_statement(stmt);
        }
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match &stmt.kind {
            StatementKind::Assignment { target, value } => {
                let target_ty = self.resolve_lvalue(target, "assign to");
                let value_ty = self.infer_expression(value);
                self.check_assignable(&target_ty, &value_ty, &target.name, stmt.span);
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(condition);
                self.check_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_statement(else_branch);
                }
            }
            StatementKind::While { condition, body } => {
                self.check_condition(condition);
                self.check_statement(body);
            }
            StatementKind::DoWhile { body, condition } => {
                self.check_statement(body);
                self.check_condition(condition);
            }
            StatementKind::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                self.check_for_variable(variable, stmt.span);
                for bound in [Some(start), Some(end), step.as_ref()].into_iter().flatten() {
                    let ty = self.infer_expression(bound);
                    if !ty.is_unknown() && !ty.is_numeric() {
                        self.error(
                            format!("FOR bounds must be numeric, found {}", ty),
                            bound.span,
                        );
                    }
                }
                self.check_statement(body);
            }
            StatementKind::Switch {
                expression,
                cases,
                default_case,
            } => {
                let selector = self.infer_expression(expression);
                for case in cases {
                    for value in &case.values {
                        let value_ty = self.infer_expression(value);
                        if selector.accepts(&value_ty) == Compatibility::Incompatible {
                            self.error(
                                format!(
                                    "CASE value of type {} does not match SWITCH on {}",
                                    value_ty, selector
                                ),
                                value.span,
                            );
                        }
                    }
                    self.check_block(&case.body);
                }
                if let Some(default_case) = default_case {
                    self.check_block(default_case);
                }
            }
            StatementKind::Call { name, arguments } => self.check_call_statement(name, arguments, stmt.span),
            StatementKind::Scan { targets } => {
                for target in targets {
                    self.resolve_lvalue(target, "read into");
                }
            }
            StatementKind::Print { expressions } => {
                for expr in expressions {
                    self.infer_expression(expr);
                }
            }
            StatementKind::Return { value } => self.check_return(value.as_ref(), stmt.span),
            StatementKind::Block { statements } => self.check_block(statements),
        }
    }

    fn check_condition(&mut self, condition: &Expression) {
        let ty = self.infer_expression(condition);
        if !ty.is_unknown() && ty != SymbolType::Boolean {
            self.warning(
                format!("Condition should be BOOLEAN, found {}", ty),
                condition.span,
            );
        }
    }

    fn check_for_variable(&mut self, variable: &str, span: Span) {
        match self.symbols.lookup(variable).cloned() {
            None => self.error(format!("Undefined variable '{}'", variable), span),
            Some(symbol) if symbol.is_constant => {
                self.error(format!("Cannot assign to constant '{}'", symbol.name), span)
            }
            Some(symbol) if !symbol.ty.is_unknown() && !symbol.ty.is_ordinal() => self.error(
                format!(
                    "FOR loop variable '{}' must be INTEGER, found {}",
                    symbol.name, symbol.ty
                ),
                span,
            ),
            Some(_) => {}
        }
    }

    fn check_assignable(&mut self, target: &SymbolType, value: &SymbolType, name: &str, span: Span) {
        match target.accepts(value) {
            Compatibility::Exact => {}
            Compatibility::Narrowing => self.warning(
                format!(
                    "Assigning {} to '{}' of type {} truncates the value",
                    value, name, target
                ),
                span,
            ),
            Compatibility::Incompatible => self.error(
                format!(
                    "Type mismatch: cannot assign {} to '{}' of type {}",
                    value, name, target
                ),
                span,
            ),
        }
    }

    fn check_call_statement(&mut self, name: &str, arguments: &[Expression], span: Span) {
        let symbol = match self.symbols.lookup(name) {
            Some(symbol) => symbol.clone(),
            None => {
                self.error(format!("Undefined procedure '{}'", name), span);
                for arg in arguments {
                    self.infer_expression(arg);
                }
                return;
            }
        };

        match &symbol.ty {
            // A function result may be discarded
            SymbolType::Procedure { params } | SymbolType::Function { params, .. } => {
                self.check_arguments(&symbol.name, params, arguments, span);
            }
            SymbolType::Unknown => {}
            _ => self.error(format!("'{}' is not a procedure", symbol.name), span),
        }
    }

    fn check_return(&mut self, value: Option<&Expression>, span: Span) {
        self.saw_return = true;
        match (self.context.clone(), value) {
            (Context::Function { name, return_type }, Some(value)) => {
                let value_ty = self.infer_expression(value);
                match return_type.accepts(&value_ty) {
                    Compatibility::Exact => {}
                    Compatibility::Narrowing => self.warning(
                        format!(
                            "Function '{}' returns {}, the {} result is truncated",
                            name, return_type, value_ty
                        ),
                        value.span,
                    ),
                    Compatibility::Incompatible => self.error(
                        format!(
                            "Type mismatch: function '{}' returns {}, found {}",
                            name, return_type, value_ty
                        ),
                        value.span,
                    ),
                }
            }
            (Context::Function { name, .. }, None) => {
                self.warning(format!("RETURN without a value in function '{}'", name), span)
            }
            (Context::Procedure { name }, Some(value)) => {
                self.infer_expression(value);
                self.warning(
                    format!("RETURN value is ignored in procedure '{}'", name),
                    span,
                );
            }
            (Context::Main, Some(value)) => {
                self.infer_expression(value);
                self.warning("RETURN value is ignored in the main program", span);
            }
            (Context::Procedure { .. } | Context::Main, None) => {}
        }
    }

    /// Resolve an assignment or SCAN target; `action` words the constant error
    fn resolve_lvalue(&mut self, target: &LValue, action: &str) -> SymbolType {
        let symbol = match self.symbols.lookup(&target.name) {
            Some(symbol) => symbol.clone(),
            None => {
                self.error(format!("Undefined variable '{}'", target.name), target.span);
                self.infer_accessor_indices(&target.accessors);
                return SymbolType::Unknown;
            }
        };

        if symbol.is_constant {
            let message = if action == "assign to" {
                format!("Cannot assign to constant '{}'", symbol.name)
            } else {
                format!("Cannot {} constant '{}'", action, symbol.name)
            };
            self.error(message, target.span);
        } else if symbol.ty.is_routine() {
            self.error(format!("Cannot {} routine '{}'", action, symbol.name), target.span);
            self.infer_accessor_indices(&target.accessors);
            return SymbolType::Unknown;
        }

        let mut ty = symbol.ty;
        for accessor in &target.accessors {
            ty = match accessor {
                Accessor::Index(indices) => self.apply_indices(ty, indices, &target.name, target.span),
                Accessor::Field(field) => self.apply_field(ty, field, target.span),
            };
        }
        ty
    }

    fn infer_accessor_indices(&mut self, accessors: &[Accessor]) {
        for accessor in accessors {
            if let Accessor::Index(indices) = accessor {
                for index in indices {
                    self.infer_expression(index);
                }
            }
        }
    }

    // === Expressions ===

    pub(crate) fn infer_expression(&mut self, expr: &Expression) -> SymbolType {
        match &expr.kind {
            ExpressionKind::Integer(_) => SymbolType::Integer,
            ExpressionKind::Real(_) => SymbolType::Real,
            ExpressionKind::Boolean(_) => SymbolType::Boolean,
            ExpressionKind::Char(_) => SymbolType::Char,
            ExpressionKind::String(_) => SymbolType::String,
            ExpressionKind::Identifier(name) => self.infer_identifier(name, expr.span),
            ExpressionKind::Binary {
                operator,
                left,
                right,
            } => {
                let left_ty = self.infer_expression(left);
                let right_ty = self.infer_expression(right);
                self.infer_binary(*operator, &left_ty, &right_ty, expr.span)
            }
            ExpressionKind::Unary { operator, operand } => {
                let ty = self.infer_expression(operand);
                match operator {
                    UnaryOperator::Neg => {
                        if !ty.is_unknown() && !ty.is_numeric() {
                            self.error(
                                format!("Operator '-' requires a numeric operand, found {}", ty),
                                expr.span,
                            );
                        }
                        ty
                    }
                    UnaryOperator::Not => SymbolType::Boolean,
                }
            }
            ExpressionKind::ArrayAccess { array, indices } => {
                let base = self.infer_expression(array);
                let name = root_name(array).unwrap_or("expression").to_string();
                self.apply_indices(base, indices, &name, expr.span)
            }
            ExpressionKind::FieldAccess { object, field } => {
                let base = self.infer_expression(object);
                self.apply_field(base, field, expr.span)
            }
            ExpressionKind::FunctionCall { name, arguments } => {
                self.infer_call(name, arguments, expr.span)
            }
            ExpressionKind::Paren(inner) => self.infer_expression(inner),
        }
    }

    fn infer_identifier(&mut self, name: &str, span: Span) -> SymbolType {
        let symbol = match self.symbols.lookup(name) {
            Some(symbol) => symbol.clone(),
            None => {
                self.error(format!("Undefined variable '{}'", name), span);
                return SymbolType::Unknown;
            }
        };
        match symbol.ty {
            SymbolType::Function {
                params,
                return_type,
            } => {
                if !params.is_empty() {
                    self.error(
                        format!(
                            "Function '{}' expects {} argument(s), found 0",
                            symbol.name,
                            params.len()
                        ),
                        span,
                    );
                }
                *return_type
            }
            SymbolType::Procedure { .. } => {
                self.error(
                    format!("Procedure '{}' cannot be used in an expression", symbol.name),
                    span,
                );
                SymbolType::Unknown
            }
            ty => ty,
        }
    }

    fn infer_binary(
        &mut self,
        operator: BinaryOperator,
        left: &SymbolType,
        right: &SymbolType,
        span: Span,
    ) -> SymbolType {
        if operator.is_arithmetic() {
            for operand in [left, right] {
                if !operand.is_unknown() && !operand.is_numeric() {
                    self.error(
                        format!(
                            "Operator '{}' requires numeric operands, found {}",
                            operator.symbol(),
                            operand
                        ),
                        span,
                    );
                    return SymbolType::Unknown;
                }
            }
            SymbolType::arithmetic(left, right)
        } else {
            SymbolType::Boolean
        }
    }

    fn infer_call(&mut self, name: &str, arguments: &[Expression], span: Span) -> SymbolType {
        let symbol = match self.symbols.lookup(name) {
            Some(symbol) => symbol.clone(),
            None => {
                self.error(format!("Undefined function '{}'", name), span);
                for arg in arguments {
                    self.infer_expression(arg);
                }
                return SymbolType::Unknown;
            }
        };

        match &symbol.ty {
            SymbolType::Function {
                params,
                return_type,
            } => {
                self.check_arguments(&symbol.name, params, arguments, span);
                (**return_type).clone()
            }
            SymbolType::Procedure { params } => {
                self.error(
                    format!("Procedure '{}' cannot be used in an expression", symbol.name),
                    span,
                );
                self.check_arguments(&symbol.name, params, arguments, span);
                SymbolType::Unknown
            }
            SymbolType::Unknown => SymbolType::Unknown,
            _ => {
                self.error(format!("'{}' is not a function", symbol.name), span);
                SymbolType::Unknown
            }
        }
    }

    fn check_arguments(
        &mut self,
        name: &str,
        params: &[ParamType],
        arguments: &[Expression],
        span: Span,
    ) {
        if params.len() != arguments.len() {
            self.error(
                format!(
                    "'{}' expects {} argument(s), found {}",
                    name,
                    params.len(),
                    arguments.len()
                ),
                span,
            );
        }

        for (position, arg) in arguments.iter().enumerate() {
            let arg_ty = self.infer_expression(arg);
            let Some(param) = params.get(position) else {
                continue;
            };
            if param.by_reference && !is_lvalue(arg) {
                self.error(
                    format!(
                        "Argument {} of '{}' is passed by reference and must be a variable",
                        position + 1,
                        name
                    ),
                    arg.span,
                );
            }
            match param.ty.accepts(&arg_ty) {
                Compatibility::Exact => {}
                Compatibility::Narrowing => self.warning(
                    format!(
                        "Argument {} of '{}' truncates {} to {}",
                        position + 1,
                        name,
                        arg_ty,
                        param.ty
                    ),
                    arg.span,
                ),
                Compatibility::Incompatible => self.error(
                    format!(
                        "Argument {} of '{}': expected {}, found {}",
                        position + 1,
                        name,
                        param.ty,
                        arg_ty
                    ),
                    arg.span,
                ),
            }
        }
    }

    fn apply_indices(
        &mut self,
        base: SymbolType,
        indices: &[Expression],
        name: &str,
        span: Span,
    ) -> SymbolType {
        for index in indices {
            let ty = self.infer_expression(index);
            if !ty.is_unknown() && !ty.is_ordinal() {
                self.error(
                    format!("Array index must be an integer, found {}", ty),
                    index.span,
                );
            }
        }

        let mut ty = base;
        let mut remaining = indices.len();
        while remaining > 0 {
            ty = match ty {
                SymbolType::Array {
                    dimensions,
                    element,
                } => {
                    if remaining >= dimensions {
                        remaining -= dimensions;
                        *element
                    } else {
                        let left = dimensions - remaining;
                        remaining = 0;
                        SymbolType::Array {
                            dimensions: left,
                            element,
                        }
                    }
                }
                SymbolType::String if remaining == 1 => {
                    remaining = 0;
                    SymbolType::Char
                }
                SymbolType::Unknown => return SymbolType::Unknown,
                other if remaining == indices.len() => {
                    log::trace!("indexing non-array '{}' of type {}", name, other);
                    return SymbolType::Unknown;
                }
                _ => {
                    self.error(format!("Too many indices for '{}'", name), span);
                    return SymbolType::Unknown;
                }
            };
        }
        ty
    }

    fn apply_field(&mut self, base: SymbolType, field: &str, span: Span) -> SymbolType {
        match &base {
            SymbolType::Unknown => SymbolType::Unknown,
            SymbolType::Structure { .. } => match base.field(field) {
                Some(ty) => ty.clone(),
                None => {
                    self.error(format!("Unknown field '{}' in {}", field, base), span);
                    SymbolType::Unknown
                }
            },
            _ => {
                self.error(
                    format!("Unknown field '{}': {} is not a structure", field, base),
                    span,
                );
                SymbolType::Unknown
            }
        }
    }
}

fn primitive_type(p: PrimitiveType) -> SymbolType {
    match p {
        PrimitiveType::Integer => SymbolType::Integer,
        PrimitiveType::Real => SymbolType::Real,
        PrimitiveType::Boolean => SymbolType::Boolean,
        PrimitiveType::Char => SymbolType::Char,
        PrimitiveType::String => SymbolType::String,
    }
}

fn literal_type(literal: &Literal) -> SymbolType {
    match literal {
        Literal::Integer(_) => SymbolType::Integer,
        Literal::Real(_) => SymbolType::Real,
        Literal::Boolean(_) => SymbolType::Boolean,
        Literal::Char(_) => SymbolType::Char,
        Literal::String(_) => SymbolType::String,
    }
}

/// Expressions that denote storage (may be passed by reference)
fn is_lvalue(expr: &Expression) -> bool {
    match &expr.kind {
        ExpressionKind::Identifier(_) => true,
        ExpressionKind::ArrayAccess { array, .. } => is_lvalue(array),
        ExpressionKind::FieldAccess { object, .. } => is_lvalue(object),
        _ => false,
    }
}

fn root_name(expr: &Expression) -> Option<&str> {
    match &expr.kind {
        ExpressionKind::Identifier(name) => Some(name),
        ExpressionKind::ArrayAccess { array, .. } => root_name(array),
        ExpressionKind::FieldAccess { object, .. } => root_name(object),
        _ => None,
    }
}
