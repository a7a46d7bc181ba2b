//! Declaration AST nodes

use serde::{Deserialize, Serialize};
use crate::{Literal, Span, Statement, TypeExpression};

/// `CONST N = 10`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstDeclaration {
    pub name: String,
    pub value: Literal,
    pub span: Span,
}

/// `TYPE Point = STRUCTURE ... END`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    pub definition: TypeExpression,
    pub span: Span,
}

/// `VAR a, b : INTEGER`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDeclaration {
    pub names: Vec<String>,
    pub var_type: TypeExpression,
    pub span: Span,
}

/// Routine parameter; `VAR x : T` passes by reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: TypeExpression,
    pub by_reference: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeExpression,
    pub constants: Vec<ConstDeclaration>,
    pub types: Vec<TypeDeclaration>,
    pub variables: Vec<VarDeclaration>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDeclaration {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub constants: Vec<ConstDeclaration>,
    pub types: Vec<TypeDeclaration>,
    pub variables: Vec<VarDeclaration>,
    pub body: Vec<Statement>,
    pub span: Span,
}

/// Borrowed view over either kind of routine
#[derive(Debug, Clone, Copy)]
pub enum Routine<'a> {
    Function(&'a FunctionDeclaration),
    Procedure(&'a ProcedureDeclaration),
}

impl<'a> Routine<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Routine::Function(f) => &f.name,
            Routine::Procedure(p) => &p.name,
        }
    }

    pub fn parameters(&self) -> &'a [Parameter] {
        match self {
            Routine::Function(f) => &f.parameters,
            Routine::Procedure(p) => &p.parameters,
        }
    }

    pub fn return_type(&self) -> Option<&'a TypeExpression> {
        match self {
            Routine::Function(f) => Some(&f.return_type),
            Routine::Procedure(_) => None,
        }
    }

    pub fn constants(&self) -> &'a [ConstDeclaration] {
        match self {
            Routine::Function(f) => &f.constants,
            Routine::Procedure(p) => &p.constants,
        }
    }

    pub fn types(&self) -> &'a [TypeDeclaration] {
        match self {
            Routine::Function(f) => &f.types,
            Routine::Procedure(p) => &p.types,
        }
    }

    pub fn variables(&self) -> &'a [VarDeclaration] {
        match self {
            Routine::Function(f) => &f.variables,
            Routine::Procedure(p) => &p.variables,
        }
    }

    pub fn body(&self) -> &'a [Statement] {
        match self {
            Routine::Function(f) => &f.body,
            Routine::Procedure(p) => &p.body,
        }
    }

    pub fn span(&self) -> crate::Span {
        match self {
            Routine::Function(f) => f.span,
            Routine::Procedure(p) => p.span,
        }
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Routine::Procedure(_))
    }
}
