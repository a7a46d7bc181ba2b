//! Statement AST nodes

use serde::{Deserialize, Serialize};
use crate::{Expression, LValue, Span};

/// A statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// `target <- value`
    Assignment { target: LValue, value: Expression },

    /// `IF cond THEN stmt [ELSE stmt]`
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },

    /// `WHILE cond DO stmt`
    While { condition: Expression, body: Box<Statement> },

    /// `DO stmt WHILE cond`
    DoWhile { body: Box<Statement>, condition: Expression },

    /// `FOR i <- a TO b [STEP s] DO stmt`; no STEP always means +1
    For {
        variable: String,
        start: Expression,
        end: Expression,
        step: Option<Expression>,
        body: Box<Statement>,
    },

    /// `SWITCH expr OF CASE ... DEFAULT ... END`
    Switch {
        expression: Expression,
        cases: Vec<CaseClause>,
        default_case: Option<Vec<Statement>>,
    },

    /// Procedure invocation, with or without parentheses
    Call { name: String, arguments: Vec<Expression> },

    /// `SCAN(a, b[i])`
    Scan { targets: Vec<LValue> },

    /// `PRINT("x = ", x)`
    Print { expressions: Vec<Expression> },

    /// `RETURN [expr]`
    Return { value: Option<Expression> },

    /// `BEGIN ... END`
    Block { statements: Vec<Statement> },
}

/// One `CASE v1, v2 : ...` arm of a SWITCH
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    pub values: Vec<Expression>,
    pub body: Vec<Statement>,
    pub span: Span,
}
