//! Expression AST nodes

use serde::{Deserialize, Serialize};
use crate::Span;

/// An expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Strip any number of enclosing parentheses
    pub fn unparenthesized(&self) -> &Expression {
        match &self.kind {
            ExpressionKind::Paren(inner) => inner.unparenthesized(),
            _ => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Char(char),
    String(String),

    /// Identifier: `x`, `Total`
    Identifier(String),

    /// Binary operation: `a + b`, `x <> y`
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation: `-x`, `NOT done`
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Index access: `grid[i, j]` or `grid[i][j]`
    ArrayAccess {
        array: Box<Expression>,
        indices: Vec<Expression>,
    },

    /// Field access: `p.x`
    FieldAccess {
        object: Box<Expression>,
        field: String,
    },

    /// Function call: `max(a, b)`
    FunctionCall {
        name: String,
        arguments: Vec<Expression>,
    },

    /// Parenthesized expression, kept for faithful output
    Paren(Box<Expression>),
}

/// A constant's literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Char(char),
    String(String),
}

impl Literal {
    pub fn to_expression_kind(&self) -> ExpressionKind {
        match self {
            Literal::Integer(v) => ExpressionKind::Integer(*v),
            Literal::Real(v) => ExpressionKind::Real(*v),
            Literal::Boolean(v) => ExpressionKind::Boolean(*v),
            Literal::Char(v) => ExpressionKind::Char(*v),
            Literal::String(v) => ExpressionKind::String(v.clone()),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Pow,

    // Relational
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
}

impl BinaryOperator {
    /// Algo spelling
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::IntDiv => "DIV",
            BinaryOperator::Mod => "MOD",
            BinaryOperator::Pow => "^",
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        }
    }

    /// Binding strength in Algo, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => 3,
            BinaryOperator::Add | BinaryOperator::Sub => 4,
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::IntDiv | BinaryOperator::Mod => 5,
            BinaryOperator::Pow => 6,
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        self.precedence() >= 4
    }

    pub fn is_relational(&self) -> bool {
        self.precedence() == 3
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Neg,
    Not,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Neg => "-",
            UnaryOperator::Not => "NOT",
        }
    }
}

/// Assignable place: `x`, `grid[i, j]`, `people[k].age`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LValue {
    pub name: String,
    pub accessors: Vec<Accessor>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Accessor {
    Index(Vec<Expression>),
    Field(String),
}

impl LValue {
    pub fn is_plain(&self) -> bool {
        self.accessors.is_empty()
    }

    /// View the place as an expression, for type inference and display
    pub fn to_expression(&self) -> Expression {
        let mut expr = Expression::new(ExpressionKind::Identifier(self.name.clone()), self.span);
        for accessor in &self.accessors {
            let kind = match accessor {
                Accessor::Index(indices) => ExpressionKind::ArrayAccess {
                    array: Box::new(expr),
                    indices: indices.clone(),
                },
                Accessor::Field(field) => ExpressionKind::FieldAccess {
                    object: Box::new(expr),
                    field: field.clone(),
                },
            };
            expr = Expression::new(kind, self.span);
        }
        expr
    }
}
