//! Type expressions as written in declarations

use serde::{Deserialize, Serialize};
use crate::{Expression, VarDeclaration};

/// Built-in scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Integer,
    Real,
    Boolean,
    Char,
    String,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Integer => "INTEGER",
            PrimitiveType::Real => "REAL",
            PrimitiveType::Boolean => "BOOLEAN",
            PrimitiveType::Char => "CHAR",
            PrimitiveType::String => "STRING",
        }
    }
}

/// A type as it appears after `:` or `=` in a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpression {
    /// `INTEGER`, `REAL`, ...
    Primitive(PrimitiveType),

    /// `ARRAY[10, 20] OF REAL`
    Array {
        dimensions: Vec<Expression>,
        element_type: Box<TypeExpression>,
    },

    /// `STRUCTURE x, y : INTEGER END`
    Structure { fields: Vec<VarDeclaration> },

    /// `(RED, GREEN, BLUE)`
    Enumeration { values: Vec<String> },

    /// Name of a type declared in a `TYPE` section
    Reference { name: String },
}

impl TypeExpression {
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            TypeExpression::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Short human-readable form used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            TypeExpression::Primitive(p) => p.name().to_string(),
            TypeExpression::Array { dimensions, element_type } => {
                format!("ARRAY[{}] OF {}", dimensions.len(), element_type.describe())
            }
            TypeExpression::Structure { .. } => "STRUCTURE".to_string(),
            TypeExpression::Enumeration { values } => format!("({})", values.join(", ")),
            TypeExpression::Reference { name } => name.clone(),
        }
    }
}
