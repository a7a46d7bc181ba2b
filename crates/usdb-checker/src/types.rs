//! Resolved type representations

use std::fmt;

/// A resolved type (after name resolution)
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolType {
    Integer,
    Real,
    Boolean,
    Char,
    String,

    /// `dimensions` counts the indices one access consumes
    Array {
        dimensions: usize,
        element: Box<SymbolType>,
    },

    /// Fields keep declaration order and source casing
    Structure {
        name: Option<String>,
        fields: Vec<(String, SymbolType)>,
    },

    /// Values of an enumeration behave as integers
    Enumeration { name: String },

    Function {
        params: Vec<ParamType>,
        return_type: Box<SymbolType>,
    },

    Procedure { params: Vec<ParamType> },

    /// Result of an unresolvable sub-expression; compatible with everything
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamType {
    pub ty: SymbolType,
    pub by_reference: bool,
}

/// Outcome of checking a value against a destination type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Exact,
    /// Accepted, but the value is truncated (REAL into INTEGER)
    Narrowing,
    Incompatible,
}

impl SymbolType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, SymbolType::Unknown)
    }

    pub fn is_real(&self) -> bool {
        matches!(self, SymbolType::Real)
    }

    /// Integer-like types usable as indices and loop counters
    pub fn is_ordinal(&self) -> bool {
        matches!(
            self,
            SymbolType::Integer | SymbolType::Char | SymbolType::Enumeration { .. }
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_ordinal() || self.is_real()
    }

    pub fn is_routine(&self) -> bool {
        matches!(self, SymbolType::Function { .. } | SymbolType::Procedure { .. })
    }

    /// Case-insensitive field lookup on a structure
    pub fn field(&self, name: &str) -> Option<&SymbolType> {
        match self {
            SymbolType::Structure { fields, .. } => fields
                .iter()
                .find(|(field, _)| field.eq_ignore_ascii_case(name))
                .map(|(_, ty)| ty),
            _ => None,
        }
    }

    /// Can a value of type `value` be stored in a slot of type `self`?
    pub fn accepts(&self, value: &SymbolType) -> Compatibility {
        use SymbolType::*;
        match (self, value) {
            (Unknown, _) | (_, Unknown) => Compatibility::Exact,
            (Real, Integer | Char | Enumeration { .. }) => Compatibility::Exact,
            (Integer | Enumeration { .. }, Integer | Enumeration { .. }) => Compatibility::Exact,
            (Integer, Real) => Compatibility::Narrowing,
            (String, Char) => Compatibility::Exact,
            (Array { dimensions: a, element: x }, Array { dimensions: b, element: y }) => {
                if a == b && x.accepts(y) == Compatibility::Exact {
                    Compatibility::Exact
                } else {
                    Compatibility::Incompatible
                }
            }
            (Structure { name: Some(a), .. }, Structure { name: Some(b), .. }) => {
                if a.eq_ignore_ascii_case(b) {
                    Compatibility::Exact
                } else {
                    Compatibility::Incompatible
                }
            }
            (a, b) if a == b => Compatibility::Exact,
            _ => Compatibility::Incompatible,
        }
    }

    /// Result type of an arithmetic operator
    pub fn arithmetic(left: &SymbolType, right: &SymbolType) -> SymbolType {
        if left.is_real() || right.is_real() {
            SymbolType::Real
        } else {
            SymbolType::Integer
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolType::Integer => write!(f, "integer"),
            SymbolType::Real => write!(f, "real"),
            SymbolType::Boolean => write!(f, "boolean"),
            SymbolType::Char => write!(f, "char"),
            SymbolType::String => write!(f, "string"),
            SymbolType::Array { dimensions, element } => {
                write!(f, "array[{}] of {}", dimensions, element)
            }
            SymbolType::Structure { name: Some(name), .. } => write!(f, "{}", name),
            SymbolType::Structure { name: None, .. } => write!(f, "structure"),
            SymbolType::Enumeration { name } => write!(f, "{}", name),
            SymbolType::Function { params, return_type } => {
                write!(f, "function({}): {}", params.len(), return_type)
            }
            SymbolType::Procedure { params } => write!(f, "procedure({})", params.len()),
            SymbolType::Unknown => write!(f, "unknown"),
        }
    }
}
