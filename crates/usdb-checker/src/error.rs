//! Semantic diagnostics

use std::fmt;

use thiserror::Error;
use usdb_ast::{Location, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A scope or type problem found during analysis
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SemanticError {
    pub message: String,
    pub span: Span,
    pub severity: Severity,
}

impl SemanticError {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn location(&self) -> Location {
        self.span.start
    }
}
