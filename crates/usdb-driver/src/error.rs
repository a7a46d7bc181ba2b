//! Diagnostics shared by every compiler phase

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use usdb_ast::{Location, Span};
use usdb_checker::SemanticError;
use usdb_codegen::CodegenError;
use usdb_lexer::LexerError;
use usdb_parser::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

impl From<usdb_checker::Severity> for Severity {
    fn from(severity: usdb_checker::Severity) -> Self {
        match severity {
            usdb_checker::Severity::Error => Severity::Error,
            usdb_checker::Severity::Warning => Severity::Warning,
        }
    }
}

/// The phase that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lexer,
    Parser,
    Semantic,
    Codegen,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lexer => write!(f, "lexer"),
            Phase::Parser => write!(f, "parser"),
            Phase::Semantic => write!(f, "semantic"),
            Phase::Codegen => write!(f, "codegen"),
        }
    }
}

/// One diagnostic, as reported to callers
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("[{severity}] Line {}, Column {}: {message}", location.line, location.column)]
pub struct CompilerError {
    pub message: String,
    pub location: Location,
    pub severity: Severity,
    pub phase: Phase,
    /// Full extent, for labelled reports
    #[serde(skip)]
    pub span: Span,
}

impl CompilerError {
    pub fn new(message: impl Into<String>, span: Span, severity: Severity, phase: Phase) -> Self {
        Self {
            message: message.into(),
            location: span.start,
            severity,
            phase,
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&LexerError> for CompilerError {
    fn from(err: &LexerError) -> Self {
        CompilerError::new(err.to_string(), err.span, Severity::Error, Phase::Lexer)
    }
}

impl From<&ParseError> for CompilerError {
    fn from(err: &ParseError) -> Self {
        CompilerError::new(err.to_string(), err.span(), Severity::Error, Phase::Parser)
    }
}

impl From<&SemanticError> for CompilerError {
    fn from(err: &SemanticError) -> Self {
        CompilerError::new(err.message.clone(), err.span, err.severity.into(), Phase::Semantic)
    }
}

impl From<&CodegenError> for CompilerError {
    fn from(err: &CodegenError) -> Self {
        let span = match err {
            CodegenError::Unsupported { span, .. } => *span,
        };
        CompilerError::new(err.to_string(), span, Severity::Error, Phase::Codegen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let span = Span::at(Location::new(3, 7, 40));
        let err = CompilerError::new("Undefined variable 'y'", span, Severity::Error, Phase::Semantic);
        assert_eq!(err.to_string(), "[ERROR] Line 3, Column 7: Undefined variable 'y'");

        let warning = CompilerError::new("unused", span, Severity::Warning, Phase::Semantic);
        assert_eq!(warning.to_string(), "[WARNING] Line 3, Column 7: unused");
    }

    #[test]
    fn test_serialized_shape() {
        let err = CompilerError::new("x", Span::at(Location::new(1, 2, 1)), Severity::Warning, Phase::Parser);
        let json = serde_json::to_value(&err).expect("serializable");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["phase"], "parser");
        assert_eq!(json["location"]["line"], 1);
        assert_eq!(json["location"]["column"], 2);
        assert!(json.get("span").is_none());
    }
}
