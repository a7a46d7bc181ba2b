//! Lexer error types

use thiserror::Error;
use usdb_ast::{Location, Span};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated character literal")]
    UnterminatedChar,

    #[error("character literal must contain exactly one character")]
    InvalidCharLiteral,

    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("integer literal '{0}' is too large")]
    IntegerOverflow(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub span: Span,
}

impl LexerError {
    pub fn new(kind: LexerErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn location(&self) -> Location {
        self.span.start
    }
}
