//! Parser error types

use thiserror::Error;
use usdb_ast::{Location, Span};
use usdb_lexer::{LexerError, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    #[error("invalid type: {message}")]
    InvalidType { message: String, span: Span },

    #[error("invalid constant value: {found}")]
    InvalidConstant { found: String, span: Span },

    #[error("statement cannot start with {found}")]
    InvalidStatement { found: String, span: Span },

    #[error("{message}")]
    Lexical { message: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span, .. } => *span,
            ParseError::InvalidType { span, .. } => *span,
            ParseError::InvalidConstant { span, .. } => *span,
            ParseError::InvalidStatement { span, .. } => *span,
            ParseError::Lexical { span, .. } => *span,
        }
    }

    pub fn location(&self) -> Location {
        self.span().start
    }

    /// Build the right error for `token` when `expected` was wanted
    pub fn unexpected(expected: impl Into<String>, token: &Token) -> Self {
        if token.kind == TokenKind::Eof {
            ParseError::UnexpectedEof {
                expected: expected.into(),
                span: token.span,
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.into(),
                found: describe_token(token),
                span: token.span,
            }
        }
    }
}

impl From<LexerError> for ParseError {
    fn from(error: LexerError) -> Self {
        ParseError::Lexical {
            message: error.to_string(),
            span: error.span,
        }
    }
}

/// `identifier 'count'`, `'THEN'`, `integer '42'`
pub(crate) fn describe_token(token: &Token) -> String {
    match token.kind {
        TokenKind::Ident
        | TokenKind::IntegerLiteral
        | TokenKind::RealLiteral
        | TokenKind::StringLiteral
        | TokenKind::CharLiteral => format!("{} '{}'", token.kind.describe(), token.value),
        kind => kind.describe().to_string(),
    }
}
