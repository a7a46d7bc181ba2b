//! USDB Algo Parser - Recursive descent parser
//!
//! Parses Algo source into a [`Program`]. The parser stops at the first
//! syntax error; lexer errors abort before any parsing is attempted.
//!
//! Parsing quirks:
//! - a statement that starts with an identifier is an assignment only when
//!   `<-` follows the target, otherwise it is a procedure call
//! - `RETURN` takes a value only when one follows on the same line
//! - `END.` closes the program, so `.field` needs an identifier after the dot

mod error;
mod expressions;
mod parser;
mod statements;

pub use error::*;
pub use parser::*;

use usdb_ast::Program;
use usdb_lexer::{tokenize, Token};

/// Result of parsing one source text
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub ast: Option<Program>,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn is_ok(&self) -> bool {
        self.ast.is_some() && self.errors.is_empty()
    }
}

/// Lex and parse a source string
pub fn parse(source: &str) -> ParseOutput {
    let lexed = tokenize(source);
    if lexed.has_errors() {
        log::debug!("parse aborted: {} lexer errors", lexed.errors.len());
        return ParseOutput {
            ast: None,
            errors: lexed.errors.into_iter().map(ParseError::from).collect(),
        };
    }
    parse_tokens(lexed.tokens)
}

/// Parse an already tokenized program
pub fn parse_tokens(tokens: Vec<Token>) -> ParseOutput {
    let mut parser = Parser::new(tokens);
    match parser.parse_program() {
        Ok(program) => ParseOutput {
            ast: Some(program),
            errors: Vec::new(),
        },
        Err(error) => ParseOutput {
            ast: None,
            errors: vec![error],
        },
    }
}
