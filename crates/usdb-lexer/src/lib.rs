//! USDB Algo Lexer - Tokenization using logos
//!
//! Handles the Algo quirks:
//! - keywords are case-insensitive (`begin`, `Begin` and `BEGIN` agree)
//! - `<-` is assignment, `=` is equality, `<>` and `!=` are both inequality
//! - `{ ... }` is a comment, not a block
//!
//! Errors are collected rather than fatal: an invalid character is reported
//! and scanning resumes right after it.

mod error;
mod token;

pub use error::*;
pub use token::*;

use logos::Logos;
use usdb_ast::{LineIndex, Location, Span};

/// A token with its text and position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source spelling; unescaped content for string and char literals
    pub value: String,
    pub location: Location,
    pub span: Span,
}

/// Everything the lexer found in one source text
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexerError>,
}

impl LexOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Tokenize a source string. The token list always ends with `Eof`.
pub fn tokenize(source: &str) -> LexOutput {
    let index = LineIndex::new(source);
    let mut output = LexOutput::default();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = index.span(range.clone());
        let text = lexer.slice();

        let kind = match result {
            Ok(kind) => kind,
            Err(_) => {
                let c = text.chars().next().unwrap_or('\0');
                output
                    .errors
                    .push(LexerError::new(LexerErrorKind::UnexpectedCharacter(c), span));
                continue;
            }
        };

        match classify(kind, text) {
            Ok((kind, value)) => output.tokens.push(Token {
                kind,
                value,
                location: span.start,
                span,
            }),
            Err(error) => output.errors.push(LexerError::new(error, span)),
        }
    }

    let end = index.location(source.len());
    output.tokens.push(Token {
        kind: TokenKind::Eof,
        value: String::new(),
        location: end,
        span: Span::at(end),
    });

    output
}

/// Turn a raw logos match into a final token kind and value
fn classify(kind: TokenKind, text: &str) -> Result<(TokenKind, String), LexerErrorKind> {
    match kind {
        TokenKind::Ident => Ok((keyword(text).unwrap_or(TokenKind::Ident), text.to_string())),
        TokenKind::IntegerLiteral => {
            if text.parse::<i64>().is_err() {
                return Err(LexerErrorKind::IntegerOverflow(text.to_string()));
            }
            Ok((kind, text.to_string()))
        }
        TokenKind::StringLiteral => {
            let value = unescape(&text[1..text.len() - 1])?;
            Ok((kind, value))
        }
        TokenKind::CharLiteral => {
            let value = unescape(&text[1..text.len() - 1])?;
            if value.chars().count() != 1 {
                return Err(LexerErrorKind::InvalidCharLiteral);
            }
            Ok((kind, value))
        }
        TokenKind::UnterminatedString => Err(LexerErrorKind::UnterminatedString),
        TokenKind::UnterminatedChar => Err(LexerErrorKind::UnterminatedChar),
        TokenKind::UnterminatedComment => Err(LexerErrorKind::UnterminatedComment),
        _ => Ok((kind, text.to_string())),
    }
}

/// Resolve `\n \t \r \\ \" \'` escapes
fn unescape(raw: &str) -> Result<String, LexerErrorKind> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some(other) => return Err(LexerErrorKind::InvalidEscape(other)),
            None => return Err(LexerErrorKind::InvalidEscape(' ')),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keyword_table_is_sorted() {
        for pair in token::KEYWORDS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} should sort before {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn test_every_keyword_resolves() {
        for (word, kind) in token::KEYWORDS {
            assert_eq!(keyword(word), Some(*kind));
            assert_eq!(keyword(&word.to_uppercase()), Some(*kind));
            assert!(kind.is_keyword());
        }
        assert_eq!(keyword("counter"), None);
        assert!(is_reserved_word("Step"));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let output = tokenize("Begin BEGIN begin");
        assert!(output.tokens[..3].iter().all(|t| t.kind == TokenKind::Begin));
        assert_eq!(output.tokens[0].value, "Begin");
    }

    #[test]
    fn test_assignment_vs_comparison() {
        assert_eq!(
            kinds("x <- y <= z"),
            vec![
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Ident,
                TokenKind::Le,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds("a <> b")[1], TokenKind::NotEq);
        assert_eq!(kinds("a != b")[1], TokenKind::NotEq);
        assert_eq!(kinds("a >= b")[1], TokenKind::Ge);
    }

    #[test]
    fn test_up_arrow_is_power() {
        assert_eq!(kinds("2 ↑ 3")[1], TokenKind::Caret);
        assert_eq!(kinds("2 ^ 3")[1], TokenKind::Caret);
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "x // line\n{ brace\ncomment } y /* c */ z";
        assert_eq!(
            kinds(source),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_numbers() {
        let output = tokenize("42 3.14 7.");
        assert_eq!(output.tokens[0].kind, TokenKind::IntegerLiteral);
        assert_eq!(output.tokens[1].kind, TokenKind::RealLiteral);
        assert_eq!(output.tokens[1].value, "3.14");
        // A trailing dot is not part of the number
        assert_eq!(output.tokens[2].kind, TokenKind::IntegerLiteral);
        assert_eq!(output.tokens[3].kind, TokenKind::Dot);
    }

    #[test]
    fn test_string_escapes() {
        let output = tokenize(r#""a\tb\n\"q\"""#);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert_eq!(output.tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(output.tokens[0].value, "a\tb\n\"q\"");
    }

    #[test]
    fn test_char_literals() {
        let output = tokenize(r"'a' '\n'");
        assert!(output.errors.is_empty());
        assert_eq!(output.tokens[0].value, "a");
        assert_eq!(output.tokens[1].value, "\n");

        let output = tokenize("'ab'");
        assert_eq!(output.errors[0].kind, LexerErrorKind::InvalidCharLiteral);
    }

    #[test]
    fn test_unterminated_literals() {
        let output = tokenize("x <- \"abc\ny <- 1");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].kind, LexerErrorKind::UnterminatedString);
        assert_eq!(output.errors[0].location().line, 1);
        // Scanning continued on the next line
        assert!(output.tokens.iter().any(|t| t.value == "y"));

        let output = tokenize("c <- 'a");
        assert_eq!(output.errors[0].kind, LexerErrorKind::UnterminatedChar);

        let output = tokenize("x { never closed");
        assert_eq!(output.errors[0].kind, LexerErrorKind::UnterminatedComment);
    }

    #[test]
    fn test_invalid_characters_are_all_collected() {
        let output = tokenize("a @ b # c");
        assert_eq!(output.errors.len(), 2);
        assert_eq!(output.errors[0].kind, LexerErrorKind::UnexpectedCharacter('@'));
        assert_eq!(output.errors[0].location().column, 3);
        assert_eq!(output.errors[1].kind, LexerErrorKind::UnexpectedCharacter('#'));
        let idents = output.tokens.iter().filter(|t| t.kind == TokenKind::Ident).count();
        assert_eq!(idents, 3);
    }

    #[test]
    fn test_locations() {
        let output = tokenize("ALGORITHM T\n  BEGIN");
        assert_eq!(output.tokens[0].location, Location::new(1, 1, 0));
        assert_eq!(output.tokens[1].location, Location::new(1, 11, 10));
        assert_eq!(output.tokens[2].location, Location::new(2, 3, 14));
    }

    #[test]
    fn test_always_ends_with_eof() {
        let output = tokenize("   ");
        assert_eq!(output.tokens.len(), 1);
        assert_eq!(output.tokens[0].kind, TokenKind::Eof);
    }
}
