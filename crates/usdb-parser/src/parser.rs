//! Recursive descent parser implementation
//!
//! Program structure and declarations live here; statements and expressions
//! are in their own modules as further `impl Parser` blocks.

use usdb_ast::*;
use usdb_lexer::{Token, TokenKind};

use crate::ParseError;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// An `Eof` token is appended if the stream lacks one
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                value: String::new(),
                location: end,
                span: Span::at(end),
            });
        }
        Self { tokens, pos: 0 }
    }

    // === Utilities ===

    pub(crate) fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    pub(crate) fn peek(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    pub(crate) fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek())
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(kind.describe(), self.current()))
        }
    }

    pub(crate) fn consume_ident(&mut self) -> Result<String, ParseError> {
        Ok(self.consume(TokenKind::Ident)?.value)
    }

    /// Span of the current token
    pub(crate) fn span(&self) -> Span {
        self.current().span
    }

    /// Span from `start` through the last consumed token
    pub(crate) fn finish(&self, start: Span) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(previous) if previous.span.end >= start.start => start.merge(previous.span),
            _ => start,
        }
    }

    pub(crate) fn skip_semicolons(&mut self) {
        while self.at(TokenKind::Semicolon) {
            self.advance();
        }
    }

    // === Program ===

    /// `ALGORITHM name sections routines BEGIN stmts END.`
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Algorithm)?;
        let name = self.consume_ident()?;
        self.skip_semicolons();

        let mut constants = Vec::new();
        let mut types = Vec::new();
        let mut variables = Vec::new();
        self.parse_sections(&mut constants, &mut types, &mut variables)?;

        let mut functions = Vec::new();
        let mut procedures = Vec::new();
        loop {
            match self.peek() {
                TokenKind::Function => functions.push(self.parse_function()?),
                TokenKind::Procedure => procedures.push(self.parse_procedure()?),
                _ => break,
            }
        }

        if !self.at(TokenKind::Begin) {
            return Err(ParseError::unexpected(
                "'BEGIN', 'CONST', 'TYPE', 'VAR', 'FUNCTION' or 'PROCEDURE'",
                self.current(),
            ));
        }
        self.advance();
        let body = self.parse_statement_list()?;
        self.consume(TokenKind::End)?;
        self.consume(TokenKind::Dot)?;
        self.skip_semicolons();

        if !self.at(TokenKind::Eof) {
            return Err(ParseError::unexpected("end of file after 'END.'", self.current()));
        }

        log::trace!(
            "parsed program '{}': {} functions, {} procedures, {} statements",
            name,
            functions.len(),
            procedures.len(),
            body.len()
        );

        Ok(Program {
            name,
            constants,
            types,
            variables,
            functions,
            procedures,
            body,
            span: self.finish(start),
        })
    }

    // === Declaration sections ===

    /// Any number of CONST / TYPE / VAR sections, in any order
    fn parse_sections(
        &mut self,
        constants: &mut Vec<ConstDeclaration>,
        types: &mut Vec<TypeDeclaration>,
        variables: &mut Vec<VarDeclaration>,
    ) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                TokenKind::Const => {
                    self.advance();
                    self.expect_section_entry()?;
                    while self.at(TokenKind::Ident) {
                        constants.push(self.parse_const_declaration()?);
                        self.skip_semicolons();
                    }
                }
                TokenKind::Type => {
                    self.advance();
                    self.expect_section_entry()?;
                    while self.at(TokenKind::Ident) {
                        types.push(self.parse_type_declaration()?);
                        self.skip_semicolons();
                    }
                }
                TokenKind::Var => {
                    self.advance();
                    self.expect_section_entry()?;
                    while self.at(TokenKind::Ident) {
                        variables.push(self.parse_var_declaration()?);
                        self.skip_semicolons();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect_section_entry(&self) -> Result<(), ParseError> {
        if self.at(TokenKind::Ident) {
            Ok(())
        } else {
            Err(ParseError::unexpected("identifier", self.current()))
        }
    }

    /// `N = 10`, `PI = 3.14`, `NEG = -1`, `GREETING = "hi"`
    fn parse_const_declaration(&mut self) -> Result<ConstDeclaration, ParseError> {
        let start = self.span();
        let name = self.consume_ident()?;
        self.consume(TokenKind::Eq)?;

        let negative = if self.at(TokenKind::Minus) {
            self.advance();
            true
        } else {
            false
        };

        let token = self.advance();
        let value = match (token.kind, negative) {
            (TokenKind::IntegerLiteral, _) => {
                let v = parse_integer(&token)?;
                Literal::Integer(if negative { -v } else { v })
            }
            (TokenKind::RealLiteral, _) => {
                let v = parse_real(&token)?;
                Literal::Real(if negative { -v } else { v })
            }
            (TokenKind::StringLiteral, false) => Literal::String(token.value.clone()),
            (TokenKind::CharLiteral, false) => {
                Literal::Char(token.value.chars().next().unwrap_or('\0'))
            }
            (TokenKind::True, false) => Literal::Boolean(true),
            (TokenKind::False, false) => Literal::Boolean(false),
            _ => {
                return Err(ParseError::InvalidConstant {
                    found: crate::error::describe_token(&token),
                    span: token.span,
                })
            }
        };

        Ok(ConstDeclaration {
            name,
            value,
            span: self.finish(start),
        })
    }

    /// `Point = STRUCTURE ... END`
    fn parse_type_declaration(&mut self) -> Result<TypeDeclaration, ParseError> {
        let start = self.span();
        let name = self.consume_ident()?;
        self.consume(TokenKind::Eq)?;
        let definition = self.parse_type()?;
        Ok(TypeDeclaration {
            name,
            definition,
            span: self.finish(start),
        })
    }

    /// `a, b, c : INTEGER`
    fn parse_var_declaration(&mut self) -> Result<VarDeclaration, ParseError> {
        let start = self.span();
        let names = self.parse_ident_list()?;
        self.consume(TokenKind::Colon)?;
        let var_type = self.parse_type()?;
        Ok(VarDeclaration {
            names,
            var_type,
            span: self.finish(start),
        })
    }

    pub(crate) fn parse_ident_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = vec![self.consume_ident()?];
        while self.at(TokenKind::Comma) && self.peek_ahead(1) == TokenKind::Ident {
            self.advance();
            names.push(self.consume_ident()?);
        }
        Ok(names)
    }

    // === Types ===

    pub(crate) fn parse_type(&mut self) -> Result<TypeExpression, ParseError> {
        let primitive = match self.peek() {
            TokenKind::Integer => Some(PrimitiveType::Integer),
            TokenKind::Real => Some(PrimitiveType::Real),
            TokenKind::Boolean => Some(PrimitiveType::Boolean),
            TokenKind::Char => Some(PrimitiveType::Char),
            TokenKind::String => Some(PrimitiveType::String),
            _ => None,
        };
        if let Some(primitive) = primitive {
            self.advance();
            return Ok(TypeExpression::Primitive(primitive));
        }

        match self.peek() {
            TokenKind::Array => {
                self.advance();
                self.consume(TokenKind::LBracket)?;
                let dimensions = self.parse_expression_list()?;
                self.consume(TokenKind::RBracket)?;
                self.consume(TokenKind::Of)?;
                let element_type = self.parse_type()?;
                Ok(TypeExpression::Array {
                    dimensions,
                    element_type: Box::new(element_type),
                })
            }
            TokenKind::Structure => {
                let start = self.span();
                self.advance();
                self.skip_semicolons();
                let mut fields = Vec::new();
                while self.at(TokenKind::Ident) {
                    fields.push(self.parse_var_declaration()?);
                    self.skip_semicolons();
                }
                if fields.is_empty() {
                    return Err(ParseError::InvalidType {
                        message: "a STRUCTURE needs at least one field".to_string(),
                        span: self.finish(start),
                    });
                }
                self.consume(TokenKind::End)?;
                Ok(TypeExpression::Structure { fields })
            }
            TokenKind::LParen => {
                self.advance();
                let values = self.parse_ident_list()?;
                self.consume(TokenKind::RParen)?;
                Ok(TypeExpression::Enumeration { values })
            }
            TokenKind::Ident => {
                let name = self.consume_ident()?;
                Ok(TypeExpression::Reference { name })
            }
            _ => Err(ParseError::unexpected("a type", self.current())),
        }
    }

    // === Routines ===

    /// `FUNCTION name(params) : type sections BEGIN stmts END`
    fn parse_function(&mut self) -> Result<FunctionDeclaration, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Function)?;
        let name = self.consume_ident()?;
        self.consume(TokenKind::LParen)?;
        let parameters = self.parse_parameters()?;
        self.consume(TokenKind::RParen)?;
        self.consume(TokenKind::Colon)?;
        let return_type = self.parse_type()?;
        self.skip_semicolons();

        let mut constants = Vec::new();
        let mut types = Vec::new();
        let mut variables = Vec::new();
        self.parse_sections(&mut constants, &mut types, &mut variables)?;
        let body = self.parse_routine_body()?;

        Ok(FunctionDeclaration {
            name,
            parameters,
            return_type,
            constants,
            types,
            variables,
            body,
            span: self.finish(start),
        })
    }

    /// `PROCEDURE name[(params)] sections BEGIN stmts END`
    fn parse_procedure(&mut self) -> Result<ProcedureDeclaration, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Procedure)?;
        let name = self.consume_ident()?;
        let parameters = if self.at(TokenKind::LParen) {
            self.advance();
            let parameters = self.parse_parameters()?;
            self.consume(TokenKind::RParen)?;
            parameters
        } else {
            Vec::new()
        };
        self.skip_semicolons();

        let mut constants = Vec::new();
        let mut types = Vec::new();
        let mut variables = Vec::new();
        self.parse_sections(&mut constants, &mut types, &mut variables)?;
        let body = self.parse_routine_body()?;

        Ok(ProcedureDeclaration {
            name,
            parameters,
            constants,
            types,
            variables,
            body,
            span: self.finish(start),
        })
    }

    fn parse_routine_body(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.consume(TokenKind::Begin)?;
        let body = self.parse_statement_list()?;
        self.consume(TokenKind::End)?;
        self.skip_semicolons();
        Ok(body)
    }

    /// `[VAR] a, b : T` groups separated by `,` or `;`
    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParseError> {
        let mut parameters = Vec::new();
        if self.at(TokenKind::RParen) {
            return Ok(parameters);
        }

        loop {
            let start = self.span();
            let by_reference = if self.at(TokenKind::Var) {
                self.advance();
                true
            } else {
                false
            };
            let names = self.parse_ident_list()?;
            self.consume(TokenKind::Colon)?;
            let param_type = self.parse_type()?;
            let span = self.finish(start);

            for name in names {
                parameters.push(Parameter {
                    name,
                    param_type: param_type.clone(),
                    by_reference,
                    span,
                });
            }

            if self.at_any(&[TokenKind::Comma, TokenKind::Semicolon]) {
                self.advance();
            } else {
                break;
            }
        }

        Ok(parameters)
    }
}

pub(crate) fn parse_integer(token: &Token) -> Result<i64, ParseError> {
    token.value.parse().map_err(|_| ParseError::InvalidConstant {
        found: token.value.clone(),
        span: token.span,
    })
}

pub(crate) fn parse_real(token: &Token) -> Result<f64, ParseError> {
    token.value.parse().map_err(|_| ParseError::InvalidConstant {
        found: token.value.clone(),
        span: token.span,
    })
}
