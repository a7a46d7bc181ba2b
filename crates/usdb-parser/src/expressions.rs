//! Expression parsing by precedence climbing
//!
//! Low to high: OR, AND, relational, additive, multiplicative, power
//! (right associative), unary, postfix primary.

use usdb_ast::*;
use usdb_lexer::TokenKind;

use crate::parser::{parse_integer, parse_real};
use crate::{ParseError, Parser};

impl Parser {
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_or()
    }

    pub(crate) fn parse_expression_list(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut expressions = vec![self.parse_expression()?];
        while self.at(TokenKind::Comma) {
            self.advance();
            expressions.push(self.parse_expression()?);
        }
        Ok(expressions)
    }

    fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
        let span = left.span.merge(right.span);
        Expression::new(
            ExpressionKind::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;
        while self.at(TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Self::binary(left, BinaryOperator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_relational()?;
        while self.at(TokenKind::And) {
            self.advance();
            let right = self.parse_relational()?;
            left = Self::binary(left, BinaryOperator::And, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let operator = match self.peek() {
                TokenKind::Eq => BinaryOperator::Eq,
                TokenKind::NotEq => BinaryOperator::NotEq,
                TokenKind::Lt => BinaryOperator::Lt,
                TokenKind::Le => BinaryOperator::Le,
                TokenKind::Gt => BinaryOperator::Gt,
                TokenKind::Ge => BinaryOperator::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Self::binary(left, operator, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = match self.peek() {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(left, operator, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_power()?;
        loop {
            let operator = match self.peek() {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Div => BinaryOperator::IntDiv,
                TokenKind::Mod => BinaryOperator::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_power()?;
            left = Self::binary(left, operator, right);
        }
    }

    fn parse_power(&mut self) -> Result<Expression, ParseError> {
        let base = self.parse_unary()?;
        if self.at(TokenKind::Caret) {
            self.advance();
            let exponent = self.parse_power()?;
            return Ok(Self::binary(base, BinaryOperator::Pow, exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let operator = match self.peek() {
            TokenKind::Minus => UnaryOperator::Neg,
            TokenKind::Not => UnaryOperator::Not,
            _ => return self.parse_primary(),
        };
        let start = self.span();
        self.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Ok(Expression::new(
            ExpressionKind::Unary {
                operator,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let start = self.span();
        let kind = match self.peek() {
            TokenKind::IntegerLiteral => ExpressionKind::Integer(parse_integer(&self.advance())?),
            TokenKind::RealLiteral => ExpressionKind::Real(parse_real(&self.advance())?),
            TokenKind::StringLiteral => ExpressionKind::String(self.advance().value),
            TokenKind::CharLiteral => {
                ExpressionKind::Char(self.advance().value.chars().next().unwrap_or('\0'))
            }
            TokenKind::True => {
                self.advance();
                ExpressionKind::Boolean(true)
            }
            TokenKind::False => {
                self.advance();
                ExpressionKind::Boolean(false)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                ExpressionKind::Paren(Box::new(inner))
            }
            TokenKind::Ident => return self.parse_postfix(),
            _ => return Err(ParseError::unexpected("an expression", self.current())),
        };
        Ok(Expression::new(kind, self.finish(start)))
    }

    /// Identifier followed by indexing, field access and calls, in any order
    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let start = self.span();
        let name = self.consume_ident()?;
        let mut expr = Expression::new(ExpressionKind::Identifier(name), self.finish(start));

        loop {
            let kind = match self.peek() {
                TokenKind::LBracket => {
                    self.advance();
                    let indices = self.parse_expression_list()?;
                    self.consume(TokenKind::RBracket)?;
                    ExpressionKind::ArrayAccess {
                        array: Box::new(expr),
                        indices,
                    }
                }
                TokenKind::Dot if self.peek_ahead(1) == TokenKind::Ident => {
                    self.advance();
                    let field = self.consume_ident()?;
                    ExpressionKind::FieldAccess {
                        object: Box::new(expr),
                        field,
                    }
                }
                TokenKind::LParen => {
                    let name = match &expr.kind {
                        ExpressionKind::Identifier(name) => name.clone(),
                        _ => break,
                    };
                    self.advance();
                    let arguments = if self.at(TokenKind::RParen) {
                        Vec::new()
                    } else {
                        self.parse_expression_list()?
                    };
                    self.consume(TokenKind::RParen)?;
                    ExpressionKind::FunctionCall { name, arguments }
                }
                _ => break,
            };
            expr = Expression::new(kind, self.finish(start));
        }

        Ok(expr)
    }
}
