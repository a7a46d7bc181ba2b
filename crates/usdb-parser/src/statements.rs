//! Statement parsing
//!
//! Dispatches on the leading keyword; anything starting with an identifier
//! is an assignment when `<-` follows the target, otherwise a procedure call.

use usdb_ast::*;
use usdb_lexer::TokenKind;

use crate::{ParseError, Parser};

impl Parser {
    /// Statements up to (not including) END, ELSE, CASE, DEFAULT or end of file
    pub(crate) fn parse_statement_list(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            if self.peek().ends_statement_list() {
                return Ok(statements);
            }
            statements.push(self.parse_statement()?);
        }
    }

    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek() {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Scan => self.parse_scan(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Begin => self.parse_block(),
            TokenKind::Ident => self.parse_assignment_or_call(),
            _ => Err(ParseError::InvalidStatement {
                found: crate::error::describe_token(self.current()),
                span: self.span(),
            }),
        }
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        self.consume(TokenKind::If)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Then)?;
        let then_branch = Box::new(self.parse_statement()?);

        // Tolerate `stmt; ELSE`
        if self.at(TokenKind::Semicolon) && self.peek_ahead(1) == TokenKind::Else {
            self.advance();
        }
        let else_branch = if self.at(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::new(
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            },
            self.finish(start),
        ))
    }

    fn parse_while(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        self.consume(TokenKind::While)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::new(
            StatementKind::While { condition, body },
            self.finish(start),
        ))
    }

    fn parse_do_while(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        self.skip_semicolons();
        self.consume(TokenKind::While)?;
        let condition = self.parse_expression()?;
        Ok(Statement::new(
            StatementKind::DoWhile { body, condition },
            self.finish(start),
        ))
    }

    /// `FOR i <- a TO b [STEP s] DO stmt`. The step is never inferred:
    /// without STEP the loop counts up by one even when `a > b`.
    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        self.consume(TokenKind::For)?;
        let variable = self.consume_ident()?;
        self.consume(TokenKind::Assign)?;
        let from = self.parse_expression()?;
        self.consume(TokenKind::To)?;
        let to = self.parse_expression()?;
        let step = if self.at(TokenKind::Step) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::new(
            StatementKind::For {
                variable,
                start: from,
                end: to,
                step,
                body,
            },
            self.finish(start),
        ))
    }

    /// `SWITCH e OF CASE v1, v2 : stmts ... DEFAULT : stmts END`
    fn parse_switch(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Switch)?;
        let expression = self.parse_expression()?;
        self.consume(TokenKind::Of)?;
        self.skip_semicolons();

        let mut cases = Vec::new();
        while self.at(TokenKind::Case) {
            let case_start = self.span();
            self.advance();
            let values = self.parse_expression_list()?;
            self.consume(TokenKind::Colon)?;
            let body = self.parse_statement_list()?;
            cases.push(CaseClause {
                values,
                body,
                span: self.finish(case_start),
            });
        }

        let default_case = if self.at(TokenKind::Default) {
            self.advance();
            self.consume(TokenKind::Colon)?;
            Some(self.parse_statement_list()?)
        } else {
            None
        };

        self.consume(TokenKind::End)?;

        Ok(Statement::new(
            StatementKind::Switch {
                expression,
                cases,
                default_case,
            },
            self.finish(start),
        ))
    }

    /// `RETURN [expr]`; a value must start on the same line as RETURN
    fn parse_return(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        let keyword = self.consume(TokenKind::Return)?;
        let has_value = !self.peek().ends_statement_list()
            && !self.at(TokenKind::Semicolon)
            && self.current().location.line == keyword.location.line;
        let value = if has_value {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Statement::new(
            StatementKind::Return { value },
            self.finish(start),
        ))
    }

    fn parse_scan(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Scan)?;
        self.consume(TokenKind::LParen)?;
        let mut targets = vec![self.parse_lvalue()?];
        while self.at(TokenKind::Comma) {
            self.advance();
            targets.push(self.parse_lvalue()?);
        }
        self.consume(TokenKind::RParen)?;
        Ok(Statement::new(
            StatementKind::Scan { targets },
            self.finish(start),
        ))
    }

    fn parse_print(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Print)?;
        self.consume(TokenKind::LParen)?;
        let expressions = if self.at(TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_expression_list()?
        };
        self.consume(TokenKind::RParen)?;
        Ok(Statement::new(
            StatementKind::Print { expressions },
            self.finish(start),
        ))
    }

    fn parse_block(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Begin)?;
        let statements = self.parse_statement_list()?;
        self.consume(TokenKind::End)?;
        Ok(Statement::new(
            StatementKind::Block { statements },
            self.finish(start),
        ))
    }

    fn parse_assignment_or_call(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        let target = self.parse_lvalue()?;

        if self.at(TokenKind::Assign) {
            self.advance();
            let value = self.parse_expression()?;
            return Ok(Statement::new(
                StatementKind::Assignment { target, value },
                self.finish(start),
            ));
        }

        if !target.is_plain() {
            return Err(ParseError::unexpected(TokenKind::Assign.describe(), self.current()));
        }

        let arguments = if self.at(TokenKind::LParen) {
            self.advance();
            let arguments = if self.at(TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_expression_list()?
            };
            self.consume(TokenKind::RParen)?;
            arguments
        } else {
            Vec::new()
        };

        Ok(Statement::new(
            StatementKind::Call {
                name: target.name,
                arguments,
            },
            self.finish(start),
        ))
    }

    /// Identifier followed by any mix of `[indices]` and `.field`
    pub(crate) fn parse_lvalue(&mut self) -> Result<LValue, ParseError> {
        let start = self.span();
        let name = self.consume_ident()?;
        let mut accessors = Vec::new();

        loop {
            match self.peek() {
                TokenKind::LBracket => {
                    self.advance();
                    let indices = self.parse_expression_list()?;
                    self.consume(TokenKind::RBracket)?;
                    accessors.push(Accessor::Index(indices));
                }
                TokenKind::Dot if self.peek_ahead(1) == TokenKind::Ident => {
                    self.advance();
                    accessors.push(Accessor::Field(self.consume_ident()?));
                }
                _ => break,
            }
        }

        Ok(LValue {
            name,
            accessors,
            span: self.finish(start),
        })
    }
}
