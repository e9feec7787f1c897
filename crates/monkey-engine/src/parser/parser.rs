//! The main parser implementation.

use crate::ast::*;
use crate::error::{ParseError, ParseErrors};
use crate::lexer::{Scanner, Span, Token, TokenKind};

/// Operator binding power, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    /// `==` `!=`
    Equals,
    /// `<` `>`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/`
    Product,
    /// `-x` `!x`
    Prefix,
    /// `f(x)`
    Call,
    /// `a[i]`
    Index,
}

fn precedence_of(kind: &TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// A Pratt parser for Monkey.
///
/// The parser keeps going after a syntax error: it records the error, skips
/// to the end of the offending statement and continues, so one call reports
/// every independent error in the input.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        let peek = scanner.next_token();
        Self {
            scanner,
            current,
            peek,
            errors: Vec::new(),
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program, ParseErrors> {
        let mut statements = Vec::new();

        while self.current.kind != TokenKind::Eof {
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                }
            }
            self.advance();
        }

        if self.errors.is_empty() {
            Ok(Program { statements })
        } else {
            Err(ParseErrors(std::mem::take(&mut self.errors)))
        }
    }

    /// Parses a single statement starting at the current token.
    ///
    /// On return the current token is the last token of the statement.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.current.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Skips to the end of the current statement after an error.
    fn synchronize(&mut self) {
        while self.current.kind != TokenKind::Semicolon && self.current.kind != TokenKind::Eof {
            self.advance();
        }
    }

    fn advance(&mut self) {
        let next = self.scanner.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn peek_is(&self, kind: &TokenKind) -> bool {
        self.peek.kind.same_variant(kind)
    }

    fn expect_peek(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.peek_is(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected_peek(kind.to_string()))
        }
    }

    fn unexpected_peek(&self, expected: String) -> ParseError {
        ParseError::UnexpectedToken {
            expected,
            found: self.peek.kind.clone(),
            span: self.peek.span,
        }
    }

    fn expect_peek_identifier(&mut self) -> Result<Identifier, ParseError> {
        if let TokenKind::Identifier(name) = &self.peek.kind {
            let ident = Identifier::new(name.clone());
            self.advance();
            Ok(ident)
        } else {
            Err(self.unexpected_peek("IDENT".to_string()))
        }
    }

    fn skip_optional_semicolon(&mut self) {
        if self.peek_is(&TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn parse_let_statement(&mut self) -> Result<Statement, ParseError> {
        let name = self.expect_peek_identifier()?;
        self.expect_peek(&TokenKind::Assign)?;
        self.advance();

        let mut value = self.parse_expression(Precedence::Lowest)?;
        if let Expression::Function(func) = &mut value {
            func.name = Some(name.name.clone());
        }

        self.skip_optional_semicolon();
        Ok(Statement::Let(LetStatement { name, value }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance(); // consume 'return'
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Ok(Statement::Return(ReturnStatement { value }))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Ok(Statement::Expression(ExpressionStatement { expression }))
    }

    fn parse_block_statement(&mut self) -> Result<BlockStatement, ParseError> {
        self.advance(); // consume '{'
        let mut statements = Vec::new();

        while self.current.kind != TokenKind::RBrace {
            if self.current.kind == TokenKind::Eof {
                return Err(ParseError::UnexpectedToken {
                    expected: "}".to_string(),
                    found: TokenKind::Eof,
                    span: self.current.span,
                });
            }
            statements.push(self.parse_statement()?);
            self.advance();
        }

        Ok(BlockStatement { statements })
    }

    /// Parses an expression whose operators bind tighter than `precedence`.
    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression, ParseError> {
        let mut left = self.parse_prefix()?;

        while !self.peek_is(&TokenKind::Semicolon) && precedence < precedence_of(&self.peek.kind) {
            self.advance();
            left = match self.current.kind {
                TokenKind::LParen => self.parse_call(left)?,
                TokenKind::LBracket => self.parse_index(left)?,
                _ => self.parse_infix(left)?,
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => Ok(Expression::Identifier(Identifier::new(name.clone()))),
            TokenKind::Int(literal) => self.parse_integer(literal.clone(), self.current.span),
            TokenKind::String(value) => Ok(Expression::String(value.clone())),
            TokenKind::True => Ok(Expression::Boolean(true)),
            TokenKind::False => Ok(Expression::Boolean(false)),
            TokenKind::Bang | TokenKind::Minus => {
                let operator = self.current.kind.clone();
                self.advance();
                let right = self.parse_expression(Precedence::Prefix)?;
                Ok(Expression::Prefix(PrefixExpression {
                    operator,
                    right: Box::new(right),
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Function => self.parse_function_literal(),
            TokenKind::LBracket => {
                let elements = self.parse_expression_list(&TokenKind::RBracket)?;
                Ok(Expression::Array(ArrayLiteral { elements }))
            }
            TokenKind::LBrace => self.parse_hash_literal(),
            other => Err(ParseError::NoPrefixParse {
                token: other.clone(),
                span: self.current.span,
            }),
        }
    }

    fn parse_integer(&self, literal: String, span: Span) -> Result<Expression, ParseError> {
        literal
            .parse::<i64>()
            .map(Expression::Integer)
            .map_err(|_| ParseError::InvalidInteger { literal, span })
    }

    fn parse_infix(&mut self, left: Expression) -> Result<Expression, ParseError> {
        let operator = self.current.kind.clone();
        let precedence = precedence_of(&operator);
        self.advance();
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Infix(InfixExpression {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_call(&mut self, function: Expression) -> Result<Expression, ParseError> {
        let arguments = self.parse_expression_list(&TokenKind::RParen)?;
        Ok(Expression::Call(CallExpression {
            function: Box::new(function),
            arguments,
        }))
    }

    fn parse_index(&mut self, left: Expression) -> Result<Expression, ParseError> {
        self.advance(); // consume '['
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(&TokenKind::RBracket)?;
        Ok(Expression::Index(IndexExpression {
            left: Box::new(left),
            index: Box::new(index),
        }))
    }

    fn parse_if(&mut self) -> Result<Expression, ParseError> {
        self.expect_peek(&TokenKind::LParen)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(&TokenKind::RParen)?;
        self.expect_peek(&TokenKind::LBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_is(&TokenKind::Else) {
            self.advance();
            self.expect_peek(&TokenKind::LBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(Expression::If(IfExpression {
            condition: Box::new(condition),
            consequence,
            alternative,
        }))
    }

    fn parse_function_literal(&mut self) -> Result<Expression, ParseError> {
        self.expect_peek(&TokenKind::LParen)?;
        let parameters = self.parse_parameters()?;
        self.expect_peek(&TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;
        Ok(Expression::Function(FunctionLiteral {
            name: None,
            parameters,
            body,
        }))
    }

    fn parse_parameters(&mut self) -> Result<Vec<Identifier>, ParseError> {
        let mut parameters = Vec::new();

        if self.peek_is(&TokenKind::RParen) {
            self.advance();
            return Ok(parameters);
        }

        parameters.push(self.expect_peek_identifier()?);
        while self.peek_is(&TokenKind::Comma) {
            self.advance();
            parameters.push(self.expect_peek_identifier()?);
        }

        self.expect_peek(&TokenKind::RParen)?;
        Ok(parameters)
    }

    /// Parses a comma-separated list; the current token is the opening
    /// delimiter and `end` the closing one.
    fn parse_expression_list(&mut self, end: &TokenKind) -> Result<Vec<Expression>, ParseError> {
        let mut list = Vec::new();

        if self.peek_is(end) {
            self.advance();
            return Ok(list);
        }

        self.advance();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(&TokenKind::Comma) {
            self.advance();
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(list)
    }

    fn parse_hash_literal(&mut self) -> Result<Expression, ParseError> {
        let mut pairs = Vec::new();

        while !self.peek_is(&TokenKind::RBrace) {
            self.advance();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(&TokenKind::Colon)?;
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek_is(&TokenKind::RBrace) {
                self.expect_peek(&TokenKind::Comma)?;
            }
        }

        self.expect_peek(&TokenKind::RBrace)?;
        Ok(Expression::Hash(HashLiteral { pairs }))
    }
}
