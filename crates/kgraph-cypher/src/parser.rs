//! Parser for the Cypher subset.
//!
//! Parses a stream of tokens into an AST.

use crate::ast::*;
use crate::lexer::{LexError, Token, tokenize, unescape};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Lexer error
    #[error("Lexer error: {0}")]
    LexError(#[from] LexError),

    /// Unexpected token
    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input
    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    /// Missing required clause
    #[error("Missing required clause: {0}")]
    MissingClause(String),

    /// Invalid pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

// =============================================================================
// Parser State
// =============================================================================

/// Parser state holding the token stream and current position.
struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    /// Returns the token `offset` positions ahead.
    fn peek_at(&self, offset: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + offset)
    }

    /// Returns the current token and advances the position.
    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                position: self.pos,
                expected: expected.into(),
                found: format!("{:?}", token),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.into(),
            },
        }
    }

    /// Expects a specific token, returns error if not found.
    fn expect(&mut self, expected: &Token<'_>) -> Result<(), ParseError> {
        if self.match_token(expected) {
            Ok(())
        } else {
            Err(self.unexpected(format!("{:?}", expected)))
        }
    }

    /// Checks if current token matches, consuming it if so.
    fn match_token(&mut self, expected: &Token<'_>) -> bool {
        match self.peek() {
            Some(token) if std::mem::discriminant(token) == std::mem::discriminant(expected) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Consumes the keyword if it is next.
    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    /// Parses an identifier (bare or backtick-quoted).
    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Ident(s)) | Some(Token::QuotedIdent(s)) => {
                let s = s.to_string();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn at_identifier(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident(_)) | Some(Token::QuotedIdent(_)))
    }

    // =========================================================================
    // Clauses
    // =========================================================================

    fn parse_query(&mut self) -> Result<Query, ParseError> {
        if !self.match_keyword("MATCH") {
            return Err(ParseError::MissingClause("MATCH".into()));
        }
        let pattern = self.parse_pattern()?;

        let where_clause = if self.match_keyword("WHERE") {
            Some(self.parse_expression()?)
        } else {
            None
        };

        if !self.match_keyword("RETURN") {
            return Err(ParseError::MissingClause("RETURN".into()));
        }
        let return_clause = self.parse_return()?;

        let mut order_by = Vec::new();
        if self.match_keyword("ORDER") {
            self.expect_keyword("BY")?;
            loop {
                let expression = self.parse_expression()?;
                let direction = if self.match_keyword("DESC") || self.match_keyword("DESCENDING") {
                    SortDirection::Descending
                } else {
                    // ASC is the default; consume it if spelled out
                    let _ = self.match_keyword("ASC") || self.match_keyword("ASCENDING");
                    SortDirection::Ascending
                };
                order_by.push(OrderByItem {
                    expression,
                    direction,
                });
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }

        let skip = if self.match_keyword("SKIP") {
            Some(self.parse_count()?)
        } else {
            None
        };
        let limit = if self.match_keyword("LIMIT") {
            Some(self.parse_count()?)
        } else {
            None
        };

        Ok(Query {
            pattern,
            where_clause,
            return_clause,
            order_by,
            skip,
            limit,
        })
    }

    fn parse_count(&mut self) -> Result<usize, ParseError> {
        match self.peek() {
            Some(Token::Integer(n)) if *n >= 0 => {
                let n = *n as usize;
                self.pos += 1;
                Ok(n)
            }
            _ => Err(self.unexpected("non-negative integer")),
        }
    }

    fn parse_return(&mut self) -> Result<ReturnClause, ParseError> {
        let distinct = self.match_keyword("DISTINCT");
        let mut items = Vec::new();
        loop {
            let expression = self.parse_expression()?;
            let alias = if self.match_keyword("AS") {
                Some(self.parse_identifier()?)
            } else {
                None
            };
            items.push(ReturnItem { expression, alias });
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        Ok(ReturnClause { distinct, items })
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        let left = self.parse_node()?;
        if !matches!(self.peek(), Some(Token::Dash) | Some(Token::ArrowLeft)) {
            return Ok(Pattern::Node(left));
        }

        let incoming = if self.match_token(&Token::ArrowLeft) {
            true
        } else {
            self.expect(&Token::Dash)?;
            false
        };

        let mut relationship = if matches!(self.peek(), Some(Token::LBracket)) {
            self.parse_relationship_detail()?
        } else {
            RelPattern {
                variable: None,
                types: Vec::new(),
                properties: Vec::new(),
                direction: Direction::Both,
            }
        };

        let outgoing = if self.match_token(&Token::ArrowRight) {
            true
        } else {
            self.expect(&Token::Dash)?;
            false
        };

        relationship.direction = match (incoming, outgoing) {
            (false, true) => Direction::Outgoing,
            (true, false) => Direction::Incoming,
            (false, false) => Direction::Both,
            (true, true) => {
                return Err(ParseError::InvalidPattern(
                    "relationship cannot point both ways".into(),
                ));
            }
        };

        let right = self.parse_node()?;
        if matches!(self.peek(), Some(Token::Dash) | Some(Token::ArrowLeft)) {
            return Err(ParseError::InvalidPattern(
                "only single-hop patterns are supported".into(),
            ));
        }

        Ok(Pattern::Path {
            left,
            relationship,
            right,
        })
    }

    fn parse_node(&mut self) -> Result<NodePattern, ParseError> {
        self.expect(&Token::LParen)?;
        let mut node = NodePattern::default();
        if self.at_identifier() {
            node.variable = Some(self.parse_identifier()?);
        }
        while self.match_token(&Token::Colon) {
            node.labels.push(self.parse_identifier()?);
        }
        if matches!(self.peek(), Some(Token::LBrace)) {
            node.properties = self.parse_property_map()?;
        }
        self.expect(&Token::RParen)?;
        Ok(node)
    }

    fn parse_relationship_detail(&mut self) -> Result<RelPattern, ParseError> {
        self.expect(&Token::LBracket)?;
        let variable = if self.at_identifier() {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        let mut types = Vec::new();
        if self.match_token(&Token::Colon) {
            types.push(self.parse_identifier()?);
            while self.match_token(&Token::Pipe) {
                // `:A|:B` and `:A|B` are both accepted
                self.match_token(&Token::Colon);
                types.push(self.parse_identifier()?);
            }
        }

        let properties = if matches!(self.peek(), Some(Token::LBrace)) {
            self.parse_property_map()?
        } else {
            Vec::new()
        };
        self.expect(&Token::RBracket)?;

        Ok(RelPattern {
            variable,
            types,
            properties,
            direction: Direction::Both,
        })
    }

    fn parse_property_map(&mut self) -> Result<Vec<(String, Expression)>, ParseError> {
        self.expect(&Token::LBrace)?;
        let mut properties = Vec::new();
        if self.match_token(&Token::RBrace) {
            return Ok(properties);
        }
        loop {
            let key = self.parse_identifier()?;
            self.expect(&Token::Colon)?;
            let value = self.parse_primary()?;
            properties.push((key, value));
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(properties)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;
        while self.match_keyword("OR") {
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_not()?;
        while self.match_keyword("AND") {
            let right = self.parse_not()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expression, ParseError> {
        if self.match_keyword("NOT") {
            let inner = self.parse_not()?;
            return Ok(Expression::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_primary()?;

        if self.match_keyword("IS") {
            let negated = self.match_keyword("NOT");
            self.expect_keyword("NULL")?;
            return Ok(Expression::IsNull {
                expr: Box::new(left),
                negated,
            });
        }

        let op = match self.peek() {
            Some(Token::Eq) => Some(ComparisonOp::Eq),
            Some(Token::Neq) => Some(ComparisonOp::Neq),
            Some(Token::Lt) => Some(ComparisonOp::Lt),
            Some(Token::Le) => Some(ComparisonOp::Le),
            Some(Token::Gt) => Some(ComparisonOp::Gt),
            Some(Token::Ge) => Some(ComparisonOp::Ge),
            _ => None,
        };
        let op = match op {
            Some(op) => {
                self.pos += 1;
                op
            }
            None if self.match_keyword("CONTAINS") => ComparisonOp::Contains,
            None if self.match_keyword("IN") => ComparisonOp::In,
            None if self.match_keyword("STARTS") => {
                self.expect_keyword("WITH")?;
                ComparisonOp::StartsWith
            }
            None if self.match_keyword("ENDS") => {
                self.expect_keyword("WITH")?;
                ComparisonOp::EndsWith
            }
            None => return Ok(left),
        };

        let right = self.parse_primary()?;
        Ok(Expression::Comparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let Some(token) = self.next() else {
            return Err(ParseError::UnexpectedEof {
                expected: "expression".into(),
            });
        };

        match token {
            Token::Integer(i) => Ok(Expression::Literal(Literal::Int(i))),
            Token::Float(x) => Ok(Expression::Literal(Literal::Float(x))),
            Token::String(s) => Ok(Expression::Literal(Literal::String(unescape(s)))),
            Token::Parameter(name) => Ok(Expression::Parameter(name.to_string())),
            Token::Dash => match self.next() {
                Some(Token::Integer(i)) => Ok(Expression::Literal(Literal::Int(-i))),
                Some(Token::Float(x)) => Ok(Expression::Literal(Literal::Float(-x))),
                _ => {
                    self.pos -= 1;
                    Err(self.unexpected("number after '-'"))
                }
            },
            Token::LParen => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.match_token(&Token::RBracket) {
                    loop {
                        items.push(self.parse_expression()?);
                        if !self.match_token(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect(&Token::RBracket)?;
                }
                Ok(Expression::List(items))
            }
            Token::Ident(word) if word.eq_ignore_ascii_case("true") => {
                Ok(Expression::Literal(Literal::Bool(true)))
            }
            Token::Ident(word) if word.eq_ignore_ascii_case("false") => {
                Ok(Expression::Literal(Literal::Bool(false)))
            }
            Token::Ident(word) if word.eq_ignore_ascii_case("null") => {
                Ok(Expression::Literal(Literal::Null))
            }
            Token::Ident(name) | Token::QuotedIdent(name) => {
                let name = name.to_string();
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if !self.match_token(&Token::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.match_token(&Token::Comma) {
                                break;
                            }
                        }
                        self.expect(&Token::RParen)?;
                    }
                    return Ok(Expression::Function { name, args });
                }
                if matches!(self.peek(), Some(Token::Dot))
                    && matches!(self.peek_at(1), Some(Token::Ident(_)) | Some(Token::QuotedIdent(_)))
                {
                    self.pos += 1;
                    let property = self.parse_identifier()?;
                    return Ok(Expression::Property {
                        variable: name,
                        property,
                    });
                }
                Ok(Expression::Variable(name))
            }
            other => {
                self.pos -= 1;
                Err(ParseError::UnexpectedToken {
                    position: self.pos,
                    expected: "expression".into(),
                    found: format!("{:?}", other),
                })
            }
        }
    }
}

/// Parses a read query.
pub fn parse_query(input: &str) -> Result<Query, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let query = parser.parse_query()?;
    if parser.peek().is_some() {
        return Err(parser.unexpected("end of query"));
    }
    Ok(query)
}
