//! Compiles query text into a [`SelectorTree`].

use std::mem;

use regex::RegexBuilder;
use thiserror::Error;

use crate::{
    ast::{BinaryOperator, FilterExpr, NodeId, Selector, SelectorTree, Slice, Token, UnaryOperator},
    lexer::{LexError, Lexer, Position},
    value::Value,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{message} at position {position}")]
    Syntax { message: String, position: Position },
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    tree: SelectorTree,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            tree: SelectorTree::new(),
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::Syntax {
            message: message.into(),
            position: self.lexer.position(),
        })
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return self.error(format!("Expected {:?}, got {:?}", expected, self.current_token));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    /// Parse a complete query. It must start with `$` and consume all input.
    ///
    /// ```
    /// use jsonsift::{Lexer, Parser};
    ///
    /// let mut parser = Parser::new(Lexer::new("$.store..price")).unwrap();
    /// let tree = parser.parse().unwrap();
    /// assert_eq!(tree.len(), 4);
    /// ```
    pub fn parse(&mut self) -> Result<SelectorTree, ParseError> {
        if !self.check(&Token::Dollar) {
            return self.error(format!("A query must start with '$', got {:?}", self.current_token));
        }
        let head = self.parse_query()?;
        if !self.check(&Token::Eof) {
            return self.error(format!("Unexpected {:?} after end of query", self.current_token));
        }
        let mut tree = mem::take(&mut self.tree);
        tree.set_head(head);
        Ok(tree)
    }

    /// `$` or `@` followed by any number of segments. Returns the chain head.
    fn parse_query(&mut self) -> Result<NodeId, ParseError> {
        let start = match self.current_token {
            Token::Dollar => Selector::Root,
            Token::At => Selector::Current,
            _ => return self.error(format!("Expected '$' or '@', got {:?}", self.current_token)),
        };
        self.advance()?;

        let head = self.tree.push(start);
        let mut last = head;
        while let Some((first, end)) = self.parse_segment()? {
            self.tree.set_tail(last, first);
            last = end;
        }
        Ok(head)
    }

    /// One segment, as the first and last node of the chain it adds.
    /// `None` when the current token does not start a segment.
    fn parse_segment(&mut self) -> Result<Option<(NodeId, NodeId)>, ParseError> {
        match self.current_token {
            Token::Dot => {
                self.advance()?;
                let id = self.parse_dot_member()?;
                Ok(Some((id, id)))
            }
            Token::DotDot => {
                self.advance()?;
                let descent = self.tree.push(Selector::RecursiveDescent);
                let (first, last) = if self.check(&Token::LBracket) {
                    self.parse_bracket()?
                } else {
                    let id = self.parse_dot_member()?;
                    (id, id)
                };
                self.tree.set_tail(descent, first);
                Ok(Some((descent, last)))
            }
            Token::LBracket => self.parse_bracket().map(Some),
            Token::Caret => {
                self.advance()?;
                let id = self.tree.push(Selector::Parent);
                Ok(Some((id, id)))
            }
            _ => Ok(None),
        }
    }

    /// Member after `.` or `..`: a name or `*`.
    fn parse_dot_member(&mut self) -> Result<NodeId, ParseError> {
        let selector = match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Star => Selector::Wildcard,
            Token::Identifier(name) | Token::String(name) => Selector::Name(name),
            Token::Boolean(b) => Selector::Name(b.to_string()),
            Token::Null => Selector::Name("null".to_string()),
            token => {
                self.current_token = token;
                return self.error(format!("Expected a member name after '.', got {:?}", self.current_token));
            }
        };
        self.advance()?;
        Ok(self.tree.push(selector))
    }

    /// `[ selector (, selector)* ]`. Several selectors become a union.
    fn parse_bracket(&mut self) -> Result<(NodeId, NodeId), ParseError> {
        self.expect(Token::LBracket)?;
        let mut members = vec![self.parse_bracket_selector()?];
        while self.check(&Token::Comma) {
            self.advance()?;
            members.push(self.parse_bracket_selector()?);
        }
        self.expect(Token::RBracket)?;

        let id = if members.len() == 1 {
            members[0]
        } else {
            self.tree.push(Selector::Union(members))
        };
        Ok((id, id))
    }

    fn parse_bracket_selector(&mut self) -> Result<NodeId, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Star => {
                self.advance()?;
                Ok(self.tree.push(Selector::Wildcard))
            }
            Token::String(name) => {
                self.advance()?;
                Ok(self.tree.push(Selector::Name(name)))
            }
            Token::Question => {
                self.advance()?;
                let expr = self.parse_filter_expr(0)?;
                Ok(self.tree.push(Selector::Filter(expr)))
            }
            token @ (Token::Integer(_) | Token::Colon) => {
                self.current_token = token;
                self.parse_index_or_slice()
            }
            token @ (Token::Dollar | Token::At) => {
                self.current_token = token;
                self.parse_query()
            }
            token => {
                self.current_token = token;
                self.error(format!("Unexpected {:?} in brackets", self.current_token))
            }
        }
    }

    fn parse_optional_integer(&mut self) -> Result<Option<i64>, ParseError> {
        match self.current_token {
            Token::Integer(n) => {
                self.advance()?;
                Ok(Some(n))
            }
            _ => Ok(None),
        }
    }

    fn parse_index_or_slice(&mut self) -> Result<NodeId, ParseError> {
        let start = self.parse_optional_integer()?;
        if !self.check(&Token::Colon) {
            return match start {
                Some(index) => Ok(self.tree.push(Selector::Index(index))),
                None => self.error("Expected an index"),
            };
        }
        self.advance()?;
        let stop = self.parse_optional_integer()?;
        let mut step = 1;
        if self.check(&Token::Colon) {
            self.advance()?;
            step = self.parse_optional_integer()?.unwrap_or(1);
        }
        Ok(self.tree.push(Selector::Slice(Slice { start, stop, step })))
    }

    /// Precedence climbing over the operator table. `min_precedence` is the
    /// loosest operator this call may consume.
    fn parse_filter_expr(&mut self, min_precedence: u8) -> Result<FilterExpr, ParseError> {
        let mut left = self.parse_filter_operand()?;

        loop {
            if self.check(&Token::Match) {
                if UnaryOperator::REGEX_PRECEDENCE < min_precedence {
                    break;
                }
                let op = self.parse_regex_operator()?;
                left = FilterExpr::unary(op, left);
                continue;
            }

            let op = match self.current_token {
                Token::Or => BinaryOperator::Or,
                Token::And => BinaryOperator::And,
                Token::EqEq => BinaryOperator::Equal,
                Token::NotEq => BinaryOperator::NotEqual,
                Token::Lt => BinaryOperator::LessThan,
                Token::LtEq => BinaryOperator::LessEqual,
                Token::Gt => BinaryOperator::GreaterThan,
                Token::GtEq => BinaryOperator::GreaterEqual,
                _ => break,
            };
            if op.precedence() < min_precedence {
                break;
            }
            self.advance()?;

            let next_min = if op.is_right_associative() {
                op.precedence()
            } else {
                op.precedence() + 1
            };
            let right = self.parse_filter_expr(next_min)?;
            left = FilterExpr::binary(op, left, right);
        }
        Ok(left)
    }

    /// `=~ /pattern/flags`. The regex is compiled here, once.
    fn parse_regex_operator(&mut self) -> Result<UnaryOperator, ParseError> {
        self.expect(Token::Match)?;
        let (pattern, flags) = match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Regex { pattern, flags } => (pattern, flags),
            token => {
                self.current_token = token;
                return self.error(format!("Expected a regular expression after '=~', got {:?}", self.current_token));
            }
        };

        let mut builder = RegexBuilder::new(&pattern);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => return self.error(format!("Unknown regular expression flag '{}'", other)),
            };
        }
        let regex = match builder.build() {
            Ok(regex) => regex,
            Err(e) => return self.error(format!("Invalid regular expression: {}", e)),
        };
        self.advance()?;
        Ok(UnaryOperator::matching(regex, flags))
    }

    fn parse_filter_operand(&mut self) -> Result<FilterExpr, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Exclamation => {
                self.advance()?;
                let op = UnaryOperator::Not;
                // Right-associative: the operand may contain operators of equal precedence
                let operand = self.parse_filter_expr(op.precedence())?;
                Ok(FilterExpr::unary(op, operand))
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_filter_expr(0)?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            token @ (Token::Dollar | Token::At) => {
                self.current_token = token;
                self.parse_query().map(FilterExpr::Query)
            }
            Token::Integer(n) => {
                self.advance()?;
                Ok(FilterExpr::Literal(Value::Integer(n)))
            }
            Token::Float(n) => {
                self.advance()?;
                Ok(FilterExpr::Literal(Value::Float(n)))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(FilterExpr::Literal(Value::String(s)))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(FilterExpr::Literal(Value::Boolean(b)))
            }
            Token::Null => {
                self.advance()?;
                Ok(FilterExpr::Literal(Value::Null))
            }
            token => {
                self.current_token = token;
                self.error(format!("Unexpected {:?} in filter expression", self.current_token))
            }
        }
    }
}
