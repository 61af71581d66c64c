use thiserror::Error;

use crate::ast::Token;

/// Offset, in characters, into the query text.
pub type Position = usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            position: self.position,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_hex_digits(&mut self) -> Result<u32, LexError> {
        let mut code = 0u32;
        for _ in 0..4 {
            self.advance();
            let digit = self
                .current_char()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid \\u escape: expected 4 hex digits"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    /// `\uXXXX`, or a `\uD8XX\uDCXX` surrogate pair. Leaves the lexer on the
    /// last hex digit.
    fn read_hex_escape(&mut self) -> Result<char, LexError> {
        let mut code = self.read_hex_digits()?;
        if (0xD800..=0xDBFF).contains(&code) {
            if self.peek_char(1) != Some('\\') || self.peek_char(2) != Some('u') {
                return Err(self.error("Invalid \\u escape: unpaired high surrogate"));
            }
            self.advance();
            self.advance();
            let low = self.read_hex_digits()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.error("Invalid \\u escape: expected a low surrogate"));
            }
            code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
        }
        char::from_u32(code).ok_or_else(|| self.error("Invalid \\u escape: not a scalar value"))
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('b') => result.push('\u{8}'),
                        Some('f') => result.push('\u{c}'),
                        Some('/') => result.push('/'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some('u') => {
                            let c = self.read_hex_escape()?;
                            result.push(c);
                        }
                        Some(ch) => return Err(self.error(format!("Invalid escape sequence: \\{}", ch))),
                        None => return Err(self.error("Unterminated string: unexpected EOF after backslash")),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("Unterminated string: missing closing quote"))
    }

    /// Read `/pattern/flags`. Only `\/` is unescaped; every other escape is
    /// left for the regex engine.
    fn read_regex(&mut self) -> Result<Token, LexError> {
        let mut pattern = String::new();
        self.advance(); // opening slash

        loop {
            match self.current_char() {
                Some('/') => {
                    self.advance();
                    break;
                }
                Some('\\') if self.peek_char(1) == Some('/') => {
                    pattern.push('/');
                    self.advance();
                    self.advance();
                }
                Some('\\') => {
                    pattern.push('\\');
                    self.advance();
                    if let Some(ch) = self.current_char() {
                        pattern.push(ch);
                        self.advance();
                    }
                }
                Some(ch) => {
                    pattern.push(ch);
                    self.advance();
                }
                None => return Err(self.error("Unterminated regular expression: missing closing '/'")),
            }
        }

        let mut flags = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphabetic() {
                flags.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Ok(Token::Regex { pattern, flags })
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_float = false;

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E')
                && self
                    .peek_char(1)
                    .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+')
            {
                is_float = true;
                number.push(ch);
                self.advance();
                if let Some(sign @ ('-' | '+')) = self.current_char() {
                    number.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        let invalid = || LexError {
            message: format!("Invalid number '{}'", number),
            position: start,
        };
        if is_float {
            number.parse::<f64>().map(Token::Float).map_err(|_| invalid())
        } else {
            number.parse::<i64>().map(Token::Integer).map_err(|_| invalid())
        }
    }

    /// Consume one character and produce `token`.
    fn single(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        Ok(token)
    }

    /// Produce `double` if the next character is `second`, else `single`.
    fn one_or_two(&mut self, second: char, double: Token, single: Token) -> Result<Token, LexError> {
        if self.peek_char(1) == Some(second) {
            self.advance();
            self.advance();
            Ok(double)
        } else {
            self.advance();
            Ok(single)
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        match self.current_char() {
            None => Ok(Token::Eof),
            Some('$') => self.single(Token::Dollar),
            Some('@') => self.single(Token::At),
            Some('.') => self.one_or_two('.', Token::DotDot, Token::Dot),
            Some('*') => self.single(Token::Star),
            Some('^') => self.single(Token::Caret),
            Some('?') => self.single(Token::Question),
            Some(',') => self.single(Token::Comma),
            Some(':') => self.single(Token::Colon),
            Some('[') => self.single(Token::LBracket),
            Some(']') => self.single(Token::RBracket),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('!') => self.one_or_two('=', Token::NotEq, Token::Exclamation),
            Some('<') => self.one_or_two('=', Token::LtEq, Token::Lt),
            Some('>') => self.one_or_two('=', Token::GtEq, Token::Gt),
            Some('=') => match self.peek_char(1) {
                Some('=') => self.one_or_two('=', Token::EqEq, Token::EqEq),
                Some('~') => self.one_or_two('~', Token::Match, Token::Match),
                _ => Err(self.error("Unexpected '=' (did you mean '==' or '=~'?)")),
            },
            Some('&') if self.peek_char(1) == Some('&') => self.one_or_two('&', Token::And, Token::And),
            Some('|') if self.peek_char(1) == Some('|') => self.one_or_two('|', Token::Or, Token::Or),
            Some('/') => self.read_regex(),
            Some(quote @ ('"' | '\'')) => self.read_string(quote).map(Token::String),
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                Ok(match ident.as_str() {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    _ => Token::Identifier(ident),
                })
            }
            Some(ch) => Err(self.error(format!("Unexpected character '{}'", ch))),
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("true false null truth");
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(true)));
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(false)));
    assert_eq!(lexer.next_token(), Ok(Token::Null));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("truth".to_string())));
}

#[test]
fn test_filter_tokens() {
    let mut lexer = Lexer::new("$[?(@.x =~ /^h/i)]");
    assert_eq!(lexer.next_token(), Ok(Token::Dollar));
    assert_eq!(lexer.next_token(), Ok(Token::LBracket));
    assert_eq!(lexer.next_token(), Ok(Token::Question));
    assert_eq!(lexer.next_token(), Ok(Token::LParen));
    assert_eq!(lexer.next_token(), Ok(Token::At));
    assert_eq!(lexer.next_token(), Ok(Token::Dot));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("x".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Match));
    assert_eq!(
        lexer.next_token(),
        Ok(Token::Regex {
            pattern: "^h".to_string(),
            flags: "i".to_string()
        })
    );
    assert_eq!(lexer.next_token(), Ok(Token::RParen));
    assert_eq!(lexer.next_token(), Ok(Token::RBracket));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}
