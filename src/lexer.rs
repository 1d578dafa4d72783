use std::fmt;

use crate::{ast::Token, value::Unit};

/// Character offset into the program text
pub type Position = usize;

/// Errors raised while splitting program text into tokens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: Position },

    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: Position },

    #[error("invalid escape sequence '\\{ch}' at position {position}")]
    InvalidEscape { ch: char, position: Position },

    #[error("unknown distance unit `{unit}` at position {position} (expected km, mi, ft or m)")]
    UnknownUnit { unit: String, position: Position },

    #[error("malformed number `{text}` at position {position}")]
    MalformedNumber { text: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedChar { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::UnknownUnit { position, .. }
            | LexError::MalformedNumber { position, .. } => *position,
        }
    }
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

    /// Offset of the next unread character
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

    fn skip_whitespace(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => self.advance(),
                // Line comment
                Some('/') if self.peek_char(1) == Some('/') => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            return Err(LexError::InvalidEscape {
                                ch,
                                position: self.position,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let mut number = String::new();
        let mut seen_dot = false;

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !seen_dot
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                seen_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let value = number
            .parse::<f64>()
            .map_err(|_| LexError::MalformedNumber {
                text: number.clone(),
                position: start,
            })?;

        // A unit may follow directly or after whitespace
        let after_number = self.position;
        while self.current_char().is_some_and(|c| c == ' ' || c == '\t') {
            self.advance();
        }
        let gap = self.position != after_number;

        if self.current_char().is_some_and(|c| c.is_ascii_alphabetic()) {
            let unit_start = self.position;
            let word = self.read_identifier();
            return match Unit::from_suffix(&word) {
                Some(unit) => Ok(Token::Distance(value, unit)),
                None if gap => {
                    self.position = after_number;
                    Ok(Token::Number(value))
                }
                None => Err(LexError::UnknownUnit {
                    unit: word,
                    position: unit_start,
                }),
            };
        }

        self.position = after_number;
        Ok(Token::Number(value))
    }

    fn starts_number(&self) -> bool {
        match self.current_char() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_char(1).is_some_and(|c| c.is_ascii_digit()),
            Some('-') => match self.peek_char(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('.') => self.peek_char(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            },
            _ => false,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        if self.starts_number() {
            return self.read_number();
        }

        match self.current_char() {
            None => Ok(Token::Eof),
            Some('.') => {
                self.advance();
                Ok(Token::Dot)
            }
            Some(',') => {
                self.advance();
                Ok(Token::Comma)
            }
            Some('(') => {
                self.advance();
                Ok(Token::LParen)
            }
            Some(')') => {
                self.advance();
                Ok(Token::RParen)
            }
            Some('"') => self.read_string('"').map(Token::String),
            Some('\'') => self.read_string('\'').map(Token::String),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => Ok(Token::Identifier(self.read_identifier())),
            Some(ch) => Err(LexError::UnexpectedChar {
                ch,
                position: self.position,
            }),
        }
    }
}

impl fmt::Debug for Lexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("len", &self.input.len())
            .finish()
    }
}

#[test]
fn test_chain_tokens() {
    let mut lexer = Lexer::new("nodes().bbox(-90, -180, 90, 180)");
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("nodes".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::LParen));
    assert_eq!(lexer.next_token(), Ok(Token::RParen));
    assert_eq!(lexer.next_token(), Ok(Token::Dot));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("bbox".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::LParen));
    assert_eq!(lexer.next_token(), Ok(Token::Number(-90.0)));
    assert_eq!(lexer.next_token(), Ok(Token::Comma));
    assert_eq!(lexer.next_token(), Ok(Token::Number(-180.0)));
    assert_eq!(lexer.next_token(), Ok(Token::Comma));
    assert_eq!(lexer.next_token(), Ok(Token::Number(90.0)));
    assert_eq!(lexer.next_token(), Ok(Token::Comma));
    assert_eq!(lexer.next_token(), Ok(Token::Number(180.0)));
    assert_eq!(lexer.next_token(), Ok(Token::RParen));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}

#[test]
fn test_distance_units() {
    let mut lexer = Lexer::new("23.43km 9.2 mi 3ft 13.04m");
    assert_eq!(lexer.next_token(), Ok(Token::Distance(23.43, Unit::Kilometers)));
    assert_eq!(lexer.next_token(), Ok(Token::Distance(9.2, Unit::Miles)));
    assert_eq!(lexer.next_token(), Ok(Token::Distance(3.0, Unit::Feet)));
    assert_eq!(lexer.next_token(), Ok(Token::Distance(13.04, Unit::Meters)));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}
