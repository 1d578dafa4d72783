use std::mem;

use crate::{
    ast::{Expr, MethodCall, Program, Token},
    lexer::{LexError, Lexer, Position},
    value::Literal,
};

/// Syntax errors: the program text is not a well-formed call chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, found {found} at position {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("program is empty; expected a chain such as `nodes().output()`")]
    EmptyProgram,
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    /// Offset where `current_token` ends, for error reporting
    position: Position,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        let position = lexer.position();
        Ok(Parser {
            lexer,
            current_token,
            position,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.position = self.lexer.position();
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current_token.describe(),
            position: self.position,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(&expected.describe()));
        }
        self.advance()
    }

    /// Parse a complete program: `call ('.' call)* EOF`
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        if self.check(&Token::Eof) {
            return Err(ParseError::EmptyProgram);
        }

        let mut calls = vec![self.parse_call()?];
        while self.check(&Token::Dot) {
            self.advance()?;
            calls.push(self.parse_call()?);
        }

        if !self.check(&Token::Eof) {
            return Err(self.unexpected("'.' or end of input"));
        }

        Ok(Program { calls })
    }

    /// `IDENT '(' [arg (',' arg)*] ')'`
    fn parse_call(&mut self) -> Result<MethodCall, ParseError> {
        let name = match &self.current_token {
            Token::Identifier(name) => name.clone(),
            _ => return Err(self.unexpected("method name")),
        };
        self.advance()?;
        self.expect(Token::LParen)?;

        let mut arguments = vec![];
        while !self.check(&Token::RParen) {
            arguments.push(self.parse_argument()?);

            if !self.check(&Token::RParen) {
                if !self.check(&Token::Comma) {
                    return Err(self.unexpected("',' or ')'"));
                }
                self.advance()?;
                // No trailing comma
                if self.check(&Token::RParen) {
                    return Err(self.unexpected("argument"));
                }
            }
        }
        self.expect(Token::RParen)?;

        Ok(MethodCall { name, arguments })
    }

    fn parse_argument(&mut self) -> Result<Expr, ParseError> {
        let literal = match &self.current_token {
            Token::Identifier(_) => return self.parse_call().map(Expr::MethodCall),
            Token::Number(n) => Literal::Number(*n),
            Token::Distance(n, unit) => Literal::Distance(*n, *unit),
            Token::String(_) => match mem::replace(&mut self.current_token, Token::Eof) {
                Token::String(s) => Literal::String(s),
                _ => unreachable!(),
            },
            _ => return Err(self.unexpected("argument")),
        };
        self.advance()?;
        Ok(Expr::Literal(literal))
    }
}

/// Parse program text into a call chain.
///
/// # Examples
///
/// ```
/// use astrolabe::parser::parse;
///
/// let program = parse("nodes().bbox(-90, -180, 90, 180).output()").unwrap();
/// assert_eq!(program.calls.len(), 3);
/// assert_eq!(program.calls[1].name, "bbox");
/// assert!(parse("nodes(.output()").is_err());
/// ```
pub fn parse(text: &str) -> Result<Program, ParseError> {
    Parser::new(Lexer::new(text))?.parse()
}
