use crate::value::Unit;

/// Lexical token of an Astrolabe program.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Plain number, integer or fractional
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -0.12
    /// .5
    /// ```
    Number(f64),

    /// Number carrying a distance unit
    ///
    /// # Examples
    /// ```text
    /// 23.43km
    /// 9.2 mi
    /// 300ft
    /// ```
    Distance(f64, Unit),

    /// String literal enclosed in double or single quotes
    ///
    /// # Examples
    /// ```text
    /// "amenity"
    /// 'cafe'
    /// ```
    String(String),

    // Identifiers
    /// Method name
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    ///
    /// # Examples
    /// ```text
    /// nodes
    /// bbox
    /// ```
    Identifier(String),

    // Punctuation
    /// Method chaining (`.`)
    Dot,

    /// Argument separator (`,`)
    Comma,

    /// Left parenthesis (`(`)
    LParen,

    /// Right parenthesis (`)`)
    RParen,

    /// End of input
    Eof,
}

impl Token {
    /// Short human-readable description used in syntax errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Distance(n, unit) => format!("distance {}{}", n, unit),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Identifier(name) => format!("identifier `{}`", name),
            Token::Dot => "'.'".to_string(),
            Token::Comma => "','".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}
