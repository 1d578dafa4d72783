use std::fmt;

use crate::pipeline::PipelineState;

/// Unit attached to a distance literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Kilometers,
    Miles,
    Feet,
    Meters,
}

impl Unit {
    /// Parse the unit suffix of a distance literal
    pub fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "km" => Some(Unit::Kilometers),
            "mi" => Some(Unit::Miles),
            "ft" => Some(Unit::Feet),
            "m" => Some(Unit::Meters),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Kilometers => "km",
            Unit::Miles => "mi",
            Unit::Feet => "ft",
            Unit::Meters => "m",
        }
    }

    /// Length of one unit in meters
    pub fn meters(self) -> f64 {
        match self {
            Unit::Kilometers => 1000.0,
            Unit::Miles => 1609.344,
            Unit::Feet => 0.3048,
            Unit::Meters => 1.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A literal argument as written in the program.
///
/// Methods that expect a plain number reject a distance and vice versa;
/// the unit is part of the type, not decoration.
///
/// # Examples
///
/// ```
/// use astrolabe::value::{Literal, Unit};
///
/// let lat = Literal::Number(51.5);
/// let radius = Literal::Distance(2.0, Unit::Kilometers);
/// let key = Literal::String("amenity".to_string());
///
/// assert_eq!(lat.as_number(), Some(51.5));
/// assert_eq!(radius.as_number(), None);
/// assert_eq!(radius.as_meters(), Some(2000.0));
/// assert_eq!(key.type_name(), "string");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// UTF-8 string
    String(String),

    /// Plain number
    Number(f64),

    /// Magnitude with a unit
    Distance(f64, Unit),
}

impl Literal {
    /// Get as a plain number; distances are not numbers
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            Literal::String(_) | Literal::Distance(..) => None,
        }
    }

    /// Get a distance normalised to meters
    pub fn as_meters(&self) -> Option<f64> {
        match self {
            Literal::Distance(n, unit) => Some(n * unit.meters()),
            Literal::String(_) | Literal::Number(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            Literal::Number(_) | Literal::Distance(..) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Number(_) => "number",
            Literal::Distance(..) => "distance",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Distance(n, unit) => write!(f, "{}{}", n, unit),
        }
    }
}

/// An argument after evaluation, as handed to a builtin method.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Literal passed through unchanged
    Literal(Literal),

    /// Result of a nested method call, compiled against a fresh pipeline
    Pipeline(PipelineState),
}

impl Argument {
    pub fn type_name(&self) -> &'static str {
        match self {
            Argument::Literal(lit) => lit.type_name(),
            Argument::Pipeline(_) => "method call",
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Argument::Literal(lit) => Some(lit),
            Argument::Pipeline(_) => None,
        }
    }
}
