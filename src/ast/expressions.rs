use crate::value::Literal;

/// Argument expression of a method call.
///
/// Arguments are evaluated before the call that contains them.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    ///
    /// # Examples
    /// ```text
    /// 51.5
    /// 2km
    /// "name"
    /// ```
    Literal(Literal),

    /// Nested method call
    ///
    /// Compiled against a fresh pipeline, never against the enclosing chain.
    ///
    /// # Example
    /// ```text
    /// ways()
    /// ```
    MethodCall(MethodCall),
}

/// A single call in a chain: `name(arg, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Builtin method name
    pub name: String,

    /// Positional arguments, in source order
    pub arguments: Vec<Expr>,
}

impl MethodCall {
    pub fn new(name: impl Into<String>, arguments: Vec<Expr>) -> Self {
        MethodCall {
            name: name.into(),
            arguments,
        }
    }
}

/// A complete program: calls chained with `.`, applied left to right.
///
/// The receiver of each call is implicit (the pipeline produced by the
/// previous call), so it never appears among the arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub calls: Vec<MethodCall>,
}
