use tracing::debug;

use crate::{
    ast::{Expr, MethodCall, Program},
    methods::{Bound, Builtin},
    parser::{self, ParseError},
    pipeline::{PipelineState, Script, ViewNamer},
    value::Argument,
};

/// Errors raised while compiling a well-formed program.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// No builtin has this name
    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    /// Wrong number of arguments
    #[error("{method}() expects {expected} argument(s), got {found}")]
    Arity {
        method: &'static str,
        expected: usize,
        found: usize,
    },

    /// Argument of the wrong type (position is 1-based)
    #[error("{method}() argument {position} must be a {expected}, got a {found}")]
    ArgumentType {
        method: &'static str,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Numeric argument outside its allowed range
    #[error("{method}() {bound} bound {value} is outside [{min}, {max}]")]
    OutOfRange {
        method: &'static str,
        bound: Bound,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The chain ends without a terminal call
    #[error("chain must terminate in output()")]
    MissingOutput,

    /// A call follows the terminal call
    #[error("chain must terminate in output(): `{method}` follows it")]
    CallAfterOutput { method: String },

    /// Session id unusable in view names
    #[error("invalid session id `{0}`: expected 1-16 lowercase letters or digits")]
    InvalidSession(String),
}

/// Either failure of [`compile`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Syntax(#[from] ParseError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Compiles call chains into SQL scripts.
///
/// One evaluator is one compilation session: every view it names is unique
/// within it, including views minted for nested arguments.
#[derive(Debug)]
pub struct Evaluator {
    namer: ViewNamer,
}

impl Evaluator {
    /// Creates an evaluator minting names under `session`.
    pub fn new(session: &str) -> Result<Self, ValidationError> {
        let namer = ViewNamer::new(session).ok_or_else(|| ValidationError::InvalidSession(session.to_string()))?;
        Ok(Evaluator { namer })
    }

    pub fn session(&self) -> &str {
        self.namer.session()
    }

    /// Compiles a whole program, threading one pipeline through the chain.
    ///
    /// The chain must end in a terminal call such as `output()`, whose
    /// query becomes the last statement of the script.
    ///
    /// # Examples
    ///
    /// ```
    /// use astrolabe::{Evaluator, parser::parse};
    ///
    /// let program = parse("ways().output()").unwrap();
    /// let script = Evaluator::new("demo").unwrap().compile(&program).unwrap();
    ///
    /// // Three views from ways(), then the final query
    /// assert_eq!(script.len(), 4);
    /// assert!(script.statements()[3].starts_with("SELECT 'node' AS type"));
    /// ```
    pub fn compile(&mut self, program: &Program) -> Result<Script, ValidationError> {
        let mut state = PipelineState::base();
        let mut terminated = false;

        for call in &program.calls {
            if terminated {
                return Err(ValidationError::CallAfterOutput {
                    method: call.name.clone(),
                });
            }
            let (next, builtin) = self.eval_call(call, &state)?;
            state = next;
            terminated = builtin.is_terminal();
        }

        if !terminated {
            return Err(ValidationError::MissingOutput);
        }

        let script = state.into_script(self.namer.session());
        debug!(
            session = self.namer.session(),
            statements = script.len(),
            "compiled program"
        );
        Ok(script)
    }

    fn eval_call(
        &mut self,
        call: &MethodCall,
        state: &PipelineState,
    ) -> Result<(PipelineState, Builtin), ValidationError> {
        // Innermost first
        let args = call
            .arguments
            .iter()
            .map(|arg| self.eval_argument(arg))
            .collect::<Result<Vec<_>, _>>()?;

        let builtin = Builtin::lookup(&call.name).ok_or_else(|| ValidationError::UnknownMethod(call.name.clone()))?;
        let next = builtin.apply(state, &args, &mut self.namer)?;

        debug!(
            method = builtin.name(),
            nodes = next.sources().nodes.as_str(),
            ways = next.sources().ways.as_str(),
            relations = next.sources().relations.as_str(),
            "applied method"
        );
        Ok((next, builtin))
    }

    fn eval_argument(&mut self, arg: &Expr) -> Result<Argument, ValidationError> {
        match arg {
            Expr::Literal(lit) => Ok(Argument::Literal(lit.clone())),
            // Nested calls see a fresh pipeline, never the enclosing chain
            Expr::MethodCall(call) => {
                let (state, _) = self.eval_call(call, &PipelineState::base())?;
                Ok(Argument::Pipeline(state))
            }
        }
    }
}

/// Parses and compiles program text in one step.
///
/// # Examples
///
/// ```
/// use astrolabe::evaluator::{compile, CompileError, ValidationError};
///
/// let script = compile("nodes().bbox(-90, -180, 90, 180).output()", "demo").unwrap();
/// assert_eq!(script.len(), 7);
///
/// let err = compile("nodes()", "demo").unwrap_err();
/// assert_eq!(err, CompileError::Validation(ValidationError::MissingOutput));
/// ```
pub fn compile(text: &str, session: &str) -> Result<Script, CompileError> {
    let program = parser::parse(text)?;
    let mut evaluator = Evaluator::new(session)?;
    Ok(evaluator.compile(&program)?)
}
