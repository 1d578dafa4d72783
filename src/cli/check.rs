//! Validate a program without touching the store

use super::CliError;
use crate::{Evaluator, parser::parse};

/// Session used for check-only compilations; nothing is executed
const CHECK_SESSION: &str = "check";

/// Result of a successful check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    /// Calls in the top-level chain
    pub calls: usize,
    /// Statements the program compiles to
    pub statements: usize,
}

/// Parse and compile `text`, reporting its size
pub fn execute_check(text: &str) -> Result<CheckReport, CliError> {
    let program = parse(text)?;
    let script = Evaluator::new(CHECK_SESSION)?.compile(&program)?;
    Ok(CheckReport {
        calls: program.calls.len(),
        statements: script.len(),
    })
}
