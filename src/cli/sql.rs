//! Show the SQL a program compiles to, without running it

use super::CliError;
use crate::evaluator::compile;

/// How to print the compiled script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlFormat {
    /// Statements terminated by `;`, one after another
    #[default]
    Text,
    /// `{"session": ..., "statements": [...]}`
    Json,
}

/// Compile `text` and render the resulting script
pub fn render_sql(text: &str, session: &str, format: SqlFormat) -> Result<String, CliError> {
    let script = compile(text, session)?;
    match format {
        SqlFormat::Text => Ok(script.to_sql()),
        SqlFormat::Json => Ok(serde_json::to_string_pretty(&script)?),
    }
}
