//! CLI support for astrolabe
//!
//! Provides programmatic access to the `qastro` commands so they can be
//! driven from tests or embedded in other tools.

mod check;
mod docs;
mod init;
mod run;
mod sql;

pub use check::{CheckReport, execute_check};
pub use docs::{get_doc_topic, get_docs_overview};
pub use init::execute_init;
pub use run::{RunOptions, RunSummary, execute_run, run_with_store};
pub use sql::{SqlFormat, render_sql};

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::{
    evaluator::{CompileError, ValidationError},
    parser::ParseError,
    store::DatabaseError,
};

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Program text is malformed
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// Program is well-formed but cannot be compiled
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Connection, statement or sub-query failure
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// A file could not be read or written
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON rendering failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No program provided
    #[error("No input provided. Pass a program file or pipe one to stdin.")]
    NoInput,

    /// Unknown documentation topic
    #[error("Unknown topic: '{0}'\nRun 'qastro docs' to see available topics.")]
    UnknownTopic(String),
}

impl From<CompileError> for CliError {
    fn from(e: CompileError) -> Self {
        match e {
            CompileError::Syntax(e) => CliError::Syntax(e),
            CompileError::Validation(e) => CliError::Validation(e),
        }
    }
}

impl CliError {
    pub fn io(path: &Path) -> impl FnOnce(io::Error) -> CliError + '_ {
        move |source| CliError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read a program file
pub fn read_program(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(CliError::io(path))
}

/// A random session id, so views from separate runs never collide
pub fn new_session() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..12].to_string()
}
