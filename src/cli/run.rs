//! Compile a program, run it against the store and write OSM XML

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use tracing::info;

use super::{CliError, new_session, read_program};
use crate::{
    config::StoreConfig,
    evaluator::compile,
    executor,
    output::{self, OutputError},
    pipeline::Script,
    store::OsmStore,
};

/// Options for the run command
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Astrolabe program file
    pub input: PathBuf,
    /// OSM XML destination
    pub output: PathBuf,
    pub store: StoreConfig,
    /// View-name session; random when not given
    pub session: Option<String>,
}

/// What a successful run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub statements: usize,
    pub elements: usize,
}

/// Execute the run command end to end
pub async fn execute_run(options: &RunOptions) -> Result<RunSummary, CliError> {
    let text = read_program(&options.input)?;
    let session = options.session.clone().unwrap_or_else(new_session);
    let script = compile(&text, &session)?;
    info!(session = session.as_str(), statements = script.len(), "program compiled");

    let store = options.store.connect().await?;
    let result = run_with_store(&store, &script, &options.output).await;
    store.close().await;
    result
}

/// Execute `script` on `store` and write the document to `output`.
///
/// The output file is only created once the script has run; a failure after
/// that leaves a truncated file behind.
pub async fn run_with_store<S>(store: &S, script: &Script, output: &Path) -> Result<RunSummary, CliError>
where
    S: OsmStore + ?Sized,
{
    let rows = executor::execute(store, script).await?;

    let file = File::create(output).map_err(CliError::io(output))?;
    let mut writer = BufWriter::new(file);
    output::write_osm(store, &rows, &mut writer)
        .await
        .map_err(|e| match e {
            OutputError::Database(e) => CliError::Database(e),
            OutputError::Io(source) => CliError::Io {
                path: output.to_path_buf(),
                source,
            },
        })?;

    info!(output = %output.display(), elements = rows.len(), "wrote OSM XML");
    Ok(RunSummary {
        statements: script.len(),
        elements: rows.len(),
    })
}
