//! Runs a compiled script against a store.

use tracing::{debug, info};

use crate::{
    model::ElementRow,
    pipeline::Script,
    store::{DatabaseError, OsmStore},
};

/// Executes `script` and returns the rows of its final query.
///
/// Statements run strictly in order, since each view may read views created
/// before it. The first failure aborts the run; views already created stay
/// in the store.
pub async fn execute<S>(store: &S, script: &Script) -> Result<Vec<ElementRow>, DatabaseError>
where
    S: OsmStore + ?Sized,
{
    let (query, setup) = script.split_last().ok_or(DatabaseError::EmptyScript)?;
    let total = script.len();

    for (index, statement) in setup.iter().enumerate() {
        debug!(index = index + 1, total, statement = statement.as_str(), "executing statement");
        store
            .execute(statement)
            .await
            .map_err(|source| DatabaseError::Statement {
                index: index + 1,
                total,
                source,
            })?;
    }

    debug!(statement = query.as_str(), "running final query");
    let rows = store
        .fetch_elements(query)
        .await
        .map_err(|source| DatabaseError::Query { source })?;

    info!(
        session = script.session(),
        views = setup.len(),
        rows = rows.len(),
        "executed script"
    );
    Ok(rows)
}

/// Creates the base and side tables if they are missing.
pub async fn create_schema<S>(store: &S) -> Result<(), DatabaseError>
where
    S: OsmStore + ?Sized,
{
    for statement in crate::sql::create_schema() {
        store
            .execute(&statement)
            .await
            .map_err(|source| DatabaseError::Schema { source })?;
    }
    info!("schema ready");
    Ok(())
}
