//! Create the OSM tables in an empty database

use super::CliError;
use crate::{config::StoreConfig, executor};

/// Connect and create any missing base and side tables
pub async fn execute_init(config: &StoreConfig) -> Result<(), CliError> {
    let store = config.connect().await?;
    let result = executor::create_schema(&store).await;
    store.close().await;
    Ok(result?)
}
