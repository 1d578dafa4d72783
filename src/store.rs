//! Access to the relational store holding the OSM data.
//!
//! [`OsmStore`] is the only way the executor and the XML writer touch the
//! database. Each call is a scoped unit of work: implementations acquire a
//! connection, run one statement and release it on every exit path.

pub mod postgres;

use async_trait::async_trait;

use crate::model::{ElementRow, EntityKind, RelationMember, Tag, WayNode};

pub use postgres::PgStore;

/// Failures talking to the store, with the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("could not connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    /// A view-creating statement failed; `index` is 1-based
    #[error("statement {index} of {total} failed: {source}")]
    Statement {
        index: usize,
        total: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("final query failed: {source}")]
    Query {
        #[source]
        source: sqlx::Error,
    },

    #[error("could not fetch {what} of {kind} {id}: {source}")]
    SubQuery {
        what: &'static str,
        kind: EntityKind,
        id: i64,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not create schema: {source}")]
    Schema {
        #[source]
        source: sqlx::Error,
    },

    #[error("compiled script has no statements")]
    EmptyScript,
}

/// Capability to run compiled statements and fetch per-element children.
#[async_trait]
pub trait OsmStore: Send + Sync {
    /// Run a statement that returns no rows (view creation, DDL)
    async fn execute(&self, statement: &str) -> Result<(), sqlx::Error>;

    /// Run the final query and decode its type-discriminated rows
    async fn fetch_elements(&self, query: &str) -> Result<Vec<ElementRow>, sqlx::Error>;

    /// Tags of one element, in the order the store returns them
    async fn fetch_tags(&self, kind: EntityKind, id: i64) -> Result<Vec<Tag>, sqlx::Error>;

    async fn fetch_way_nodes(&self, way_id: i64) -> Result<Vec<WayNode>, sqlx::Error>;

    async fn fetch_relation_members(&self, relation_id: i64) -> Result<Vec<RelationMember>, sqlx::Error>;

    /// How many sub-queries may be in flight at once
    fn concurrency(&self) -> usize {
        1
    }
}
