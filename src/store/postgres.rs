use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::OsmStore;
use crate::{
    model::{ElementRow, EntityKind, MemberType, RelationMember, Tag, WayNode},
    sql,
};

/// [`OsmStore`] over a bounded PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    concurrency: usize,
}

impl PgStore {
    /// `concurrency` should not exceed the pool's connection limit.
    pub fn new(pool: PgPool, concurrency: usize) -> Self {
        PgStore {
            pool,
            concurrency: concurrency.max(1),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn element_from_row(row: &PgRow) -> Result<ElementRow, sqlx::Error> {
    let kind: String = row.try_get("type")?;
    let kind = kind.parse::<EntityKind>().map_err(|other| sqlx::Error::ColumnDecode {
        index: "type".to_string(),
        source: format!("unknown element type `{}`", other).into(),
    })?;

    Ok(ElementRow {
        kind,
        id: row.try_get("id")?,
        lat: row.try_get::<Option<Decimal>, _>("lat")?,
        lon: row.try_get::<Option<Decimal>, _>("lon")?,
        timestamp: row.try_get::<Option<NaiveDateTime>, _>("timestamp")?,
        uid: row.try_get("uid")?,
        user: row.try_get("usr")?,
        visible: row.try_get("visible")?,
        version: row.try_get("version")?,
        changeset: row.try_get("changeset")?,
    })
}

/// Side table and owner column holding the tags of `kind`
fn tag_table(kind: EntityKind) -> (&'static str, &'static str) {
    match kind {
        EntityKind::Node => (sql::NODE_TAGS, "node_id"),
        EntityKind::Way => (sql::WAY_TAGS, "way_id"),
        EntityKind::Relation => (sql::RELATION_TAGS, "relation_id"),
    }
}

#[async_trait]
impl OsmStore for PgStore {
    async fn execute(&self, statement: &str) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(statement).execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_elements(&self, query: &str) -> Result<Vec<ElementRow>, sqlx::Error> {
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        rows.iter().map(element_from_row).collect()
    }

    async fn fetch_tags(&self, kind: EntityKind, id: i64) -> Result<Vec<Tag>, sqlx::Error> {
        let (table, owner) = tag_table(kind);
        let query = format!("SELECT key, value FROM {} WHERE {} = $1 ORDER BY key ASC", table, owner);
        let rows = sqlx::query(&query).bind(id).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<Tag, sqlx::Error> {
                Ok(Tag {
                    owner_id: id,
                    key: row.try_get("key")?,
                    value: row.try_get("value")?,
                })
            })
            .collect()
    }

    async fn fetch_way_nodes(&self, way_id: i64) -> Result<Vec<WayNode>, sqlx::Error> {
        let query = format!(
            "SELECT node_id, node_sequence FROM {} WHERE way_id = $1 ORDER BY node_sequence ASC",
            sql::WAY_CONSTITUENT_NODES
        );
        let rows = sqlx::query(&query).bind(way_id).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<WayNode, sqlx::Error> {
                Ok(WayNode {
                    way_id,
                    node_id: row.try_get("node_id")?,
                    sequence: row.try_get("node_sequence")?,
                })
            })
            .collect()
    }

    async fn fetch_relation_members(&self, relation_id: i64) -> Result<Vec<RelationMember>, sqlx::Error> {
        let query = format!(
            "SELECT member_sequence, node_id AS member_id, role, 'node' AS member_type FROM {} WHERE relation_id = $1 \
UNION ALL \
SELECT member_sequence, way_id AS member_id, role, 'way' AS member_type FROM {} WHERE relation_id = $1 \
ORDER BY member_sequence ASC",
            sql::RELATION_CONSTITUENT_NODES,
            sql::RELATION_CONSTITUENT_WAYS
        );
        let rows = sqlx::query(&query).bind(relation_id).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<RelationMember, sqlx::Error> {
                let member_type: String = row.try_get("member_type")?;
                let member_type = member_type.parse::<MemberType>().map_err(|other| sqlx::Error::ColumnDecode {
                    index: "member_type".to_string(),
                    source: format!("unknown member type `{}`", other).into(),
                })?;
                Ok(RelationMember {
                    relation_id,
                    member_id: row.try_get("member_id")?,
                    member_type,
                    role: row.try_get::<Option<String>, _>("role")?.unwrap_or_default(),
                    sequence: row.try_get("member_sequence")?,
                })
            })
            .collect()
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }
}
