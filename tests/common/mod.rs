//! In-memory store shared by the executor, output and CLI tests.
#![allow(dead_code)]

use std::{collections::HashMap, str::FromStr, sync::Mutex};

use astrolabe::{ElementRow, EntityKind, MemberType, OsmStore, RelationMember, Tag, WayNode};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Canned rows and children, with optional failures and a call log.
#[derive(Default)]
pub struct FakeStore {
    pub rows: Vec<ElementRow>,
    pub tags: HashMap<(EntityKind, i64), Vec<Tag>>,
    pub way_nodes: HashMap<i64, Vec<WayNode>>,
    pub members: HashMap<i64, Vec<RelationMember>>,
    /// 1-based index of the `execute` call that fails
    pub fail_statement: Option<usize>,
    pub fail_query: bool,
    pub fail_tags_for: Option<(EntityKind, i64)>,
    pub concurrency: usize,
    pub executed: Mutex<Vec<String>>,
    pub queried: Mutex<Vec<String>>,
}

fn failure(what: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("injected failure: {}", what))
}

impl FakeStore {
    pub fn with_rows(rows: Vec<ElementRow>) -> Self {
        FakeStore {
            rows,
            ..Default::default()
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl OsmStore for FakeStore {
    async fn execute(&self, statement: &str) -> Result<(), sqlx::Error> {
        let mut executed = self.executed.lock().unwrap();
        if self.fail_statement == Some(executed.len() + 1) {
            return Err(failure(statement));
        }
        executed.push(statement.to_string());
        Ok(())
    }

    async fn fetch_elements(&self, query: &str) -> Result<Vec<ElementRow>, sqlx::Error> {
        if self.fail_query {
            return Err(failure(query));
        }
        self.queried.lock().unwrap().push(query.to_string());
        Ok(self.rows.clone())
    }

    async fn fetch_tags(&self, kind: EntityKind, id: i64) -> Result<Vec<Tag>, sqlx::Error> {
        if self.fail_tags_for == Some((kind, id)) {
            return Err(failure("tags"));
        }
        Ok(self.tags.get(&(kind, id)).cloned().unwrap_or_default())
    }

    async fn fetch_way_nodes(&self, way_id: i64) -> Result<Vec<WayNode>, sqlx::Error> {
        Ok(self.way_nodes.get(&way_id).cloned().unwrap_or_default())
    }

    async fn fetch_relation_members(&self, relation_id: i64) -> Result<Vec<RelationMember>, sqlx::Error> {
        Ok(self.members.get(&relation_id).cloned().unwrap_or_default())
    }

    fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

pub fn decimal(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

pub fn node(id: i64, lat: &str, lon: &str) -> ElementRow {
    let mut row = ElementRow::new(EntityKind::Node, id);
    row.lat = Some(decimal(lat));
    row.lon = Some(decimal(lon));
    row
}

pub fn way(id: i64) -> ElementRow {
    ElementRow::new(EntityKind::Way, id)
}

pub fn relation(id: i64) -> ElementRow {
    ElementRow::new(EntityKind::Relation, id)
}

pub fn way_node(way_id: i64, node_id: i64, sequence: i64) -> WayNode {
    WayNode {
        way_id,
        node_id,
        sequence,
    }
}

pub fn member(relation_id: i64, member_type: MemberType, member_id: i64, role: &str, sequence: i64) -> RelationMember {
    RelationMember {
        relation_id,
        member_id,
        member_type,
        role: role.to_string(),
        sequence,
    }
}
