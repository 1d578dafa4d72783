//! Rows coming back from the store.
//!
//! Every optional attribute is an `Option`: a missing value is `None`,
//! which is not the same as an empty string.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Entity kind, also the `type` discriminator of result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum EntityKind {
    #[default]
    Node,
    Way,
    Relation,
}

impl EntityKind {
    /// Document order: nodes, then ways, then relations
    pub const ALL: [EntityKind; 3] = [EntityKind::Node, EntityKind::Way, EntityKind::Relation];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Way => "way",
            EntityKind::Relation => "relation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(EntityKind::Node),
            "way" => Ok(EntityKind::Way),
            "relation" => Ok(EntityKind::Relation),
            other => Err(other.to_string()),
        }
    }
}

/// One row of the final query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementRow {
    pub kind: EntityKind,
    pub id: i64,
    /// Nodes only
    pub lat: Option<Decimal>,
    /// Nodes only
    pub lon: Option<Decimal>,
    pub timestamp: Option<NaiveDateTime>,
    pub uid: Option<i64>,
    pub user: Option<String>,
    pub visible: Option<bool>,
    pub version: Option<i64>,
    pub changeset: Option<i64>,
}

impl ElementRow {
    /// A row with only the required fields set
    pub fn new(kind: EntityKind, id: i64) -> Self {
        ElementRow {
            kind,
            id,
            ..Default::default()
        }
    }
}

/// A key/value tag owned by one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub owner_id: i64,
    pub key: String,
    /// The column is nullable; a missing value renders as `v=""`
    pub value: Option<String>,
}

impl Tag {
    pub fn new(owner_id: i64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            owner_id,
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// Position of a node within a way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WayNode {
    pub way_id: i64,
    pub node_id: i64,
    pub sequence: i64,
}

/// Kinds of element a relation may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberType {
    Node,
    Way,
}

impl MemberType {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberType::Node => "node",
            MemberType::Way => "way",
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(MemberType::Node),
            "way" => Ok(MemberType::Way),
            other => Err(other.to_string()),
        }
    }
}

/// A typed, ordered, role-tagged reference from a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMember {
    pub relation_id: i64,
    pub member_id: i64,
    pub member_type: MemberType,
    pub role: String,
    pub sequence: i64,
}
