//! SQL text helpers and the OSM relational schema.
//!
//! Statements that create views cannot take bind parameters, so every value
//! that reaches SQL text goes through [`quote_ident`] or [`number`]:
//! identifiers are always double-quoted after validation, and numbers are
//! rendered from validated finite `f64`s, never from program text.

use std::sync::LazyLock;

use regex::Regex;

static IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern"));

/// Base relation holding every node.
pub const NODES: &str = "nodes";
/// Base relation holding every way.
pub const WAYS: &str = "ways";
/// Base relation holding every relation.
pub const RELATIONS: &str = "relations";

pub const NODE_TAGS: &str = "node_tags";
pub const WAY_TAGS: &str = "way_tags";
pub const RELATION_TAGS: &str = "relation_tags";
pub const WAY_CONSTITUENT_NODES: &str = "way_constituent_nodes";
pub const RELATION_CONSTITUENT_NODES: &str = "relation_constituent_nodes";
pub const RELATION_CONSTITUENT_WAYS: &str = "relation_constituent_ways";

/// Attribute columns shared by all three base relations, in output order.
///
/// `user` is a reserved word in PostgreSQL, so the column is `usr`.
pub const COMMON_COLUMNS: [&str; 6] = ["timestamp", "uid", "usr", "visible", "version", "changeset"];

/// Quote an identifier for use in SQL text.
///
/// Returns `None` for anything that is not a plain identifier of at most
/// 63 characters, so callers can never splice arbitrary text.
///
/// # Examples
///
/// ```
/// use astrolabe::sql::quote_ident;
///
/// assert_eq!(quote_ident("nodes").as_deref(), Some("\"nodes\""));
/// assert_eq!(quote_ident("x; DROP TABLE nodes"), None);
/// ```
pub fn quote_ident(name: &str) -> Option<String> {
    IDENT.is_match(name).then(|| format!("\"{}\"", name))
}

/// Render a finite number as a plain SQL numeric literal.
///
/// Returns `None` for NaN and infinities. Never uses exponent notation.
pub fn number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let text = format!("{}", value);
    // Parenthesised so a leading minus never merges with a preceding operator
    if value.is_sign_negative() && value != 0.0 {
        Some(format!("({})", text))
    } else if value == 0.0 {
        Some("0".to_string())
    } else {
        Some(text)
    }
}

/// DDL statements creating the base and side tables, in dependency order.
pub fn create_schema() -> Vec<String> {
    vec![
        "CREATE TABLE IF NOT EXISTS nodes (
    id BIGINT PRIMARY KEY NOT NULL,
    lat DECIMAL(9, 7),
    lon DECIMAL(10, 7),
    timestamp TIMESTAMP(0),
    uid BIGINT,
    usr VARCHAR(255),
    visible BOOL,
    version BIGINT,
    changeset BIGINT
)"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS ways (
    id BIGINT PRIMARY KEY NOT NULL,
    timestamp TIMESTAMP(0),
    uid BIGINT,
    usr VARCHAR(255),
    visible BOOL,
    version BIGINT,
    changeset BIGINT
)"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS way_constituent_nodes (
    way_id BIGINT NOT NULL,
    node_sequence BIGINT NOT NULL CHECK (node_sequence > 0),
    node_id BIGINT NOT NULL,
    PRIMARY KEY (way_id, node_sequence),
    FOREIGN KEY (way_id) REFERENCES ways(id)
)"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS relations (
    id BIGINT PRIMARY KEY NOT NULL,
    timestamp TIMESTAMP(0),
    uid BIGINT,
    usr VARCHAR(255),
    visible BOOL,
    version BIGINT,
    changeset BIGINT
)"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS relation_constituent_nodes (
    relation_id BIGINT NOT NULL,
    member_sequence BIGINT NOT NULL CHECK (member_sequence > 0),
    node_id BIGINT NOT NULL,
    role VARCHAR(255),
    PRIMARY KEY (relation_id, member_sequence),
    FOREIGN KEY (relation_id) REFERENCES relations(id)
)"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS relation_constituent_ways (
    relation_id BIGINT NOT NULL,
    member_sequence BIGINT NOT NULL CHECK (member_sequence > 0),
    way_id BIGINT NOT NULL,
    role VARCHAR(255),
    PRIMARY KEY (relation_id, member_sequence),
    FOREIGN KEY (relation_id) REFERENCES relations(id)
)"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS node_tags (
    node_id BIGINT NOT NULL,
    key VARCHAR(255) NOT NULL,
    value VARCHAR(255),
    PRIMARY KEY (node_id, key),
    FOREIGN KEY (node_id) REFERENCES nodes(id)
)"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS way_tags (
    way_id BIGINT NOT NULL,
    key VARCHAR(255) NOT NULL,
    value VARCHAR(255),
    PRIMARY KEY (way_id, key),
    FOREIGN KEY (way_id) REFERENCES ways(id)
)"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS relation_tags (
    relation_id BIGINT NOT NULL,
    key VARCHAR(255) NOT NULL,
    value VARCHAR(255),
    PRIMARY KEY (relation_id, key),
    FOREIGN KEY (relation_id) REFERENCES relations(id)
)"
        .to_string(),
    ]
}
