//! OSM XML output for query results.
//!
//! The final query returns flat, type-discriminated rows. This module fetches
//! each element's tags and ordered children and writes them back as nested
//! OSM XML (version 0.6).
//!
//! # Features
//!
//! - **Phase order** - all nodes, then all ways, then all relations, so
//!   references always point at elements already declared
//! - **Absent attributes** - an attribute is written only when its value is
//!   present; `id` is always written
//! - **Ordered children** - `<nd>` and `<member>` follow their `sequence`,
//!   whatever order the store returned them in
//! - **Concurrent fetches** - child sub-queries for sibling elements run
//!   concurrently up to the store's limit, without changing output order
//!
//! # Examples
//!
//! ```
//! use astrolabe::model::{ElementRow, EntityKind, Tag};
//! use astrolabe::output::render_node;
//!
//! let mut row = ElementRow::new(EntityKind::Node, 1);
//! row.version = Some(3);
//!
//! assert_eq!(
//!     render_node(&row, &[Tag::new(1, "name", "X")]),
//!     r#"<node id="1" version="3"><tag k="name" v="X"/></node>"#
//! );
//! assert_eq!(render_node(&row, &[]), r#"<node id="1" version="3"/>"#);
//! ```

use std::io::{self, Write};

use chrono::NaiveDateTime;
use futures::{StreamExt, TryStreamExt, stream};
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    model::{ElementRow, EntityKind, RelationMember, Tag, WayNode},
    store::{DatabaseError, OsmStore},
};

/// Value of the `generator` attribute on the root element
pub const GENERATOR: &str = "qastro";

/// OSM data format version written on the root element
pub const OSM_VERSION: &str = "0.6";

/// Failures while writing a document. Output already written is incomplete.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("could not write output: {0}")]
    Io(#[from] io::Error),
}

/// Characters XML 1.0 does not allow anywhere in a document
fn is_forbidden_xml_char(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

/// Escape text for use inside a double-quoted attribute value.
///
/// Characters XML cannot represent at all become U+FFFD.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c if is_forbidden_xml_char(c) => out.push(char::REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    out
}

/// ISO-8601, seconds precision, UTC `Z` suffix
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Coordinate with exactly seven decimal places
pub fn format_coord(value: &Decimal) -> String {
    let text = value.round_dp(7).to_string();
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    format!("{}.{:0<7}", int, frac)
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

/// Attributes of an element, in OSM order
fn attributes(row: &ElementRow) -> String {
    let mut out = String::new();
    push_attr(&mut out, "id", &row.id.to_string());

    if row.kind == EntityKind::Node
        && let (Some(lat), Some(lon)) = (&row.lat, &row.lon)
    {
        push_attr(&mut out, "lat", &format_coord(lat));
        push_attr(&mut out, "lon", &format_coord(lon));
    }
    if let Some(ts) = &row.timestamp {
        push_attr(&mut out, "timestamp", &format_timestamp(ts));
    }
    if let Some(uid) = row.uid {
        push_attr(&mut out, "uid", &uid.to_string());
    }
    if let Some(user) = &row.user {
        push_attr(&mut out, "user", user);
    }
    if let Some(visible) = row.visible {
        push_attr(&mut out, "visible", &visible.to_string());
    }
    if let Some(version) = row.version {
        push_attr(&mut out, "version", &version.to_string());
    }
    if let Some(changeset) = row.changeset {
        push_attr(&mut out, "changeset", &changeset.to_string());
    }
    out
}

fn render_tag(tag: &Tag) -> String {
    let mut out = String::from("<tag");
    push_attr(&mut out, "k", &tag.key);
    push_attr(&mut out, "v", tag.value.as_deref().unwrap_or(""));
    out.push_str("/>");
    out
}

/// Self-closed when there are no children, otherwise open/close around them
fn render_element(name: &str, row: &ElementRow, children: Vec<String>) -> String {
    let attrs = attributes(row);
    if children.is_empty() {
        format!("<{}{}/>", name, attrs)
    } else {
        format!("<{}{}>{}</{}>", name, attrs, children.concat(), name)
    }
}

pub fn render_node(row: &ElementRow, tags: &[Tag]) -> String {
    render_element("node", row, tags.iter().map(render_tag).collect())
}

/// Tags first, then `<nd>` references in ascending `sequence`.
pub fn render_way(row: &ElementRow, tags: &[Tag], nodes: &[WayNode]) -> String {
    let mut ordered: Vec<&WayNode> = nodes.iter().collect();
    ordered.sort_by_key(|nd| nd.sequence);

    let children = tags
        .iter()
        .map(render_tag)
        .chain(ordered.into_iter().map(|nd| format!("<nd ref=\"{}\"/>", nd.node_id)))
        .collect();
    render_element("way", row, children)
}

/// Tags first, then `<member>` references in ascending `sequence`.
pub fn render_relation(row: &ElementRow, tags: &[Tag], members: &[RelationMember]) -> String {
    let mut ordered: Vec<&RelationMember> = members.iter().collect();
    ordered.sort_by_key(|m| m.sequence);

    let children = tags
        .iter()
        .map(render_tag)
        .chain(ordered.into_iter().map(|m| {
            let mut out = String::from("<member");
            push_attr(&mut out, "type", m.member_type.as_str());
            push_attr(&mut out, "ref", &m.member_id.to_string());
            push_attr(&mut out, "role", &m.role);
            out.push_str("/>");
            out
        }))
        .collect();
    render_element("relation", row, children)
}

/// Fetch one element's children and render it.
async fn fetch_and_render<S>(store: &S, row: &ElementRow) -> Result<String, DatabaseError>
where
    S: OsmStore + ?Sized,
{
    let failed = |what: &'static str| {
        move |source: sqlx::Error| DatabaseError::SubQuery {
            what,
            kind: row.kind,
            id: row.id,
            source,
        }
    };

    let tags = store.fetch_tags(row.kind, row.id).await.map_err(failed("tags"))?;

    match row.kind {
        EntityKind::Node => Ok(render_node(row, &tags)),
        EntityKind::Way => {
            let nodes = store.fetch_way_nodes(row.id).await.map_err(failed("nodes"))?;
            Ok(render_way(row, &tags, &nodes))
        }
        EntityKind::Relation => {
            let members = store
                .fetch_relation_members(row.id)
                .await
                .map_err(failed("members"))?;
            Ok(render_relation(row, &tags, &members))
        }
    }
}

/// Writes `rows` as a complete OSM XML document.
///
/// On error the document is left truncated and must be discarded.
pub async fn write_osm<S, W>(store: &S, rows: &[ElementRow], out: &mut W) -> Result<(), OutputError>
where
    S: OsmStore + ?Sized,
    W: Write,
{
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<osm version="{}" generator="{}">"#, OSM_VERSION, GENERATOR)?;

    let limit = store.concurrency().max(1);

    for kind in EntityKind::ALL {
        let phase: Vec<&ElementRow> = rows.iter().filter(|row| row.kind == kind).collect();
        info!(kind = kind.as_str(), count = phase.len(), "writing elements");

        // `buffered` yields in input order regardless of completion order
        let mut elements = stream::iter(phase)
            .map(|row| fetch_and_render(store, row))
            .buffered(limit);

        while let Some(element) = elements.try_next().await? {
            writeln!(out, "  {}", element)?;
        }
    }

    writeln!(out, "</osm>")?;
    out.flush()?;
    Ok(())
}

/// Renders `rows` into an in-memory document.
pub async fn to_osm_xml<S>(store: &S, rows: &[ElementRow]) -> Result<String, OutputError>
where
    S: OsmStore + ?Sized,
{
    let mut buffer = Vec::new();
    write_osm(store, rows, &mut buffer).await?;
    String::from_utf8(buffer).map_err(|e| OutputError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
