//! Pipeline state threaded through a call chain.
//!
//! A [`PipelineState`] names the relations currently holding the selected
//! nodes, ways and relations, together with the SQL statements that create
//! them. Builtins never edit a state; they derive a new one from it.

use std::fmt;

use serde::Serialize;

use crate::sql::{self, quote_ident};

/// A validated SQL identifier; displays double-quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validate `name` as a plain identifier
    pub fn new(name: &str) -> Option<Self> {
        quote_ident(name).map(|_| Ident(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// Entity kind selected by a pipeline source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Nodes,
    Ways,
    Relations,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Nodes, SourceKind::Ways, SourceKind::Relations];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Nodes => "nodes",
            SourceKind::Ways => "ways",
            SourceKind::Relations => "relations",
        }
    }
}

/// Relations currently holding each entity kind.
///
/// Each one exposes the same columns as the matching base table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub nodes: Ident,
    pub ways: Ident,
    pub relations: Ident,
}

impl Sources {
    /// The base tables, unfiltered
    pub fn base() -> Self {
        Sources {
            nodes: Ident(sql::NODES.to_string()),
            ways: Ident(sql::WAYS.to_string()),
            relations: Ident(sql::RELATIONS.to_string()),
        }
    }

    pub fn get(&self, kind: SourceKind) -> &Ident {
        match kind {
            SourceKind::Nodes => &self.nodes,
            SourceKind::Ways => &self.ways,
            SourceKind::Relations => &self.relations,
        }
    }

    /// Iterate in node, way, relation order
    pub fn iter(&self) -> impl Iterator<Item = &Ident> {
        [&self.nodes, &self.ways, &self.relations].into_iter()
    }
}

/// Working value of one compilation: accumulated SQL plus current sources.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    script: Vec<String>,
    sources: Sources,
}

impl PipelineState {
    /// Fresh state over the base tables with an empty script
    pub fn base() -> Self {
        PipelineState {
            script: Vec::new(),
            sources: Sources::base(),
        }
    }

    pub fn script(&self) -> &[String] {
        &self.script
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    /// Derive the next state: `statements` appended, sources renamed.
    pub fn advance(&self, statements: Vec<String>, sources: Sources) -> Self {
        let mut script = Vec::with_capacity(self.script.len() + statements.len());
        script.extend(self.script.iter().cloned());
        script.extend(statements);
        PipelineState { script, sources }
    }

    /// Derive the next state with only `statements` appended
    pub fn append(&self, statements: Vec<String>) -> Self {
        self.advance(statements, self.sources.clone())
    }

    pub fn into_script(self, session: &str) -> Script {
        Script {
            session: session.to_string(),
            statements: self.script,
        }
    }
}

/// Mints view names that are unique for the lifetime of one compilation.
///
/// Names are `_astro_<session>_<counter>_<kind>_<method>`. The counter is
/// bumped once per mint and shared by nested evaluations, so no two mints
/// within a session ever produce the same name.
#[derive(Debug)]
pub struct ViewNamer {
    session: String,
    counter: u32,
}

impl ViewNamer {
    /// Longest session id accepted; keeps names within PostgreSQL's 63 bytes
    pub const MAX_SESSION_LEN: usize = 16;

    /// Create a namer for `session`, which must be 1-16 lowercase ASCII
    /// letters or digits.
    pub fn new(session: &str) -> Option<Self> {
        let valid = !session.is_empty()
            && session.len() <= Self::MAX_SESSION_LEN
            && session.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        valid.then(|| ViewNamer {
            session: session.to_string(),
            counter: 0,
        })
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// Number of mints so far
    pub fn minted(&self) -> u32 {
        self.counter
    }

    /// Mint one fresh name per entity kind for a call to `method`.
    pub fn mint(&mut self, method: &str) -> Sources {
        self.counter += 1;
        let name = |kind: SourceKind| {
            let raw = format!("_astro_{}_{:04}_{}_{}", self.session, self.counter, kind.as_str(), method);
            // Builtin names are short identifiers; fall back to the bare stem otherwise
            Ident::new(&raw).unwrap_or_else(|| {
                Ident(format!("_astro_{}_{:04}_{}", self.session, self.counter, kind.as_str()))
            })
        };
        Sources {
            nodes: name(SourceKind::Nodes),
            ways: name(SourceKind::Ways),
            relations: name(SourceKind::Relations),
        }
    }
}

/// A compiled program: ordered statements, the last one producing rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Script {
    session: String,
    statements: Vec<String>,
}

impl Script {
    pub fn new(session: impl Into<String>, statements: Vec<String>) -> Self {
        Script {
            session: session.into(),
            statements,
        }
    }

    /// Session id the view names were minted under
    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Split into the row-producing query and the statements preceding it.
    pub fn split_last(&self) -> Option<(&String, &[String])> {
        self.statements.split_last()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Render as one SQL text, each statement terminated by `;`.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for stmt in &self.statements {
            out.push_str(stmt);
            out.push_str(";\n");
        }
        out
    }
}
