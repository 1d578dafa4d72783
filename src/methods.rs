//! Builtin method table.
//!
//! Every builtin takes the current [`PipelineState`] and its evaluated
//! arguments, checks them, and returns a new state whose sources are freshly
//! minted views. Validation happens before any SQL is produced, so a failing
//! call leaves nothing behind.

use std::fmt;

use crate::{
    evaluator::ValidationError,
    pipeline::{Ident, PipelineState, SourceKind, Sources, ViewNamer},
    sql,
    value::Argument,
};

/// Named bound of a bounding box, in argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    South,
    West,
    North,
    East,
}

impl Bound {
    pub const ORDER: [Bound; 4] = [Bound::South, Bound::West, Bound::North, Bound::East];

    /// Inclusive range the bound must fall in
    pub fn range(self) -> (f64, f64) {
        match self {
            Bound::South | Bound::North => (-90.0, 90.0),
            Bound::West | Bound::East => (-180.0, 180.0),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bound::South => "southern",
            Bound::West => "western",
            Bound::North => "northern",
            Bound::East => "eastern",
        })
    }
}

/// Methods callable from an Astrolabe program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Nodes,
    Ways,
    Relations,
    Bbox,
    Output,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Nodes,
        Builtin::Ways,
        Builtin::Relations,
        Builtin::Bbox,
        Builtin::Output,
    ];

    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Nodes => "nodes",
            Builtin::Ways => "ways",
            Builtin::Relations => "relations",
            Builtin::Bbox => "bbox",
            Builtin::Output => "output",
        }
    }

    /// Terminal methods end a chain; nothing may follow them
    pub fn is_terminal(self) -> bool {
        matches!(self, Builtin::Output)
    }

    pub fn apply(
        self,
        state: &PipelineState,
        args: &[Argument],
        namer: &mut ViewNamer,
    ) -> Result<PipelineState, ValidationError> {
        match self {
            Builtin::Nodes => method_keep(self, SourceKind::Nodes, state, args, namer),
            Builtin::Ways => method_keep(self, SourceKind::Ways, state, args, namer),
            Builtin::Relations => method_keep(self, SourceKind::Relations, state, args, namer),
            Builtin::Bbox => method_bbox(state, args, namer),
            Builtin::Output => method_output(state, args),
        }
    }
}

fn expect_arity(method: Builtin, args: &[Argument], expected: usize) -> Result<(), ValidationError> {
    if args.len() != expected {
        return Err(ValidationError::Arity {
            method: method.name(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

/// The argument at `index` as a plain number
fn number_arg(method: Builtin, args: &[Argument], index: usize) -> Result<f64, ValidationError> {
    let arg = &args[index];
    arg.as_literal()
        .and_then(|lit| lit.as_number())
        .ok_or(ValidationError::ArgumentType {
            method: method.name(),
            position: index + 1,
            expected: "number",
            found: arg.type_name(),
        })
}

fn create_view(name: &Ident, body: String) -> String {
    format!("CREATE VIEW {} AS {}", name, body)
}

fn select_all(source: &Ident) -> String {
    format!("SELECT * FROM {}", source)
}

fn select_none(source: &Ident) -> String {
    format!("SELECT * FROM {} WHERE FALSE", source)
}

/// .nodes() / .ways() / .relations() - keep one kind, empty the others
fn method_keep(
    method: Builtin,
    keep: SourceKind,
    state: &PipelineState,
    args: &[Argument],
    namer: &mut ViewNamer,
) -> Result<PipelineState, ValidationError> {
    expect_arity(method, args, 0)?;

    let current = state.sources();
    let next = namer.mint(method.name());

    let statements = SourceKind::ALL
        .into_iter()
        .map(|kind| {
            let source = current.get(kind);
            let body = if kind == keep {
                select_all(source)
            } else {
                select_none(source)
            };
            create_view(next.get(kind), body)
        })
        .collect();

    Ok(state.advance(statements, next))
}

/// .bbox(south, west, north, east) - nodes inside the box, plus the ways
/// and relations that reference them
fn method_bbox(
    state: &PipelineState,
    args: &[Argument],
    namer: &mut ViewNamer,
) -> Result<PipelineState, ValidationError> {
    let method = Builtin::Bbox;
    expect_arity(method, args, 4)?;

    let mut bounds = [0.0; 4];
    for (index, slot) in bounds.iter_mut().enumerate() {
        *slot = number_arg(method, args, index)?;
    }

    for (bound, value) in Bound::ORDER.into_iter().zip(bounds) {
        let (min, max) = bound.range();
        if !(min..=max).contains(&value) {
            return Err(ValidationError::OutOfRange {
                method: method.name(),
                bound,
                value,
                min,
                max,
            });
        }
    }

    // In range implies finite, so rendering cannot fail
    let [south, west, north, east] = bounds.map(|v| sql::number(v).unwrap_or_default());

    let current = state.sources();
    let next = namer.mint(method.name());

    let nodes = create_view(
        &next.nodes,
        format!(
            "SELECT * FROM {} WHERE lat BETWEEN {} AND {} AND lon BETWEEN {} AND {}",
            current.nodes, south, north, west, east
        ),
    );
    let ways = create_view(
        &next.ways,
        format!(
            "SELECT * FROM {} WHERE id IN (SELECT DISTINCT way_id FROM {} WHERE node_id IN (SELECT id FROM {}))",
            current.ways,
            sql::WAY_CONSTITUENT_NODES,
            next.nodes
        ),
    );
    let relations = create_view(
        &next.relations,
        format!(
            "SELECT * FROM {} WHERE id IN (\
SELECT relation_id FROM {} WHERE node_id IN (SELECT id FROM {}) \
UNION \
SELECT relation_id FROM {} WHERE way_id IN (SELECT id FROM {}))",
            current.relations,
            sql::RELATION_CONSTITUENT_NODES,
            next.nodes,
            sql::RELATION_CONSTITUENT_WAYS,
            next.ways
        ),
    );

    Ok(state.advance(vec![nodes, ways, relations], next))
}

/// .output() - the row-producing query over the current sources
fn method_output(state: &PipelineState, args: &[Argument]) -> Result<PipelineState, ValidationError> {
    expect_arity(Builtin::Output, args, 0)?;
    Ok(state.append(vec![output_query(state.sources())]))
}

/// Union of all three sources with a `type` discriminator column.
pub fn output_query(sources: &Sources) -> String {
    let common = sql::COMMON_COLUMNS.join(", ");
    format!(
        "SELECT 'node' AS type, id, lat, lon, {common} FROM {}\n\
UNION ALL\n\
SELECT 'way' AS type, id, NULL::numeric AS lat, NULL::numeric AS lon, {common} FROM {}\n\
UNION ALL\n\
SELECT 'relation' AS type, id, NULL::numeric AS lat, NULL::numeric AS lon, {common} FROM {}",
        sources.nodes, sources.ways, sources.relations
    )
}
