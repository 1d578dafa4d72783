//! Documentation content for the qastro CLI

use super::CliError;

/// Available documentation topics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocTopic {
    Syntax,
    Literals,
    Methods,
    Output,
    Schema,
}

impl DocTopic {
    /// Parse topic name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "syntax" | "grammar" => Some(Self::Syntax),
            "literals" | "literal" | "units" => Some(Self::Literals),
            "methods" | "method" | "builtins" => Some(Self::Methods),
            "output" | "xml" => Some(Self::Output),
            "schema" | "tables" => Some(Self::Schema),
            _ => None,
        }
    }
}

/// Get the docs overview (topic listing)
pub fn get_docs_overview() -> &'static str {
    r#"ASTROLABE DOCUMENTATION

Astrolabe is a small chaining language for selecting OpenStreetMap elements out
of a PostgreSQL database. A program is one chain of method calls; every call
narrows the current selection and the chain must end in output().

DOCUMENTATION TOPICS

  syntax            Chains, calls, arguments and comments
  literals          Numbers, strings and distances with units
  methods           nodes, ways, relations, bbox and output
  output            The OSM XML document written by 'qastro run'
  schema            Tables the generated SQL reads from

QUICK REFERENCE

  nodes()                       Keep only nodes
  bbox(s, w, n, e)              Keep elements inside a bounding box
  output()                      Emit the selection (required, last)

  nodes().bbox(51.4, -0.2, 51.6, 0.0).output()

Run 'qastro docs <topic>' for detailed documentation.
"#
}

/// Get documentation for a specific topic
pub fn get_doc_topic(name: &str) -> Result<&'static str, CliError> {
    match DocTopic::from_name(name) {
        Some(DocTopic::Syntax) => Ok(SYNTAX_DOC),
        Some(DocTopic::Literals) => Ok(LITERALS_DOC),
        Some(DocTopic::Methods) => Ok(METHODS_DOC),
        Some(DocTopic::Output) => Ok(OUTPUT_DOC),
        Some(DocTopic::Schema) => Ok(SCHEMA_DOC),
        None => Err(CliError::UnknownTopic(name.to_string())),
    }
}

const SYNTAX_DOC: &str = r#"SYNTAX

A program is a single chain of calls separated by dots:

  call ( '.' call )*

  call      = IDENTIFIER '(' [ argument ( ',' argument )* ] ')'
  argument  = NUMBER | DISTANCE | STRING | call

Whitespace and newlines between tokens are ignored. '//' starts a comment
that runs to the end of the line.

  // everything in central London
  bbox(51.4, -0.2, 51.6, 0.0)
    .output()

A call used as an argument is compiled against the whole database rather
than the chain it appears in. None of the built-in methods accept one.
"#;

const LITERALS_DOC: &str = r#"LITERALS

NUMBERS
  42   -0.12   .5   3.25
  Decimal only. A leading '-' binds to the number.

STRINGS
  "double"   'single'
  Escapes: \n \t \r \\ \" \'

DISTANCES
  A number followed by a unit, with or without a space:
    10km   2 mi   500ft   30m
  Units: km (kilometres), mi (miles), ft (feet), m (metres)

  Distances are parsed and typed, but no built-in method accepts one yet.
"#;

const METHODS_DOC: &str = r#"METHODS

nodes()      Keep only nodes; ways and relations become empty
ways()       Keep only ways
relations()  Keep only relations

bbox(south, west, north, east)
  Keep elements inside the box. All four arguments are numbers.
    south, north   -90 .. 90
    west, east     -180 .. 180
  Nodes are kept by coordinate. Ways are kept when any of their nodes is
  inside; relations when any member node or member way is.
  Arguments are checked in order: count, types, then ranges from south to
  east. An inverted box (south > north) is accepted and selects nothing.

output()
  Emit the current selection. Must be the last call, exactly once.

EXAMPLES
  nodes().bbox(51.4, -0.2, 51.6, 0.0).output()
  bbox(40.7, -74.1, 40.8, -73.9).ways().output()
  relations().output()
"#;

const OUTPUT_DOC: &str = r#"OUTPUT

'qastro run' writes an OSM 0.6 XML document:

  <?xml version="1.0" encoding="UTF-8"?>
  <osm version="0.6" generator="qastro">
    <node id="1" lat="51.5000000" lon="-0.1200000" version="3"><tag k="name" v="X"/></node>
    <way id="7"><nd ref="1"/><tag k="highway" v="path"/></way>
    <relation id="9"><member type="node" ref="1" role="stop"/></relation>
  </osm>

Nodes come first, then ways, then relations. Coordinates always carry seven
decimal places. Attributes with no value in the database are left out.
Way nodes and relation members keep their stored sequence.
"#;

const SCHEMA_DOC: &str = r#"SCHEMA

Base tables
  nodes(id, lat, lon, timestamp, uid, usr, visible, version, changeset)
  ways(id, timestamp, uid, usr, visible, version, changeset)
  relations(id, timestamp, uid, usr, visible, version, changeset)

Side tables
  node_tags(node_id, key, value)
  way_tags(way_id, key, value)
  relation_tags(relation_id, key, value)
  way_constituent_nodes(way_id, node_sequence, node_id)
  relation_constituent_nodes(relation_id, member_sequence, node_id, role)
  relation_constituent_ways(relation_id, member_sequence, way_id, role)

'qastro init' creates any of these that are missing.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_aliases() {
        assert_eq!(DocTopic::from_name("Methods"), Some(DocTopic::Methods));
        assert_eq!(DocTopic::from_name("units"), Some(DocTopic::Literals));
        assert_eq!(DocTopic::from_name("nope"), None);
    }

    #[test]
    fn unknown_topic_is_an_error() {
        assert!(matches!(get_doc_topic("nope"), Err(CliError::UnknownTopic(t)) if t == "nope"));
    }
}
