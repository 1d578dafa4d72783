pub mod ast;
pub mod cli;
pub mod config;
pub mod evaluator;
pub mod executor;
pub mod lexer;
pub mod methods;
pub mod model;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod sql;
pub mod store;
pub mod value;

pub use ast::{Expr, MethodCall, Program, Token};
pub use config::StoreConfig;
pub use evaluator::{CompileError, Evaluator, ValidationError, compile};
pub use lexer::{LexError, Lexer, Position};
pub use methods::{Bound, Builtin};
pub use model::{ElementRow, EntityKind, MemberType, RelationMember, Tag, WayNode};
pub use output::{OutputError, to_osm_xml, write_osm};
pub use parser::{ParseError, Parser, parse};
pub use pipeline::{Ident, PipelineState, Script, SourceKind, Sources, ViewNamer};
pub use store::{DatabaseError, OsmStore, PgStore};
pub use value::{Argument, Literal, Unit};
