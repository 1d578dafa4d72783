//! # Astrolabe - Abstract Syntax Tree
//!
//! This module defines the syntax tree for Astrolabe programs, a chain of
//! method calls over the OpenStreetMap entity sets (nodes, ways, relations).
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Method calls, arguments and whole programs
//!
//! ## Quick Start
//!
//! ```text
//! nodes().bbox(51.28, -0.51, 51.69, 0.33).output()
//! ```
//!
//! Keeps only nodes, narrows them to a box around London and emits them.
//!
//! ## Core Concepts
//!
//! ### Chains
//!
//! Every program is a chain of calls. Each call receives the pipeline built
//! by the calls before it:
//!
//! ```text
//! call().call(arg, ...). ... .output()
//! ```
//!
//! A chain must end in `output()`, and nothing may follow it.
//!
//! ### Arguments
//!
//! Arguments are numbers, distances (a number with a `km`, `mi`, `ft` or `m`
//! unit), strings, or nested method calls.
pub mod expressions;
pub mod tokens;

pub use expressions::{Expr, MethodCall, Program};
pub use tokens::Token;
