//! Cairn Core
//!
//! Parsing, normalization, round-trip checking and formatting of CMake code

pub mod ast;
pub mod builtins;
pub mod definitions;
pub mod equivalence;
pub mod formatter;
pub mod normalize;
pub mod syntax;

pub use equivalence::{EquivalenceError, verify_equivalence};
pub use normalize::{NormalizedTree, UnknownCommand};
pub use syntax::{Analyzer, ParseError, ParseErrorKind};
