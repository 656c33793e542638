//! Syntax analysis: pest grammar, tree building and error classification
//!
//! The raw tree stays inside the crate; callers only ever see normalized
//! trees.
//!
//! ```compile_fail
//! use cairn_core::syntax::ParseTree;
//! ```

mod builder;
mod error;

use pest::Parser;
use pest_derive::Parser;

use crate::builtins::CommandSet;
use crate::normalize::{self, NormalizedTree};

pub(crate) use builder::ParseTree;
pub use error::{ParseError, ParseErrorKind};

#[derive(Parser)]
#[grammar = "syntax/cmake.pest"]
pub(crate) struct CMakeParser;

/// Parses CMake source into normalized trees.
///
/// An analyzer only carries the set of commands it treats as reformattable.
/// `parse` keeps all intermediate state local to the call, so one instance
/// can serve any number of files; the CLI builds one per worker thread.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    commands: CommandSet,
}

impl Analyzer {
    /// Analyzer that knows only the CMake builtins
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer that also reformats the given user-defined commands
    pub fn with_definitions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            commands: CommandSet::with_extra(names),
        }
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// Parse and normalize `source`
    pub fn parse(&self, source: &str) -> Result<NormalizedTree, ParseError> {
        let tree = parse_tree(source)?;
        Ok(normalize::normalize(tree, source, &self.commands))
    }
}

/// Parse `source` without normalizing it
pub(crate) fn parse_tree(source: &str) -> Result<ParseTree, ParseError> {
    let pairs = CMakeParser::parse(Rule::file, source)
        .map_err(|error| error::classify(source, &error))?;
    let tree = builder::build_tree(source, pairs)?;
    log::debug!("parsed {} top-level elements", tree.root().children.len());
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_project() {
        let input = "cmake_minimum_required(VERSION 3.20)\nproject(demo LANGUAGES CXX)\n";
        assert!(Analyzer::new().parse(input).is_ok());
    }

    #[test]
    fn test_parse_with_comment() {
        let input = "# Header comment\nadd_library(demo STATIC a.cpp)\n";
        assert!(Analyzer::new().parse(input).is_ok());
    }

    #[test]
    fn test_parse_empty_source() {
        let tree = Analyzer::new().parse("").unwrap();
        assert!(tree.root().children.is_empty());
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let input = "set(A 1)\r\nset(B 2)\r\n";
        assert!(Analyzer::new().parse(input).is_ok());
    }

    #[test]
    fn test_parse_quoted_and_legacy_arguments() {
        let input = "set(FLAGS \"-Wall \\\"x\\\"\" -DNAME=\"value\" $ENV{HOME})\n";
        assert!(Analyzer::new().parse(input).is_ok());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = "if(A)\n  my_helper(x   y)  # note\nendif()\n\n\n\nmessage(STATUS done)\n";
        let analyzer = Analyzer::new();
        assert_eq!(analyzer.parse(input), analyzer.parse(input));
    }

    #[test]
    fn test_definitions_extend_known_commands() {
        let analyzer = Analyzer::with_definitions(["my_helper"]);
        assert!(analyzer.commands().contains("MY_HELPER"));
        let tree = analyzer.parse("my_helper(a b)\n").unwrap();
        assert!(tree.custom_commands().is_empty());
    }
}
