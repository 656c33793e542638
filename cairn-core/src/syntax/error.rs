//! Parse errors and their classification
//!
//! Grammar failures only say which rules were expected where the parse
//! stopped. To turn that into something a user can act on, the failure is
//! compared against the failures of a few known-bad snippets; a snippet that
//! fails the same way lends its error kind to the real input.

use std::fmt;

use pest::Parser;
use pest::error::{Error as PestError, ErrorVariant, InputLocation};

use super::{CMakeParser, Rule};
use crate::ast::line_col;

/// Characters of context shown on each side of the failure point
const CONTEXT_SPAN: usize = 40;

/// Known-bad snippets per error kind, matched in this order
const ERROR_EXAMPLES: &[(ParseErrorKind, &[&str])] = &[
    (
        ParseErrorKind::UnbalancedBrackets,
        &[
            "foo(foo [[foo]=]",
            "foo([=[foo bar]])",
            "foo([=[foo bar ]==])",
            "foo(foo [=[foo bar ]==] foo)",
        ],
    ),
    (
        ParseErrorKind::UnbalancedParentheses,
        &[
            "foo(bar",
            "foo(bar\n",
            "foo(BAR (BAZ)",
            "foo(# )",
            "foo(bar))",
            "foo)",
            "foo(BAR (BAZ)))",
            "foo(BAR (BAZ FOO)))",
            "foo",
            "foo # (",
            "foo(commented_argument #foobar)",
            "foo(commented_argument #[[foobar]]",
            "foo(almost_commented_argument #)",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    UnbalancedBrackets,
    UnbalancedParentheses,
    GenericParsingError,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ParseErrorKind::UnbalancedBrackets => "Unbalanced brackets",
            ParseErrorKind::UnbalancedParentheses => "Unbalanced parentheses",
            ParseErrorKind::GenericParsingError => "Parsing error",
        };
        f.write_str(message)
    }
}

/// Malformed input, with the position and surrounding text of the failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {line}, column {column}:\n{context}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub context: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    /// Error of `kind` located at byte `offset` of `source`
    pub fn at(kind: ParseErrorKind, source: &str, offset: usize) -> Self {
        let (line, column) = line_col(source, offset);
        ParseError {
            kind,
            context: context_snippet(source, offset),
            line,
            column,
        }
    }
}

/// Rules expected (and rejected) at the furthest point a parse reached
#[derive(Debug, Clone, PartialEq, Eq)]
struct FailureSignature {
    positives: Vec<Rule>,
    negatives: Vec<Rule>,
}

impl FailureSignature {
    fn of(error: &PestError<Rule>) -> Option<Self> {
        match &error.variant {
            ErrorVariant::ParsingError {
                positives,
                negatives,
            } => Some(Self {
                positives: sorted(positives),
                negatives: sorted(negatives),
            }),
            ErrorVariant::CustomError { .. } => None,
        }
    }
}

fn sorted(rules: &[Rule]) -> Vec<Rule> {
    let mut rules = rules.to_vec();
    rules.sort();
    rules.dedup();
    rules
}

/// Turn a grammar failure on `source` into a typed error
pub(crate) fn classify(source: &str, error: &PestError<Rule>) -> ParseError {
    let offset = match error.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    let kind = FailureSignature::of(error)
        .and_then(|signature| match_examples(&signature))
        .unwrap_or(ParseErrorKind::GenericParsingError);
    log::debug!("classified parse failure at byte {} as {:?}", offset, kind);
    ParseError::at(kind, source, offset)
}

/// Replay the catalogue and return the kind of the first snippet whose
/// failure looks like `signature`
fn match_examples(signature: &FailureSignature) -> Option<ParseErrorKind> {
    ERROR_EXAMPLES.iter().find_map(|(kind, snippets)| {
        snippets
            .iter()
            .any(|snippet| match CMakeParser::parse(Rule::file, snippet) {
                Ok(_) => false,
                Err(error) => FailureSignature::of(&error).as_ref() == Some(signature),
            })
            .then_some(*kind)
    })
}

/// The failing line around `offset` with a caret under the failure column
pub(crate) fn context_snippet(source: &str, offset: usize) -> String {
    let offset = floor_char_boundary(source, offset.min(source.len()));
    let (head, tail) = source.split_at(offset);

    let line_head = head.rsplit('\n').next().unwrap_or("");
    let skip = line_head.chars().count().saturating_sub(CONTEXT_SPAN);
    let before: String = line_head.chars().skip(skip).collect();

    let after: String = tail
        .split('\n')
        .next()
        .unwrap_or("")
        .chars()
        .take(CONTEXT_SPAN)
        .collect();

    let padding: String = before
        .chars()
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();

    format!("{}{}\n{}^\n", before, after.trim_end_matches('\r'), padding)
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
