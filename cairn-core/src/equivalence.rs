//! Round-trip check between a source text and its formatted version
//!
//! Both texts go through the full analyzer. Everything that only affects
//! presentation (comments, whitespace, line breaks, custom command
//! indentation and comment-only lines) is erased, and what remains must be
//! structurally identical.

use crate::ast::{Child, Node, NodeKind, Span, TokenKind};
use crate::normalize::NormalizedTree;
use crate::syntax::{Analyzer, ParseError};

/// The formatter produced output that does not mean the same as its input.
///
/// Always a defect of the tool, never of the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EquivalenceError {
    /// The two trees differ after erasing cosmetic nodes
    #[error("formatted code differs from the original at line {line}: {detail}")]
    Mismatch { line: usize, detail: String },

    /// The original text no longer parses
    #[error("original code could not be parsed: {0}")]
    OriginalUnparsable(ParseError),

    /// The formatter emitted text the analyzer rejects
    #[error("formatted code could not be parsed: {0}")]
    FormattedUnparsable(ParseError),
}

/// Check that `formatted` is semantically equivalent to `original`
pub fn verify_equivalence(
    analyzer: &Analyzer,
    original: &str,
    formatted: &str,
) -> Result<(), EquivalenceError> {
    let lhs = analyzer
        .parse(original)
        .map_err(EquivalenceError::OriginalUnparsable)?;
    verify_against_tree(analyzer, &lhs, original, formatted)
}

/// Check `formatted` against the already analyzed `original`
pub(crate) fn verify_against_tree(
    analyzer: &Analyzer,
    tree: &NormalizedTree,
    original: &str,
    formatted: &str,
) -> Result<(), EquivalenceError> {
    let rhs = analyzer
        .parse(formatted)
        .map_err(EquivalenceError::FormattedUnparsable)?;

    match first_difference(tree.root(), rhs.root()) {
        None => {
            log::debug!("formatted code is equivalent to the original");
            Ok(())
        }
        Some((span, detail)) => {
            let (line, _) = span.line_col(original);
            Err(EquivalenceError::Mismatch { line, detail })
        }
    }
}

fn is_cosmetic(child: &Child) -> bool {
    match child {
        Child::Token(token) => {
            token.kind.is_comment()
                || matches!(
                    token.kind,
                    TokenKind::Space | TokenKind::Newline | TokenKind::Indentation
                )
        }
        Child::Node(node) => node.kind == NodeKind::NonCommandElement,
    }
}

fn significant(node: &Node) -> impl Iterator<Item = &Child> {
    node.children.iter().filter(|child| !is_cosmetic(child))
}

fn describe(child: &Child) -> String {
    match child {
        Child::Node(node) => match node.command_name() {
            Some(name) => format!("{} `{}`", node.kind, name),
            None => node.kind.to_string(),
        },
        Child::Token(token) => format!("{} `{}`", token.kind, token.text),
    }
}

/// Location in the original and description of the first structural
/// difference between two trees
fn first_difference(lhs: &Node, rhs: &Node) -> Option<(Span, String)> {
    if lhs.kind != rhs.kind {
        return Some((
            lhs.span,
            format!("expected {}, found {}", lhs.kind, rhs.kind),
        ));
    }

    let mut left = significant(lhs);
    let mut right = significant(rhs);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return None,
            (Some(l), None) => {
                return Some((l.span(), format!("{} is missing", describe(l))));
            }
            (None, Some(r)) => {
                return Some((
                    lhs.span,
                    format!("unexpected {} in {}", describe(r), lhs.kind),
                ));
            }
            (Some(l), Some(r)) => match (l, r) {
                (Child::Node(ln), Child::Node(rn)) => {
                    if let Some(difference) = first_difference(ln, rn) {
                        return Some(difference);
                    }
                }
                (Child::Token(lt), Child::Token(rt)) if lt.kind == rt.kind && lt.text == rt.text => {}
                _ => {
                    return Some((
                        l.span(),
                        format!("expected {}, found {}", describe(l), describe(r)),
                    ));
                }
            },
        }
    }
}
