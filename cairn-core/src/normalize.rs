//! Normalization pipeline
//!
//! Four rewrites turn a raw parse tree into the tree the formatter renders:
//!
//! 1. commands outside the known set become `custom_command` nodes carrying
//!    their original argument text,
//! 2. comments trailing an argument on its line are grouped with it,
//! 3. empty comment elements, newlines inside argument lists and single-child
//!    argument wrappers are removed,
//! 4. blank lines at the edges of a body are dropped and longer runs are
//!    collapsed to one.
//!
//! Each step relies on what the previous ones established (the verbatim text
//! is captured before anything else touches argument lists, and blank-line
//! runs are only counted once empty elements are gone), so the steps are only
//! reachable through [`Analyzer::parse`](crate::Analyzer::parse), always in
//! this order:
//!
//! ```compile_fail
//! use cairn_core::normalize::isolate_commented_arguments;
//! ```

use crate::ast::{Child, Node, NodeKind, Span, Token, TokenKind};
use crate::builtins::CommandSet;
use crate::syntax::ParseTree;

/// A line terminator plus one blank line
const MAX_CONSECUTIVE_NEWLINES: usize = 2;

/// Tree ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTree {
    root: Node,
}

/// A command the formatter will reproduce verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCommand<'a> {
    pub name: &'a str,
    pub span: Span,
}

impl NormalizedTree {
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Every custom command in source order
    pub fn custom_commands(&self) -> Vec<UnknownCommand<'_>> {
        let mut commands = Vec::new();
        self.root.walk(&mut |node| {
            if node.kind == NodeKind::CustomCommand
                && let Some(name) = node.command_name()
            {
                commands.push(UnknownCommand {
                    name,
                    span: node.span,
                });
            }
        });
        commands
    }
}

pub(crate) fn normalize(tree: ParseTree, source: &str, commands: &CommandSet) -> NormalizedTree {
    let root = tree.into_root();
    let root = preserve_custom_formatting(root, source, commands);
    let root = isolate_commented_arguments(root);
    let root = simplify_tree(root);
    let root = collapse_blank_lines(root);
    NormalizedTree { root }
}

fn preserve_custom_formatting(root: Node, source: &str, commands: &CommandSet) -> Node {
    root.rewrite(&mut |node: Node| {
        if node.kind != NodeKind::CommandInvocation {
            return Some(Child::Node(node));
        }
        match node.command_name() {
            Some(name) if !commands.contains(name) => {
                Some(Child::Node(make_custom_command(node, source)))
            }
            _ => Some(Child::Node(node)),
        }
    })
}

/// `custom_command`: indentation, identifier, arguments, verbatim text
fn make_custom_command(node: Node, source: &str) -> Node {
    let Node { span, children, .. } = node;
    let line_start = source[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let indentation = Token::new(
        TokenKind::Indentation,
        &source[line_start..span.start],
        Span::new(line_start, span.start),
    );

    let mut identifier = None;
    let mut arguments = None;
    for child in children {
        match child {
            Child::Token(token) if token.kind == TokenKind::Identifier => identifier = Some(token),
            Child::Node(node) if node.kind == NodeKind::Arguments => arguments = Some(node),
            _ => {}
        }
    }
    let identifier =
        identifier.unwrap_or_else(|| Token::new(TokenKind::Identifier, "", Span::new(span.start, span.start)));
    let arguments = arguments.unwrap_or_else(|| Node::new(NodeKind::Arguments, Span::new(span.end, span.end)));

    let verbatim_text = if arguments.children.is_empty() {
        ""
    } else {
        &source[arguments.span.start..arguments.span.end]
    };
    let verbatim = Token::new(TokenKind::Verbatim, verbatim_text, arguments.span);

    Node::with_children(
        NodeKind::CustomCommand,
        span,
        vec![
            Child::Token(indentation),
            Child::Token(identifier),
            Child::Node(arguments),
            Child::Token(verbatim),
        ],
    )
}

fn isolate_commented_arguments(root: Node) -> Node {
    root.rewrite(&mut |node: Node| {
        if node.kind != NodeKind::Arguments {
            return Some(Child::Node(node));
        }
        let Node {
            kind,
            span,
            children,
        } = node;

        let mut grouped = Vec::with_capacity(children.len());
        let mut pending: Vec<Child> = Vec::new();
        for child in children {
            if child.is_argument() {
                grouped.append(&mut pending);
            }
            let closes_group = child.is_comment();
            let flushes = child.is_newline();
            pending.push(child);

            if closes_group && pending.first().is_some_and(Child::is_argument) {
                let group = std::mem::take(&mut pending);
                grouped.push(Child::Node(Node::spanning(
                    NodeKind::CommentedArgument,
                    group,
                    span.start,
                )));
            }
            if flushes {
                grouped.append(&mut pending);
            }
        }
        grouped.append(&mut pending);

        Some(Child::Node(Node::with_children(kind, span, grouped)))
    })
}

fn simplify_tree(root: Node) -> Node {
    root.rewrite(&mut |node: Node| match node.kind {
        NodeKind::NonCommandElement if node.children.is_empty() => None,
        NodeKind::Arguments => {
            let Node {
                kind,
                span,
                children,
            } = node;
            let children = children.into_iter().filter(|c| !c.is_newline()).collect();
            Some(Child::Node(Node::with_children(kind, span, children)))
        }
        NodeKind::Argument if node.children.len() == 1 => node.children.into_iter().next(),
        _ => Some(Child::Node(node)),
    })
}

fn collapse_blank_lines(root: Node) -> Node {
    root.rewrite(&mut |node: Node| match node.kind {
        NodeKind::File | NodeKind::BlockBody => Some(Child::Node(collapse_body(node))),
        _ => Some(Child::Node(node)),
    })
}

fn collapse_body(node: Node) -> Node {
    let Node {
        kind,
        span,
        mut children,
    } = node;
    while children.last().is_some_and(Child::is_newline) {
        children.pop();
    }

    let mut consecutive = 0;
    let children = children
        .into_iter()
        .skip_while(Child::is_newline)
        .filter(|child| {
            if child.is_newline() {
                consecutive += 1;
                consecutive <= MAX_CONSECUTIVE_NEWLINES
            } else {
                consecutive = 0;
                true
            }
        })
        .collect();

    Node::with_children(kind, span, children)
}
