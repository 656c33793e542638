//! Command names defined by `function` and `macro` blocks

use crate::ast::{Child, Node, NodeKind, TokenKind};
use crate::syntax::{Analyzer, ParseError};

/// Names of every function and macro defined in `sources`, in order of
/// appearance and without duplicates
pub fn collect_definitions<I, S>(analyzer: &Analyzer, sources: I) -> Result<Vec<String>, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = Vec::new();
    for source in sources {
        let tree = analyzer.parse(source.as_ref())?;
        tree.root().walk(&mut |node| {
            if let Some(name) = defined_name(node)
                && !names.iter().any(|known| known.eq_ignore_ascii_case(name))
            {
                names.push(name.to_string());
            }
        });
    }
    log::debug!("collected {} command definitions", names.len());
    Ok(names)
}

/// Name introduced by a `function(...)` or `macro(...)` block
fn defined_name(block: &Node) -> Option<&str> {
    if block.kind != NodeKind::Block {
        return None;
    }
    let opener = block.children.first()?.as_node()?;
    let keyword = opener.command_name()?;
    if !keyword.eq_ignore_ascii_case("function") && !keyword.eq_ignore_ascii_case("macro") {
        return None;
    }
    let arguments = opener.child_node(NodeKind::Arguments)?;
    arguments.children.iter().find_map(argument_text)
}

fn argument_text(child: &Child) -> Option<&str> {
    match child {
        Child::Token(token) if token.kind == TokenKind::UnquotedArgument => Some(token.text.as_str()),
        Child::Token(token) if token.kind == TokenKind::QuotedArgument => {
            Some(token.text.trim_matches('"'))
        }
        Child::Node(node) if node.kind == NodeKind::CommentedArgument => {
            node.children.iter().find_map(argument_text)
        }
        _ => None,
    }
}
