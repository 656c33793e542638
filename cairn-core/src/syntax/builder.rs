//! Build the raw tree from pest pairs

use pest::iterators::{Pair, Pairs};

use super::Rule;
use super::error::{ParseError, ParseErrorKind};
use crate::ast::{Child, Node, NodeKind, Span, Token, TokenKind};

/// Raw tree straight out of the grammar.
///
/// Still holds empty comment elements, newline tokens inside argument lists
/// and unclassified command invocations; only the normalization pipeline
/// turns it into something the formatter accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseTree {
    root: Node,
}

impl ParseTree {
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub(crate) fn into_root(self) -> Node {
        self.root
    }
}

/// Build a tree from pest parse result
pub(crate) fn build_tree(source: &str, pairs: Pairs<'_, Rule>) -> Result<ParseTree, ParseError> {
    let builder = TreeBuilder::new(source);
    builder.build(pairs)
}

struct TreeBuilder<'a> {
    source: &'a str,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn build(self, pairs: Pairs<'a, Rule>) -> Result<ParseTree, ParseError> {
        let mut elements = Vec::new();

        for pair in pairs {
            if pair.as_rule() == Rule::file {
                for inner in pair.into_inner() {
                    if let Some(child) = self.build_child(inner) {
                        elements.push(child);
                    }
                }
            }
        }

        let root = BlockAssembler::new(self.source).assemble(elements)?;
        Ok(ParseTree { root })
    }

    fn build_child(&self, pair: Pair<'a, Rule>) -> Option<Child> {
        let span = pair_span(&pair);

        match pair.as_rule() {
            Rule::command_invocation => Some(self.build_node(NodeKind::CommandInvocation, pair)),
            Rule::non_command_element => {
                Some(self.build_node(NodeKind::NonCommandElement, pair))
            }
            Rule::arguments => Some(self.build_node(NodeKind::Arguments, pair)),
            Rule::paren_group => Some(self.build_node(NodeKind::ParenGroup, pair)),
            Rule::argument => Some(self.build_node(NodeKind::Argument, pair)),

            Rule::identifier => Some(token(TokenKind::Identifier, &pair, span)),
            Rule::bracket_argument => Some(token(TokenKind::BracketArgument, &pair, span)),
            Rule::quoted_argument => Some(token(TokenKind::QuotedArgument, &pair, span)),
            Rule::unquoted_argument => Some(token(TokenKind::UnquotedArgument, &pair, span)),
            Rule::bracket_comment => Some(token(TokenKind::BracketComment, &pair, span)),
            Rule::line_comment => Some(token(TokenKind::LineComment, &pair, span)),
            Rule::space => Some(token(TokenKind::Space, &pair, span)),
            Rule::newline => Some(token(TokenKind::Newline, &pair, span)),

            // EOI, parentheses and the pieces of a bracket argument
            _ => None,
        }
    }

    fn build_node(&self, kind: NodeKind, pair: Pair<'a, Rule>) -> Child {
        let span = pair_span(&pair);
        let children = pair
            .into_inner()
            .filter_map(|inner| self.build_child(inner))
            .collect();

        Child::Node(Node::with_children(kind, span, children))
    }
}

fn pair_span(pair: &Pair<'_, Rule>) -> Span {
    let pest_span = pair.as_span();
    Span::new(pest_span.start(), pest_span.end())
}

fn token(kind: TokenKind, pair: &Pair<'_, Rule>, span: Span) -> Child {
    Child::Token(Token::new(kind, pair.as_str(), span))
}

/// Role of a command in flow-control nesting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockRole {
    Opener { closer: &'static str },
    /// `elseif` / `else`, only valid inside an `if`
    Middle,
    Closer,
    Plain,
}

const BLOCK_COMMANDS: &[(&str, &str)] = &[
    ("if", "endif"),
    ("foreach", "endforeach"),
    ("while", "endwhile"),
    ("function", "endfunction"),
    ("macro", "endmacro"),
    ("block", "endblock"),
];

fn block_role(name: &str) -> BlockRole {
    if let Some((_, closer)) = BLOCK_COMMANDS.iter().find(|(opener, _)| *opener == name) {
        return BlockRole::Opener { closer: *closer };
    }
    if name == "elseif" || name == "else" {
        return BlockRole::Middle;
    }
    if BLOCK_COMMANDS.iter().any(|(_, closer)| *closer == name) {
        return BlockRole::Closer;
    }
    BlockRole::Plain
}

struct OpenBlock {
    name: String,
    closer: &'static str,
    start: usize,
    children: Vec<Child>,
    body: Vec<Child>,
}

impl OpenBlock {
    /// Close the current body and append it to the block
    fn seal_body(&mut self, fallback: usize) {
        let body = std::mem::take(&mut self.body);
        self.children
            .push(Child::Node(Node::spanning(NodeKind::BlockBody, body, fallback)));
    }
}

/// Groups flat file elements into nested `block` nodes
struct BlockAssembler<'a> {
    source: &'a str,
}

impl<'a> BlockAssembler<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn assemble(&self, elements: Vec<Child>) -> Result<Node, ParseError> {
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut root: Vec<Child> = Vec::new();
        let mut elements = elements.into_iter().peekable();

        while let Some(element) = elements.next() {
            let name = match &element {
                Child::Node(node) if node.kind == NodeKind::CommandInvocation => {
                    node.command_name().map(str::to_ascii_lowercase)
                }
                _ => None,
            };
            let role = name.as_deref().map_or(BlockRole::Plain, block_role);
            let position = element.span();

            match role {
                BlockRole::Plain => match stack.last_mut() {
                    Some(open) => open.body.push(element),
                    None => root.push(element),
                },
                BlockRole::Opener { closer } => {
                    let mut open = OpenBlock {
                        name: name.unwrap_or_default(),
                        closer,
                        start: position.start,
                        children: vec![element],
                        body: Vec::new(),
                    };
                    absorb_line_tail(&mut elements, &mut open.children);
                    stack.push(open);
                }
                BlockRole::Middle => {
                    let open = stack
                        .last_mut()
                        .filter(|open| open.name == "if")
                        .ok_or_else(|| self.unbalanced(position.start))?;
                    open.seal_body(position.start);
                    open.children.push(element);
                    absorb_line_tail(&mut elements, &mut open.children);
                }
                BlockRole::Closer => {
                    let mut open = match stack.pop() {
                        Some(open) if Some(open.closer) == name.as_deref() => open,
                        _ => return Err(self.unbalanced(position.start)),
                    };
                    open.seal_body(position.start);
                    open.children.push(element);
                    let block = Node::with_children(
                        NodeKind::Block,
                        Span::new(open.start, position.end),
                        open.children,
                    );
                    match stack.last_mut() {
                        Some(parent) => parent.body.push(Child::Node(block)),
                        None => root.push(Child::Node(block)),
                    }
                }
            }
        }

        if let Some(open) = stack.first() {
            return Err(self.unbalanced(open.start));
        }

        Ok(Node::with_children(
            NodeKind::File,
            Span::new(0, self.source.len()),
            root,
        ))
    }

    fn unbalanced(&self, offset: usize) -> ParseError {
        ParseError::at(ParseErrorKind::GenericParsingError, self.source, offset)
    }
}

/// Move the comments that follow a block command on its line into the block
/// and drop the newline terminating that line.
fn absorb_line_tail<I>(elements: &mut std::iter::Peekable<I>, children: &mut Vec<Child>)
where
    I: Iterator<Item = Child>,
{
    while let Some(next) = elements.peek() {
        if next.is_newline() {
            elements.next();
            break;
        }
        match next {
            Child::Node(node) if node.kind == NodeKind::NonCommandElement => {
                children.extend(elements.next());
            }
            _ => break,
        }
    }
}
