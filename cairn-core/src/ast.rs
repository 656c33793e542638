//! Tagged syntax tree shared by the analyzer, the normalization passes,
//! the equivalence checker and the formatter.
//!
//! The tree is a single generic node type: a [`NodeKind`] tag plus an ordered
//! list of children, each either a nested [`Node`] or a leaf [`Token`].

use std::fmt;

/// Byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// 1-based line and column of the span start
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        line_col(source, self.start)
    }
}

/// 1-based (line, column) of a byte offset; the column counts characters.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Leaf classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    BracketArgument,
    QuotedArgument,
    UnquotedArgument,
    LineComment,
    BracketComment,
    Newline,
    /// Run of spaces and tabs inside an argument list
    Space,
    /// Source text preceding a custom command on its line
    Indentation,
    /// Original text of a custom command's arguments
    Verbatim,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BracketComment)
    }

    pub fn is_argument(self) -> bool {
        matches!(
            self,
            TokenKind::BracketArgument | TokenKind::QuotedArgument | TokenKind::UnquotedArgument
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::BracketArgument => "bracket_argument",
            TokenKind::QuotedArgument => "quoted_argument",
            TokenKind::UnquotedArgument => "unquoted_argument",
            TokenKind::LineComment => "line_comment",
            TokenKind::BracketComment => "bracket_comment",
            TokenKind::Newline => "newline",
            TokenKind::Space => "space",
            TokenKind::Indentation => "indentation",
            TokenKind::Verbatim => "verbatim",
        }
    }
}

/// A leaf with its text and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Node tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    /// Flow-control construct: opener, bodies, middle commands and closer
    Block,
    BlockBody,
    CommandInvocation,
    /// Command outside the known set; reproduced verbatim
    CustomCommand,
    Arguments,
    /// Wrapper around a single argument token
    Argument,
    /// Nested `( ... )` inside an argument list
    ParenGroup,
    /// Argument grouped with the comment trailing it on the same line
    CommentedArgument,
    /// Comments on a line outside any command
    NonCommandElement,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Block => "block",
            NodeKind::BlockBody => "block_body",
            NodeKind::CommandInvocation => "command_invocation",
            NodeKind::CustomCommand => "custom_command",
            NodeKind::Arguments => "arguments",
            NodeKind::Argument => "argument",
            NodeKind::ParenGroup => "paren_group",
            NodeKind::CommentedArgument => "commented_argument",
            NodeKind::NonCommandElement => "non_command_element",
        }
    }

    pub fn is_command(self) -> bool {
        matches!(self, NodeKind::CommandInvocation | NodeKind::CustomCommand)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<Child>,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, span: Span, children: Vec<Child>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    /// Build a node whose span covers all of its children.
    ///
    /// Falls back to an empty span at `fallback` when there are no children.
    pub fn spanning(kind: NodeKind, children: Vec<Child>, fallback: usize) -> Self {
        let span = children
            .iter()
            .map(Child::span)
            .reduce(Span::cover)
            .unwrap_or(Span::new(fallback, fallback));
        Self::with_children(kind, span, children)
    }

    /// Name of a command node (`command_invocation` or `custom_command`)
    pub fn command_name(&self) -> Option<&str> {
        if !self.kind.is_command() {
            return None;
        }
        self.children.iter().find_map(|child| match child {
            Child::Token(token) if token.kind == TokenKind::Identifier => Some(token.text.as_str()),
            _ => None,
        })
    }

    /// First child node with the given kind
    pub fn child_node(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().find_map(|child| match child {
            Child::Node(node) if node.kind == kind => Some(node),
            _ => None,
        })
    }

    /// First child token with the given kind
    pub fn child_token(&self, kind: TokenKind) -> Option<&Token> {
        self.children.iter().find_map(|child| match child {
            Child::Token(token) if token.kind == kind => Some(token),
            _ => None,
        })
    }

    /// Rebuild the tree bottom-up.
    ///
    /// Children are rewritten first, then `f` receives the node with its new
    /// children and decides what replaces it: a node, a token, or nothing.
    pub fn transform<F>(self, f: &mut F) -> Option<Child>
    where
        F: FnMut(Node) -> Option<Child>,
    {
        let Node {
            kind,
            span,
            children,
        } = self;
        let mut rewritten = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Child::Node(node) => rewritten.extend(node.transform(f)),
                token => rewritten.push(token),
            }
        }
        f(Node::with_children(kind, span, rewritten))
    }

    /// Like [`Node::transform`] for a root that must stay a node.
    pub fn rewrite<F>(self, f: &mut F) -> Node
    where
        F: FnMut(Node) -> Option<Child>,
    {
        let (kind, span) = (self.kind, self.span);
        match self.transform(f) {
            Some(Child::Node(node)) => node,
            _ => Node::new(kind, span),
        }
    }

    /// Depth-first walk over every node, the root included
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            if let Child::Node(node) = child {
                node.walk(visit);
            }
        }
    }
}

/// Child of a node - either a nested node or a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Node(Node),
    Token(Token),
}

impl Child {
    pub fn span(&self) -> Span {
        match self {
            Child::Node(node) => node.span,
            Child::Token(token) => token.span,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            Child::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Child::Token(token) => Some(token),
            Child::Node(_) => None,
        }
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, Child::Token(token) if token.kind == TokenKind::Newline)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Child::Token(token) if token.kind.is_comment())
    }

    /// Value-bearing member of an argument list
    pub fn is_argument(&self) -> bool {
        match self {
            Child::Node(node) => matches!(node.kind, NodeKind::Argument | NodeKind::ParenGroup),
            Child::Token(token) => token.kind.is_argument(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, text: &str, start: usize) -> Child {
        Child::Token(Token::new(kind, text, Span::new(start, start + text.len())))
    }

    #[test]
    fn test_line_col() {
        let source = "foo()\n  bar(x)\n";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 8), (2, 3));
        assert_eq!(line_col(source, source.len()), (3, 1));
    }

    #[test]
    fn test_spanning_covers_children() {
        let node = Node::spanning(
            NodeKind::Arguments,
            vec![
                token(TokenKind::UnquotedArgument, "a", 4),
                token(TokenKind::Space, "  ", 5),
                token(TokenKind::UnquotedArgument, "b", 7),
            ],
            0,
        );
        assert_eq!(node.span, Span::new(4, 8));

        let empty = Node::spanning(NodeKind::Arguments, Vec::new(), 3);
        assert_eq!(empty.span, Span::new(3, 3));
    }

    #[test]
    fn test_transform_discards_and_unwraps() {
        let argument = Node::with_children(
            NodeKind::Argument,
            Span::new(0, 1),
            vec![token(TokenKind::UnquotedArgument, "a", 0)],
        );
        let root = Node::with_children(
            NodeKind::Arguments,
            Span::new(0, 2),
            vec![
                Child::Node(argument),
                token(TokenKind::Newline, "\n", 1),
            ],
        );

        let rewritten = root.rewrite(&mut |node: Node| match node.kind {
            NodeKind::Argument => node.children.into_iter().next(),
            NodeKind::Arguments => Some(Child::Node(Node::with_children(
                node.kind,
                node.span,
                node.children.into_iter().filter(|c| !c.is_newline()).collect(),
            ))),
            _ => Some(Child::Node(node)),
        });

        assert_eq!(rewritten.children.len(), 1);
        assert_eq!(
            rewritten.children[0].as_token().map(|t| t.text.as_str()),
            Some("a")
        );
    }

    #[test]
    fn test_command_name() {
        let command = Node::with_children(
            NodeKind::CommandInvocation,
            Span::new(0, 5),
            vec![
                token(TokenKind::Identifier, "set", 0),
                Child::Node(Node::new(NodeKind::Arguments, Span::new(4, 4))),
            ],
        );
        assert_eq!(command.command_name(), Some("set"));
        assert!(command.child_node(NodeKind::Arguments).is_some());
    }
}
