//! Main formatting logic

use super::config::{FormatConfig, ListExpansion};
use crate::ast::{Child, Node, NodeKind, Token, TokenKind};
use crate::equivalence::{EquivalenceError, verify_against_tree};
use crate::normalize::NormalizedTree;
use crate::syntax::{Analyzer, ParseError};

/// Why a file could not be formatted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The input is not valid CMake
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The formatter broke the code; this is a bug in cairn
    #[error("{0}\nThis is a bug in cairn, please report it")]
    Defect(#[from] EquivalenceError),
}

/// Format CMake code, treating only builtin commands as reformattable
pub fn format(source: &str, config: &FormatConfig) -> Result<String, FormatError> {
    format_with(&Analyzer::new(), source, config)
}

/// Format CMake code with a caller-provided analyzer
pub fn format_with(
    analyzer: &Analyzer,
    source: &str,
    config: &FormatConfig,
) -> Result<String, FormatError> {
    let tree = analyzer.parse(source)?;
    Ok(format_tree(analyzer, &tree, source, config)?)
}

/// Format an already analyzed `source`; `tree` must come from
/// `analyzer.parse(source)`
pub fn format_tree(
    analyzer: &Analyzer,
    tree: &NormalizedTree,
    source: &str,
    config: &FormatConfig,
) -> Result<String, EquivalenceError> {
    let formatted = render(tree, config);
    if !config.unsafe_mode {
        verify_against_tree(analyzer, tree, source, &formatted)?;
    }
    Ok(formatted)
}

/// Check if a file needs formatting
pub fn needs_format(source: &str, config: &FormatConfig) -> Result<bool, FormatError> {
    let formatted = format(source, config)?;
    Ok(formatted != source)
}

/// Render a normalized tree without checking the result
pub fn render(tree: &NormalizedTree, config: &FormatConfig) -> String {
    let formatter = Formatter::new(config.clone());
    formatter.format(tree.root())
}

/// Layout unit of an argument list
#[derive(Debug)]
enum Item<'t> {
    Atom(&'t str),
    /// Parenthesized sub-list
    Group(Vec<Item<'t>>),
    /// Argument followed by the comment on its line
    Commented {
        argument: Box<Item<'t>>,
        comment: &'t Token,
    },
    /// Comment on its own line
    Comment(&'t Token),
}

impl<'t> Item<'t> {
    fn collect(arguments: &'t Node) -> Vec<Item<'t>> {
        arguments.children.iter().filter_map(Item::from_child).collect()
    }

    fn from_child(child: &'t Child) -> Option<Item<'t>> {
        match child {
            Child::Token(token) if token.kind.is_argument() => Some(Item::Atom(&token.text)),
            Child::Token(token) if token.kind.is_comment() => Some(Item::Comment(token)),
            Child::Token(_) => None,
            Child::Node(node) => match node.kind {
                NodeKind::ParenGroup => Some(Item::Group(
                    node.child_node(NodeKind::Arguments)
                        .map(Item::collect)
                        .unwrap_or_default(),
                )),
                NodeKind::CommentedArgument => {
                    let mut parts = node.children.iter().filter_map(Item::from_child);
                    let argument = parts.next()?;
                    match parts.next() {
                        Some(Item::Comment(comment)) => Some(Item::Commented {
                            argument: Box::new(argument),
                            comment,
                        }),
                        _ => Some(argument),
                    }
                }
                NodeKind::Argument => node.children.first().and_then(Item::from_child),
                _ => None,
            },
        }
    }

    fn has_line_comment(&self) -> bool {
        match self {
            Item::Atom(_) => false,
            Item::Group(items) => items.iter().any(Item::has_line_comment),
            Item::Commented { argument, comment } => {
                comment.kind == TokenKind::LineComment || argument.has_line_comment()
            }
            Item::Comment(comment) => comment.kind == TokenKind::LineComment,
        }
    }

    fn ends_line(&self) -> bool {
        matches!(self, Item::Commented { comment, .. } if comment.kind == TokenKind::LineComment)
    }

    /// Single-line rendering; a line comment may only come last
    fn flat(&self) -> Option<String> {
        match self {
            Item::Atom(text) => Some(text.to_string()),
            Item::Group(items) => flat_list(items).map(|inner| format!("({})", inner)),
            Item::Commented { argument, comment } => argument
                .flat()
                .map(|text| format!("{} {}", text, comment.text)),
            Item::Comment(_) => None,
        }
    }
}

/// Space-separated rendering of a whole list, if nothing forces a break
fn flat_list(items: &[Item<'_>]) -> Option<String> {
    if items.iter().any(Item::has_line_comment) {
        return None;
    }
    let parts = items.iter().map(Item::flat).collect::<Option<Vec<_>>>()?;
    Some(parts.join(" "))
}

/// Widest line of a possibly multi-line text
fn width(text: &str) -> usize {
    text.split('\n')
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
}

struct Formatter {
    config: FormatConfig,
    indent: String,
    output: String,
    current_indent: usize,
    line_open: bool,
}

impl Formatter {
    fn new(config: FormatConfig) -> Self {
        let indent = config.indent_string();
        Self {
            config,
            indent,
            output: String::new(),
            current_indent: 0,
            line_open: false,
        }
    }

    fn format(mut self, root: &Node) -> String {
        self.format_body(root);
        self.output
    }

    /// Statements of a file or block body, leaving the last line terminated
    fn format_body(&mut self, node: &Node) {
        for child in &node.children {
            match child {
                Child::Token(token) if token.kind == TokenKind::Newline => {
                    self.write_newline();
                }
                Child::Token(_) => {}
                Child::Node(child_node) => self.format_node(child_node),
            }
        }
        self.end_line();
    }

    fn format_node(&mut self, node: &Node) {
        match node.kind {
            NodeKind::Block => self.format_block(node),
            NodeKind::CommandInvocation => {
                self.start_statement();
                self.format_command(node);
            }
            NodeKind::CustomCommand => {
                self.start_statement();
                self.format_custom_command(node);
            }
            NodeKind::NonCommandElement => self.format_comments(node),
            NodeKind::BlockBody => {
                self.end_line();
                self.current_indent += 1;
                self.format_body(node);
                self.current_indent -= 1;
            }
            _ => {}
        }
    }

    /// Opener, bodies and closer; the closer's line stays open for its comments
    fn format_block(&mut self, node: &Node) {
        for child in &node.children {
            if let Child::Node(child_node) = child {
                self.format_node(child_node);
            }
        }
    }

    fn format_comments(&mut self, node: &Node) {
        if self.line_open {
            self.write(" ");
        } else {
            self.write_indent();
            self.line_open = true;
        }
        let comments: Vec<&str> = node
            .children
            .iter()
            .filter_map(Child::as_token)
            .filter(|token| token.kind.is_comment())
            .map(|token| token.text.as_str())
            .collect();
        self.write(&comments.join(" "));
    }

    fn format_command(&mut self, node: &Node) {
        let name = node.command_name().unwrap_or_default();
        let items = node
            .child_node(NodeKind::Arguments)
            .map(Item::collect)
            .unwrap_or_default();

        self.write(name);
        self.write("(");
        if items.is_empty() {
            self.write(")");
            return;
        }

        if let Some(inline) = flat_list(&items) {
            let used = self.indent_width(self.current_indent) + name.chars().count() + 1;
            if !inline.contains('\n') && used + inline.chars().count() + 1 <= self.config.line_length
            {
                self.write(&inline);
                self.write(")");
                return;
            }
        }

        self.write_newline();
        for line in self.layout(&items, self.current_indent + 1) {
            self.write(&line);
            self.write_newline();
        }
        self.write_indent();
        self.write(")");
        self.line_open = true;
    }

    fn format_custom_command(&mut self, node: &Node) {
        let name = node.command_name().unwrap_or_default();
        let verbatim = node
            .child_token(TokenKind::Verbatim)
            .map_or("", |token| token.text.as_str());
        self.write(name);
        self.write("(");
        self.write(verbatim);
        self.write(")");
    }

    /// Lines (indentation included) for the items of an expanded list
    fn layout(&self, items: &[Item<'_>], level: usize) -> Vec<String> {
        let indent = self.indent.repeat(level);
        let mut lines = Vec::new();
        let mut current = String::new();

        let flush = |lines: &mut Vec<String>, current: &mut String| {
            if !current.is_empty() {
                lines.push(format!("{}{}", indent, current));
                current.clear();
            }
        };

        for item in items {
            if let Item::Comment(comment) = item {
                flush(&mut lines, &mut current);
                lines.push(format!("{}{}", indent, comment.text));
                continue;
            }

            let text = item
                .flat()
                .filter(|text| !matches!(item, Item::Group(_)) || self.fits(level, text));
            let Some(text) = text else {
                flush(&mut lines, &mut current);
                lines.extend(self.expand(item, level));
                continue;
            };

            let packs = self.config.list_expansion == ListExpansion::FavourInlining
                && !current.is_empty()
                && self.fits(level, &format!("{} {}", current, text));
            if !packs {
                flush(&mut lines, &mut current);
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&text);
            if item.ends_line() {
                flush(&mut lines, &mut current);
            }
        }
        flush(&mut lines, &mut current);
        lines
    }

    /// Multi-line rendering of a single item
    fn expand(&self, item: &Item<'_>, level: usize) -> Vec<String> {
        let indent = self.indent.repeat(level);
        match item {
            Item::Atom(text) => vec![format!("{}{}", indent, text)],
            Item::Comment(comment) => vec![format!("{}{}", indent, comment.text)],
            Item::Group(items) => {
                let mut lines = vec![format!("{}(", indent)];
                lines.extend(self.layout(items, level + 1));
                lines.push(format!("{})", indent));
                lines
            }
            Item::Commented { argument, comment } => {
                let mut lines = self.expand(argument, level);
                if let Some(last) = lines.last_mut() {
                    last.push(' ');
                    last.push_str(&comment.text);
                }
                lines
            }
        }
    }

    fn fits(&self, level: usize, text: &str) -> bool {
        self.indent_width(level) + width(text) <= self.config.line_length
    }

    fn indent_width(&self, level: usize) -> usize {
        self.indent.chars().count() * level
    }

    fn start_statement(&mut self) {
        self.end_line();
        self.write_indent();
        self.line_open = true;
    }

    fn end_line(&mut self) {
        if self.line_open {
            self.write_newline();
        }
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn write_indent(&mut self) {
        let indent = self.indent.repeat(self.current_indent);
        self.output.push_str(&indent);
    }

    fn write_newline(&mut self) {
        self.output.push('\n');
        self.line_open = false;
    }
}
