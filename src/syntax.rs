//! Source units and their parsed views.
//!
//! Everything downstream works against a `Compilation`: one tree-sitter tree
//! per unit, in a fixed order, with the synthetic marker unit always first.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use serde::Serialize;
use tree_sitter::{Node, Tree};

/// Position in source code (byte offset plus 0-indexed line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Byte offset in source
    pub byte: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in bytes)
    pub col: usize,
}

impl Position {
    pub fn new() -> Self {
        Self { byte: 0, line: 0, col: 0 }
    }
}

/// Span in source code (a range from start position to end position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn zero() -> Self {
        Self { start: Position::new(), end: Position::new() }
    }

    pub fn of(node: Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start: Position { byte: node.start_byte(), line: start.row, col: start.column },
            end: Position { byte: node.end_byte(), line: end.row, col: end.column },
        }
    }
}

/// One input file, before parsing
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub name: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), text: text.into() }
    }
}

/// A source unit together with its parsed tree
pub struct ParsedUnit {
    pub name: String,
    pub text: String,
    pub tree: Tree,
}

impl ParsedUnit {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// All parsed units of one analysis run
pub struct Compilation {
    units: Vec<ParsedUnit>,
}

impl Compilation {
    /// Parse every unit with the C# grammar. Units the parser yields no tree
    /// for are dropped here and reported; the rest of the run continues.
    pub fn parse(units: Vec<SourceUnit>) -> (Self, Vec<Diagnostic>) {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
            .expect("Failed to load C# grammar");

        let mut parsed = Vec::with_capacity(units.len());
        let mut diagnostics = Vec::new();
        for unit in units {
            match parser.parse(&unit.text, None) {
                Some(tree) => parsed.push(ParsedUnit { name: unit.name, text: unit.text, tree }),
                None => diagnostics.push(Diagnostic::new(
                    DiagnosticKind::ParseFailure,
                    format!("failed to parse '{}'", unit.name),
                    unit.name.clone(),
                    Span::zero(),
                )),
            }
        }

        (Self { units: parsed }, diagnostics)
    }

    pub fn units(&self) -> &[ParsedUnit] {
        &self.units
    }

    pub fn unit(&self, index: usize) -> &ParsedUnit {
        &self.units[index]
    }
}

/// Source text covered by a node
pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Named children of a node, in document order
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Named children of a given kind, in document order
pub fn children_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    named_children(node).into_iter().filter(|n| n.kind() == kind).collect()
}

/// First named child of a given kind
pub fn first_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|n| n.kind() == kind)
}

/// Body of a type or namespace declaration
pub fn body_of(node: Node) -> Option<Node> {
    node.child_by_field_name("body")
        .or_else(|| first_of_kind(node, "declaration_list"))
}

/// Declared name of a declaration node. Prefers the grammar's `name` field,
/// falls back to the first identifier child. `None` for declarations left
/// incomplete by parse damage.
pub fn declared_name(node: Node, source: &str) -> Option<String> {
    let name_node = node
        .child_by_field_name("name")
        .or_else(|| first_of_kind(node, "identifier"))?;
    if name_node.is_missing() {
        return None;
    }
    let text = node_text(name_node, source);
    if text.is_empty() { None } else { Some(text.to_string()) }
}

/// Name node of a declaration, for spans
pub fn name_node<'t>(node: Node<'t>) -> Option<Node<'t>> {
    node.child_by_field_name("name")
        .or_else(|| first_of_kind(node, "identifier"))
}
