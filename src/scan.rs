//! Syntactic pass over parsed units. Collects type declarations worth
//! binding and the using directives each unit carries. No name resolution
//! happens here; candidates are raw nodes plus the one syntactic fact the
//! binder wants up front (whether any attribute list is present).

use crate::syntax::{body_of, children_of_kind, node_text, Compilation};
use tree_sitter::Node;

/// A type declaration found during scanning
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Index of the unit this declaration lives in
    pub unit: usize,
    pub node: Node<'a>,
    /// Whether the declaration carries at least one attribute list.
    /// Interfaces without attributes still bind (they can appear in base
    /// lists) but skip attribute resolution entirely.
    pub has_attributes: bool,
}

/// Everything one scan pass produces
#[derive(Debug)]
pub struct Candidates<'a> {
    pub interfaces: Vec<Candidate<'a>>,
    pub classes: Vec<Candidate<'a>>,
    /// Using directive text per unit, in declaration order
    pub usings: Vec<Vec<String>>,
}

pub fn scan(compilation: &Compilation) -> Candidates<'_> {
    let mut candidates = Candidates {
        interfaces: Vec::new(),
        classes: Vec::new(),
        usings: vec![Vec::new(); compilation.units().len()],
    };
    for (index, unit) in compilation.units().iter().enumerate() {
        walk(unit.root(), index, &unit.text, &mut candidates);
    }
    candidates
}

fn walk<'a>(node: Node<'a>, unit: usize, source: &str, out: &mut Candidates<'a>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "using_directive" => {
                out.usings[unit].push(node_text(child, source).to_string());
            }
            "interface_declaration" => {
                out.interfaces.push(candidate(unit, child));
                walk_body(child, unit, source, out);
            }
            "class_declaration" => {
                out.classes.push(candidate(unit, child));
                walk_body(child, unit, source, out);
            }
            "struct_declaration" | "record_declaration" | "record_struct_declaration" => {
                // Not candidates themselves, but they can nest one
                walk_body(child, unit, source, out);
            }
            // File-scoped namespaces parse their declarations as children in
            // some grammar versions and as compilation-unit siblings in
            // others; recursing here covers the first case and the outer
            // loop covers the second.
            "namespace_declaration"
            | "file_scoped_namespace_declaration"
            | "declaration_list" => {
                walk(child, unit, source, out);
            }
            _ => {}
        }
    }
}

fn walk_body<'a>(declaration: Node<'a>, unit: usize, source: &str, out: &mut Candidates<'a>) {
    if let Some(body) = body_of(declaration) {
        walk(body, unit, source, out);
    }
}

fn candidate(unit: usize, node: Node<'_>) -> Candidate<'_> {
    Candidate {
        unit,
        node,
        has_attributes: !children_of_kind(node, "attribute_list").is_empty(),
    }
}
