//! Declaration binding and name resolution.
//!
//! Binding runs in two phases over the scanned candidates. The first phase
//! interns every declaration into the symbol table in (unit, offset) order,
//! merging partial declarations as it goes. The second phase resolves
//! attribute and base-list references against the finished table, so
//! forward references and cross-unit references cost nothing special.

use super::symbols::{
    simple_key, AttributeUse, BaseRef, PropertyMember, SymbolId, SymbolTable, TypeKind, TypeSymbol,
};
use crate::scan::{Candidate, Candidates};
use crate::syntax::{
    body_of, children_of_kind, declared_name, first_of_kind, name_node, named_children, node_text,
    Compilation, Span,
};
use tree_sitter::Node;

const ACCESSIBILITY: &[&str] = &["public", "private", "protected", "internal", "file"];

pub struct Binder<'a> {
    compilation: &'a Compilation,
}

impl<'a> Binder<'a> {
    pub fn new(compilation: &'a Compilation) -> Self {
        Self { compilation }
    }

    pub fn bind(&self, candidates: &Candidates<'a>, table: &mut SymbolTable) {
        let mut ordered: Vec<(&Candidate<'a>, TypeKind)> = candidates
            .interfaces
            .iter()
            .map(|candidate| (candidate, TypeKind::Interface))
            .chain(candidates.classes.iter().map(|candidate| (candidate, TypeKind::Class)))
            .collect();
        // Bind order is load-bearing: the first symbol bound under a simple
        // name owns it, and unit 0 is the canonical marker unit
        ordered.sort_by_key(|(candidate, _)| (candidate.unit, candidate.node.start_byte()));

        for (candidate, kind) in ordered {
            self.bind_declaration(candidate, kind, table);
        }

        let unit_usings: Vec<Vec<String>> = candidates
            .usings
            .iter()
            .map(|directives| {
                directives
                    .iter()
                    .filter_map(|directive| using_namespace(directive))
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        self.resolve_references(table, &unit_usings);
    }

    fn bind_declaration(&self, candidate: &Candidate<'a>, kind: TypeKind, table: &mut SymbolTable) {
        let source = &self.compilation.unit(candidate.unit).text;
        let node = candidate.node;

        // Declarations mangled enough to lose their name are unbindable;
        // nothing downstream can refer to them either
        let Some(name_node) = name_node(node) else { return };
        let name = node_text(name_node, source).trim().to_string();
        if name.is_empty() {
            return;
        }

        let (type_params, arity) = type_parameters(node, source);
        let (namespace, containers) = self.enclosing_path(node, candidate.unit);

        let mut accessibility = Vec::new();
        let mut is_partial = false;
        for modifier in children_of_kind(node, "modifier") {
            let text = node_text(modifier, source);
            if text == "partial" {
                is_partial = true;
            } else if ACCESSIBILITY.contains(&text) {
                accessibility.push(text.to_string());
            }
        }

        // Attribute resolution is the expensive part of a run; interfaces
        // that carry no attribute list skip it outright
        let attributes = if kind == TypeKind::Interface && candidate.has_attributes {
            collect_attributes(node, source, candidate.unit)
        } else {
            Vec::new()
        };
        let properties = if kind == TypeKind::Interface {
            collect_properties(node, source, candidate.unit)
        } else {
            Vec::new()
        };

        table.bind(TypeSymbol {
            id: SymbolId::UNBOUND,
            kind,
            name,
            arity,
            type_params,
            namespace,
            containers,
            accessibility,
            is_partial,
            unit: candidate.unit,
            span: Span::of(name_node),
            attributes,
            bases: collect_bases(node, source, candidate.unit),
            properties,
        });
    }

    /// Namespace and container-type path enclosing a declaration,
    /// outermost first
    fn enclosing_path(&self, node: Node<'a>, unit: usize) -> (Vec<String>, Vec<String>) {
        let source = &self.compilation.unit(unit).text;
        let mut namespaces: Vec<Vec<String>> = Vec::new();
        let mut containers: Vec<String> = Vec::new();

        let mut current = node;
        while let Some(parent) = current.parent() {
            match parent.kind() {
                "namespace_declaration" | "file_scoped_namespace_declaration" => {
                    namespaces.push(namespace_parts(parent, source));
                }
                "class_declaration"
                | "interface_declaration"
                | "struct_declaration"
                | "record_declaration"
                | "record_struct_declaration" => {
                    if let Some(container) = declared_name(parent, source) {
                        containers.push(container);
                    }
                }
                _ => {}
            }
            current = parent;
        }

        // Declarations following a file-scoped namespace can parse as its
        // siblings rather than its children; the namespace still applies
        if namespaces.is_empty() {
            let root = self.compilation.unit(unit).root();
            if let Some(scoped) = first_of_kind(root, "file_scoped_namespace_declaration") {
                if scoped.end_byte() <= node.start_byte() {
                    namespaces.push(namespace_parts(scoped, source));
                }
            }
        }

        let namespace = namespaces.into_iter().rev().flatten().collect();
        containers.reverse();
        (namespace, containers)
    }

    /// Second phase: resolve every attribute and base reference against the
    /// fully populated table. Computed immutably first, written back after.
    /// References resolve under the using directives of the unit that
    /// states them, not the unit of the first declaration.
    fn resolve_references(&self, table: &mut SymbolTable, unit_usings: &[Vec<String>]) {
        let usings_of =
            |unit: usize| unit_usings.get(unit).map(Vec::as_slice).unwrap_or_default();
        for index in 0..table.len() {
            let (scope, attribute_refs, base_refs) = {
                let symbol = &table.symbols()[index];
                let mut scope = symbol.namespace.clone();
                scope.extend(symbol.containers.iter().cloned());
                let attribute_refs: Vec<(String, usize)> =
                    symbol.attributes.iter().map(|a| (a.name.clone(), a.unit)).collect();
                let base_refs: Vec<(String, usize, usize)> =
                    symbol.bases.iter().map(|b| (b.name.clone(), b.arity, b.unit)).collect();
                (scope, attribute_refs, base_refs)
            };

            let resolved_attributes: Vec<Option<SymbolId>> = attribute_refs
                .iter()
                .map(|(name, unit)| resolve_attribute(table, &scope, usings_of(*unit), name))
                .collect();
            let resolved_bases: Vec<Option<SymbolId>> = base_refs
                .iter()
                .map(|(name, arity, unit)| {
                    resolve_name(table, &scope, usings_of(*unit), name, *arity)
                })
                .collect();

            let id = table.symbols()[index].id;
            let symbol = table.get_mut(id);
            for (attribute, resolved) in symbol.attributes.iter_mut().zip(resolved_attributes) {
                attribute.resolved = resolved;
            }
            for (base, resolved) in symbol.bases.iter_mut().zip(resolved_bases) {
                base.resolved = resolved;
            }
        }
    }
}

/// Resolve a (possibly dotted) name against enclosing scopes, innermost
/// out, then through the unit's using imports, then fall back to the
/// first-bound simple-name index. The fallback keeps names landing for
/// sources fed in without the rest of their project.
fn resolve_name(
    table: &SymbolTable,
    scope: &[String],
    usings: &[String],
    name: &str,
    arity: usize,
) -> Option<SymbolId> {
    let key = simple_key(name, arity);
    for depth in (0..=scope.len()).rev() {
        let qualified = if depth == 0 {
            key.clone()
        } else {
            format!("{}.{}", scope[..depth].join("."), key)
        };
        if let Some(id) = table.lookup(&qualified) {
            return Some(id);
        }
    }
    if name.contains('.') {
        return None;
    }
    // Using directives import type names, not nested namespaces, so only
    // undotted names consult them. Two imports supplying the same name is
    // an ambiguity in the source language; the reference stays unresolved.
    let mut imported = None;
    for namespace in usings {
        let Some(id) = table.lookup(&format!("{}.{}", namespace, key)) else { continue };
        match imported {
            Some(winner) if winner != id => return None,
            _ => imported = Some(id),
        }
    }
    imported.or_else(|| table.lookup_simple(&key))
}

/// Attribute names resolve as written first, then with the conventional
/// `Attribute` suffix appended
fn resolve_attribute(
    table: &SymbolTable,
    scope: &[String],
    usings: &[String],
    name: &str,
) -> Option<SymbolId> {
    if let Some(id) = resolve_name(table, scope, usings, name, 0) {
        return Some(id);
    }
    if !name.ends_with("Attribute") {
        let suffixed = format!("{}Attribute", name);
        return resolve_name(table, scope, usings, &suffixed, 0);
    }
    None
}

fn namespace_parts(node: Node, source: &str) -> Vec<String> {
    node.child_by_field_name("name")
        .map(|name| {
            node_text(name, source)
                .split('.')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn type_parameters(node: Node, source: &str) -> (String, usize) {
    match first_of_kind(node, "type_parameter_list") {
        Some(list) => {
            let arity = children_of_kind(list, "type_parameter").len();
            (node_text(list, source).trim().to_string(), arity)
        }
        None => (String::new(), 0),
    }
}

fn collect_attributes(node: Node, source: &str, unit: usize) -> Vec<AttributeUse> {
    let mut attributes = Vec::new();
    for list in children_of_kind(node, "attribute_list") {
        for attribute in children_of_kind(list, "attribute") {
            let Some(name) = attribute.child_by_field_name("name") else { continue };
            let text = strip_global(node_text(name, source));
            let (name, _) = split_generic(text);
            if name.is_empty() {
                continue;
            }
            attributes.push(AttributeUse {
                name,
                unit,
                span: Span::of(attribute),
                resolved: None,
            });
        }
    }
    attributes
}

fn collect_bases(node: Node, source: &str, unit: usize) -> Vec<BaseRef> {
    let Some(base_list) = first_of_kind(node, "base_list") else {
        return Vec::new();
    };
    let mut bases = Vec::new();
    for entry in named_children(base_list) {
        if let Some(base) = base_reference(entry, source, unit) {
            bases.push(base);
        }
    }
    bases
}

fn base_reference(node: Node, source: &str, unit: usize) -> Option<BaseRef> {
    let text = match node.kind() {
        "identifier" | "qualified_name" | "generic_name" | "alias_qualified_name" => {
            node_text(node, source)
        }
        // Record base with constructor arguments wraps the type
        "primary_constructor_base_type" => {
            let ty = node.named_child(0)?;
            node_text(ty, source)
        }
        _ => return None,
    };
    let (name, arity) = split_generic(strip_global(text));
    if name.is_empty() {
        return None;
    }
    Some(BaseRef { name, arity, unit, resolved: None })
}

fn collect_properties(node: Node, source: &str, unit: usize) -> Vec<PropertyMember> {
    let Some(body) = body_of(node) else { return Vec::new() };
    let mut properties = Vec::new();
    for property in children_of_kind(body, "property_declaration") {
        // The name field only; an identifier scan could land on the type
        let Some(name) = property.child_by_field_name("name") else { continue };
        let Some(ty) = property.child_by_field_name("type") else { continue };
        properties.push(PropertyMember {
            name: node_text(name, source).to_string(),
            ty: node_text(ty, source).trim().to_string(),
            span: Span::of(name),
            unit,
        });
    }
    properties
}

fn strip_global(text: &str) -> &str {
    text.strip_prefix("global::").unwrap_or(text)
}

/// Namespace imported by a using directive. `None` for alias and
/// `using static` forms, which do not bring a namespace into scope.
fn using_namespace(directive: &str) -> Option<&str> {
    let text = directive.trim();
    let text = text.strip_prefix("global ").map(str::trim_start).unwrap_or(text);
    let text = text.strip_prefix("using")?;
    let text = strip_global(text.strip_suffix(';').unwrap_or(text).trim());
    if text.is_empty() || text.starts_with("static ") || text.contains('=') {
        return None;
    }
    Some(text)
}

/// Split `Demo.IBox<int, List<string>>` into (`Demo.IBox`, 2)
fn split_generic(text: &str) -> (String, usize) {
    let Some(open) = text.find('<') else {
        return (text.trim().to_string(), 0);
    };
    let name = text[..open].trim().to_string();
    let close = text.rfind('>').unwrap_or(text.len()).max(open + 1);
    let mut depth = 0usize;
    let mut arity = 1usize;
    for ch in text[open + 1..close].chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => arity += 1,
            _ => {}
        }
    }
    (name, arity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan;
    use crate::syntax::SourceUnit;

    fn bind_units(units: Vec<SourceUnit>) -> SymbolTable {
        let (compilation, diagnostics) = Compilation::parse(units);
        assert!(diagnostics.is_empty(), "unexpected parse diagnostics");
        let mut table = SymbolTable::new();
        let candidates = scan(&compilation);
        Binder::new(&compilation).bind(&candidates, &mut table);
        table
    }

    fn bind_source(source: &str) -> SymbolTable {
        bind_units(vec![SourceUnit::new("test.cs", source)])
    }

    fn symbol<'t>(table: &'t SymbolTable, metadata_name: &str) -> &'t TypeSymbol {
        let id = table
            .lookup(metadata_name)
            .unwrap_or_else(|| panic!("symbol '{}' not bound", metadata_name));
        table.get(id)
    }

    #[test]
    fn test_binds_namespace_qualified_symbols() {
        let table = bind_source(
            r#"
namespace Demo
{
    interface IThing { }
    partial class Impl : IThing { }
}
"#,
        );
        assert_eq!(symbol(&table, "Demo.IThing").kind, TypeKind::Interface);
        assert_eq!(symbol(&table, "Demo.Impl").kind, TypeKind::Class);
        assert!(symbol(&table, "Demo.Impl").is_partial);
    }

    #[test]
    fn test_resolves_base_within_namespace() {
        let table = bind_source(
            r#"
namespace Demo
{
    interface IThing { }
    class Impl : IThing { }
}
"#,
        );
        let interface = table.lookup("Demo.IThing");
        assert_eq!(symbol(&table, "Demo.Impl").bases[0].resolved, interface);
    }

    #[test]
    fn test_resolves_simple_name_across_namespaces() {
        let table = bind_units(vec![
            SourceUnit::new(
                "lib.cs",
                "namespace Lib\n{\n    interface IThing { }\n}\n",
            ),
            SourceUnit::new(
                "app.cs",
                "using Lib;\n\nnamespace App\n{\n    class Impl : IThing { }\n}\n",
            ),
        ]);
        let interface = table.lookup("Lib.IThing");
        assert!(interface.is_some());
        assert_eq!(symbol(&table, "App.Impl").bases[0].resolved, interface);
    }

    #[test]
    fn test_using_directive_disambiguates_across_namespaces() {
        let table = bind_units(vec![
            SourceUnit::new("alpha.cs", "namespace Alpha\n{\n    interface IThing { }\n}\n"),
            SourceUnit::new("beta.cs", "namespace Beta\n{\n    interface IThing { }\n}\n"),
            SourceUnit::new(
                "app.cs",
                "using Beta;\n\nnamespace App\n{\n    class Impl : IThing { }\n}\n",
            ),
        ]);
        let imported = table.lookup("Beta.IThing");
        assert!(imported.is_some());
        assert_eq!(symbol(&table, "App.Impl").bases[0].resolved, imported);
    }

    #[test]
    fn test_ambiguous_using_imports_stay_unresolved() {
        let table = bind_units(vec![
            SourceUnit::new("alpha.cs", "namespace Alpha\n{\n    interface IThing { }\n}\n"),
            SourceUnit::new("beta.cs", "namespace Beta\n{\n    interface IThing { }\n}\n"),
            SourceUnit::new(
                "app.cs",
                "using Alpha;\nusing Beta;\n\nnamespace App\n{\n    class Impl : IThing { }\n}\n",
            ),
        ]);
        assert_eq!(symbol(&table, "App.Impl").bases[0].resolved, None);
    }

    #[test]
    fn test_enclosing_namespace_beats_using_import() {
        let table = bind_units(vec![
            SourceUnit::new("lib.cs", "namespace Lib\n{\n    interface IThing { }\n}\n"),
            SourceUnit::new(
                "app.cs",
                "using Lib;\n\nnamespace App\n{\n    interface IThing { }\n\n    class Impl : IThing { }\n}\n",
            ),
        ]);
        let local = table.lookup("App.IThing");
        assert!(local.is_some());
        assert_eq!(symbol(&table, "App.Impl").bases[0].resolved, local);
    }

    #[test]
    fn test_partial_declaration_bases_resolve_in_their_own_unit() {
        // Each declaration of a partial type resolves its stated bases
        // under its own file's using directives
        let table = bind_units(vec![
            SourceUnit::new("alpha.cs", "namespace Alpha\n{\n    interface IThing { }\n}\n"),
            SourceUnit::new("beta.cs", "namespace Beta\n{\n    interface IThing { }\n}\n"),
            SourceUnit::new(
                "first.cs",
                "using Alpha;\n\nnamespace App\n{\n    partial class Impl : IThing { }\n}\n",
            ),
            SourceUnit::new(
                "second.cs",
                "using Beta;\n\nnamespace App\n{\n    partial class Impl { }\n}\n",
            ),
        ]);
        let imported = table.lookup("Alpha.IThing");
        assert!(imported.is_some());
        assert_eq!(symbol(&table, "App.Impl").bases[0].resolved, imported);
    }

    #[test]
    fn test_unresolved_base_stays_none() {
        let table = bind_source("namespace Demo\n{\n    class Impl : IDisposable { }\n}\n");
        assert_eq!(symbol(&table, "Demo.Impl").bases[0].resolved, None);
    }

    #[test]
    fn test_resolves_attribute_with_suffix_retry() {
        let table = bind_source(
            r#"
namespace Demo
{
    class MarkAttribute { }

    [Mark]
    interface IThing { }
}
"#,
        );
        let attribute_class = table.lookup("Demo.MarkAttribute");
        assert_eq!(symbol(&table, "Demo.IThing").attributes[0].resolved, attribute_class);
    }

    #[test]
    fn test_merges_partial_interface_across_units() {
        let table = bind_units(vec![
            SourceUnit::new(
                "a.cs",
                "namespace Demo\n{\n    partial interface IThing\n    {\n        int First { get; set; }\n    }\n}\n",
            ),
            SourceUnit::new(
                "b.cs",
                "namespace Demo\n{\n    partial interface IThing\n    {\n        string Second { get; set; }\n    }\n}\n",
            ),
        ]);
        let merged = symbol(&table, "Demo.IThing");
        let names: Vec<_> = merged.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(merged.properties[0].unit, 0);
        assert_eq!(merged.properties[1].unit, 1);
    }

    #[test]
    fn test_generic_interface_binds_with_arity() {
        let table = bind_source(
            r#"
namespace Demo
{
    interface IBox<T>
    {
        T Value { get; set; }
    }

    class Impl : IBox<int> { }
}
"#,
        );
        let interface = symbol(&table, "Demo.IBox`1");
        assert_eq!(interface.arity, 1);
        assert_eq!(interface.type_params, "<T>");
        assert_eq!(symbol(&table, "Demo.Impl").bases[0].resolved, Some(interface.id));
    }

    #[test]
    fn test_file_scoped_namespace_applies_to_declarations() {
        let table = bind_source("namespace Demo.Scoped;\n\ninterface IThing { }\n\nclass Impl : IThing { }\n");
        let interface = table.lookup("Demo.Scoped.IThing");
        assert!(interface.is_some());
        assert_eq!(symbol(&table, "Demo.Scoped.Impl").bases[0].resolved, interface);
    }

    #[test]
    fn test_nested_class_records_containers() {
        let table = bind_source(
            r#"
namespace Demo
{
    class Outer
    {
        class Inner { }
    }
}
"#,
        );
        let nested = symbol(&table, "Demo.Outer.Inner");
        assert!(nested.is_nested());
        assert_eq!(nested.containers, vec!["Outer".to_string()]);
    }

    #[test]
    fn test_accessibility_modifiers_are_kept_in_order() {
        let table = bind_source("namespace Demo\n{\n    protected internal partial class Impl { }\n}\n");
        let class = symbol(&table, "Demo.Impl");
        assert_eq!(class.accessibility, vec!["protected".to_string(), "internal".to_string()]);
        assert!(class.is_partial);
    }

    #[test]
    fn test_split_generic_counts_top_level_arguments() {
        assert_eq!(split_generic("IBox<int, List<string>>"), ("IBox".to_string(), 2));
        assert_eq!(split_generic("Demo.IBox<T>"), ("Demo.IBox".to_string(), 1));
        assert_eq!(split_generic("IThing"), ("IThing".to_string(), 0));
    }

    #[test]
    fn test_using_namespace_extracts_plain_imports() {
        assert_eq!(using_namespace("using System;"), Some("System"));
        assert_eq!(
            using_namespace("using System.Collections.Generic;"),
            Some("System.Collections.Generic")
        );
        assert_eq!(using_namespace("global using System;"), Some("System"));
        assert_eq!(using_namespace("using global::Alpha;"), Some("Alpha"));
        assert_eq!(using_namespace("using static System.Math;"), None);
        assert_eq!(using_namespace("using Shapes = Custom.Geometry;"), None);
    }
}
