//! Contract matching. Decides which interfaces are contracts (marker
//! attribute resolved to the canonical symbol, never matched by name) and
//! which classes owe them members (any contract in the transitive closure
//! of their interface bases).

use super::symbols::{BaseRef, SymbolId, SymbolTable, TypeKind, TypeSymbol};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::marker::MarkerDescriptor;
use crate::syntax::Compilation;
use std::collections::HashSet;

/// The interfaces whose attribute lists resolved to the canonical marker
pub struct ContractSet {
    ids: HashSet<SymbolId>,
}

impl ContractSet {
    pub fn discover(table: &SymbolTable, marker: MarkerDescriptor) -> Self {
        let ids = table
            .symbols()
            .iter()
            .filter(|symbol| symbol.kind == TypeKind::Interface)
            .filter(|symbol| {
                symbol.attributes.iter().any(|attribute| attribute.resolved == Some(marker.symbol))
            })
            .map(|symbol| symbol.id)
            .collect();
        Self { ids }
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// A class owing contract members, with its contracts in discovery order
#[derive(Debug)]
pub struct ClassMatch {
    pub class: SymbolId,
    pub contracts: Vec<SymbolId>,
}

/// Match every bound class against the contract set. Classes that implement
/// a contract but cannot be extended are reported and skipped; one bad
/// class never affects the others.
pub fn match_contracts(
    compilation: &Compilation,
    table: &SymbolTable,
    marker: MarkerDescriptor,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ClassMatch> {
    let contracts = ContractSet::discover(table, marker);
    if contracts.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for class in table.symbols() {
        if class.kind != TypeKind::Class || class.id == marker.symbol {
            continue;
        }
        let owed: Vec<SymbolId> = interface_closure(table, class)
            .into_iter()
            .filter(|id| contracts.contains(*id))
            .collect();
        if owed.is_empty() {
            continue;
        }

        let file = &compilation.unit(class.unit).name;
        if class.is_nested() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::NestedClass,
                    format!(
                        "class '{}' implements a contract interface but is nested inside another type",
                        class.display_name()
                    ),
                    file.clone(),
                    class.span,
                )
                .with_help(format!(
                    "move '{}' to namespace scope; generated declarations only extend top-level classes",
                    class.name
                )),
            );
            continue;
        }
        if !class.is_partial {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::NotPartial,
                    format!(
                        "class '{}' implements a contract interface but is not declared partial",
                        class.display_name()
                    ),
                    file.clone(),
                    class.span,
                )
                .with_help("add the 'partial' modifier so generated members can attach in a separate declaration"),
            );
            continue;
        }

        matches.push(ClassMatch { class: class.id, contracts: owed });
    }
    matches
}

/// Transitive closure of a class's interface bases, pre-order, each
/// interface once. Resolved class bases are skipped: inherited members
/// belong to the base's own generated fragment.
fn interface_closure(table: &SymbolTable, class: &TypeSymbol) -> Vec<SymbolId> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    visit_bases(table, &class.bases, &mut seen, &mut order);
    order
}

fn visit_bases(
    table: &SymbolTable,
    bases: &[BaseRef],
    seen: &mut HashSet<SymbolId>,
    order: &mut Vec<SymbolId>,
) {
    for base in bases {
        let Some(id) = base.resolved else { continue };
        if table.get(id).kind != TypeKind::Interface {
            continue;
        }
        // Seen-set doubles as cycle protection; base lists are user input
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        visit_bases(table, &table.get(id).bases, seen, order);
    }
}
