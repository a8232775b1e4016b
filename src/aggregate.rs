//! Member aggregation. Folds each matched class's contract interfaces into
//! the flat list of properties its fragment will declare, one entry per
//! distinct name.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::semantic::{ClassMatch, SymbolId, SymbolTable};
use crate::syntax::{Compilation, Span};
use std::collections::HashMap;

/// A property a class owes, with the interface that contributed it
#[derive(Debug, Clone)]
pub struct ContractMember {
    pub name: String,
    pub ty: String,
    pub declared_by: SymbolId,
    pub unit: usize,
    pub span: Span,
}

/// Aggregated obligations of one class
#[derive(Debug)]
pub struct ClassContract {
    pub class: SymbolId,
    pub members: Vec<ContractMember>,
}

pub fn aggregate(
    compilation: &Compilation,
    table: &SymbolTable,
    matches: &[ClassMatch],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ClassContract> {
    matches
        .iter()
        .map(|class_match| aggregate_class(compilation, table, class_match, diagnostics))
        .collect()
}

/// Union the properties of a class's contracts in discovery order. The
/// first interface to declare a name wins; later declarations of the same
/// name are dropped, with a warning when their type text disagrees.
fn aggregate_class(
    compilation: &Compilation,
    table: &SymbolTable,
    class_match: &ClassMatch,
    diagnostics: &mut Vec<Diagnostic>,
) -> ClassContract {
    let mut members: Vec<ContractMember> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for &contract in &class_match.contracts {
        let interface = table.get(contract);
        for property in &interface.properties {
            let existing = by_name.get(&property.name).copied();
            match existing {
                None => {
                    by_name.insert(property.name.clone(), members.len());
                    members.push(ContractMember {
                        name: property.name.clone(),
                        ty: property.ty.clone(),
                        declared_by: contract,
                        unit: property.unit,
                        span: property.span,
                    });
                }
                Some(index) => {
                    let kept = &members[index];
                    if kept.ty == property.ty {
                        continue;
                    }
                    let mut diagnostic = Diagnostic::new(
                        DiagnosticKind::ConflictingMemberTypes,
                        format!(
                            "property '{}' is owed as '{}' from '{}' but '{}' declares it as '{}'",
                            property.name,
                            kept.ty,
                            table.get(kept.declared_by).display_name(),
                            interface.display_name(),
                            property.ty
                        ),
                        compilation.unit(property.unit).name.clone(),
                        property.span,
                    )
                    .with_help("the first declaring interface wins; align the property types to resolve the conflict");
                    if kept.unit == property.unit {
                        diagnostic = diagnostic
                            .with_related(kept.span)
                            .with_related_label("first declared here");
                    }
                    diagnostics.push(diagnostic);
                }
            }
        }
    }

    ClassContract { class: class_match.class, members }
}
