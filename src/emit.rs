//! Fragment emission. Renders each aggregated class contract into an
//! additive partial-class source file and registers fragment names so a
//! collision is caught here instead of at the consumer.

use crate::aggregate::ClassContract;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::marker;
use crate::semantic::{SymbolTable, TypeSymbol};
use crate::syntax::Compilation;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One generated source file
#[derive(Debug, Clone, Serialize)]
pub struct Fragment {
    /// Hint name, unique within a run
    pub name: String,
    pub code: String,
}

/// Emit fragments for every aggregated contract. The marker's own fragment
/// is always first; a class whose fragment name is already taken is
/// reported and dropped without touching the rest.
pub fn emit(
    compilation: &Compilation,
    table: &SymbolTable,
    contracts: &[ClassContract],
    usings: &[Vec<String>],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Fragment> {
    let mut fragments = vec![marker::output_fragment()];
    let mut registered: HashMap<String, String> = HashMap::new();
    registered.insert(
        marker::MARKER_FRAGMENT_NAME.to_string(),
        marker::MarkerDescriptor::metadata_name(),
    );

    for contract in contracts {
        match emit_class(compilation, table, contract, usings, &mut registered) {
            Ok(fragment) => fragments.push(fragment),
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }
    fragments
}

fn emit_class(
    compilation: &Compilation,
    table: &SymbolTable,
    contract: &ClassContract,
    usings: &[Vec<String>],
    registered: &mut HashMap<String, String>,
) -> Result<Fragment, Diagnostic> {
    let class = table.get(contract.class);
    let name = fragment_name(class);
    if let Some(owner) = registered.get(&name) {
        return Err(Diagnostic::new(
            DiagnosticKind::FragmentNameCollision,
            format!(
                "fragment '{}' for class '{}' collides with the fragment generated for '{}'",
                name,
                class.display_name(),
                owner
            ),
            compilation.unit(class.unit).name.clone(),
            class.span,
        )
        .with_help("rename one of the classes; fragment names fold the generic arity marker into '_'"));
    }
    registered.insert(name.clone(), class.display_name());

    Ok(Fragment {
        name,
        code: render_fragment(class, contract, usings),
    })
}

/// `Demo.Box\`1` becomes `Demo.Box_1.Generated.cs`
fn fragment_name(class: &TypeSymbol) -> String {
    format!("{}.Generated.cs", class.metadata_name().replace('`', "_"))
}

fn render_fragment(class: &TypeSymbol, contract: &ClassContract, usings: &[Vec<String>]) -> String {
    let mut output = Output::new();
    output.push("// <auto-generated/>");
    output.newline();
    for directive in header_usings(class, contract, usings) {
        output.push(&directive);
        output.newline();
    }
    output.newline();

    let in_namespace = !class.namespace.is_empty();
    let indent = if in_namespace { "    " } else { "" };
    if in_namespace {
        output.push("namespace ");
        output.push(&class.namespace.join("."));
        output.newline();
        output.push("{");
        output.newline();
    }

    output.push(indent);
    output.push(&class_header(class));
    output.newline();
    output.push(indent);
    output.push("{");
    output.newline();
    for member in &contract.members {
        output.push(indent);
        output.push("    public ");
        output.push(&member.ty);
        output.push(" ");
        output.push(&member.name);
        output.push(" { get; set; }");
        output.newline();
    }
    output.push(indent);
    output.push("}");
    output.newline();

    if in_namespace {
        output.push("}");
        output.newline();
    }
    output.finish()
}

/// Header line of the generated declaration: accessibility as declared,
/// then `partial class`, then the name with its type parameters verbatim
fn class_header(class: &TypeSymbol) -> String {
    let mut header = String::new();
    for modifier in &class.accessibility {
        header.push_str(modifier);
        header.push(' ');
    }
    header.push_str("partial class ");
    header.push_str(&class.name);
    header.push_str(&class.type_params);
    header
}

/// Union of the using directives in scope where the class and each
/// contributing member were declared, `using System;` first, duplicates
/// and `global using` directives dropped
fn header_usings(class: &TypeSymbol, contract: &ClassContract, usings: &[Vec<String>]) -> Vec<String> {
    let mut units = vec![class.unit];
    units.extend(contract.members.iter().map(|member| member.unit));

    let mut directives = vec!["using System;".to_string()];
    let mut seen: HashSet<String> = directives.iter().cloned().collect();
    for unit in units {
        for directive in usings.get(unit).into_iter().flatten() {
            if directive.starts_with("global ") {
                continue;
            }
            if seen.insert(directive.clone()) {
                directives.push(directive.clone());
            }
        }
    }
    directives
}

/// Output buffer that accumulates generated code line by line
struct Output {
    lines: Vec<String>,
    current_line: String,
}

impl Output {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current_line: String::new(),
        }
    }

    fn push(&mut self, text: &str) {
        self.current_line.push_str(text);
    }

    fn newline(&mut self) {
        self.current_line.push('\n');
        self.lines.push(std::mem::take(&mut self.current_line));
    }

    fn finish(mut self) -> String {
        if !self.current_line.is_empty() {
            self.lines.push(std::mem::take(&mut self.current_line));
        }
        self.lines.join("")
    }
}
