//! Contract accessor generation for C# sources.
//!
//! A run parses a set of source units, binds every type declaration into a
//! symbol table, finds interfaces marked with the canonical
//! `[AutoImplement]` attribute, and emits one additive partial-class
//! fragment per implementing class containing `{ get; set; }` accessors
//! for each owed property. Failures surface as diagnostics on the result;
//! a run itself never aborts.

pub mod aggregate;
pub mod diagnostics;
pub mod emit;
pub mod marker;
pub mod scan;
pub mod semantic;
pub mod syntax;

pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use emit::Fragment;
pub use syntax::SourceUnit;

use serde::Serialize;
use syntax::{Compilation, Span};

/// Everything one run produces
#[derive(Debug, Serialize)]
pub struct RunResult {
    pub fragments: Vec<Fragment>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn fragment(&self, name: &str) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.name == name)
    }
}

/// Standard analysis pipeline: parse, scan, bind, match, aggregate, emit.
/// Data flows strictly forward through the stages; each stage appends its
/// findings to the shared diagnostics list and moves on.
pub struct Pipeline;

impl Pipeline {
    pub fn standard() -> Self {
        Self
    }

    pub fn run(&self, units: Vec<SourceUnit>) -> RunResult {
        let mut all = Vec::with_capacity(units.len() + 1);
        all.push(marker::synthetic_unit());
        all.extend(units);

        let (compilation, mut diagnostics) = Compilation::parse(all);

        let candidates = scan::scan(&compilation);
        let mut table = semantic::SymbolTable::new();
        semantic::Binder::new(&compilation).bind(&candidates, &mut table);

        // The marker unit is ours; failing to bind it means the run cannot
        // decide contract identity at all
        let Some(descriptor) = marker::MarkerDescriptor::resolve(&table) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::Internal,
                "canonical marker attribute failed to bind",
                marker::MARKER_FRAGMENT_NAME,
                Span::zero(),
            ));
            return RunResult { fragments: vec![marker::output_fragment()], diagnostics };
        };

        let matches = semantic::match_contracts(&compilation, &table, descriptor, &mut diagnostics);
        let contracts = aggregate::aggregate(&compilation, &table, &matches, &mut diagnostics);
        let fragments =
            emit::emit(&compilation, &table, &contracts, &candidates.usings, &mut diagnostics);

        RunResult { fragments, diagnostics }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}
