//! Canonical marker attribute, injected ahead of user sources.
//!
//! The attribute declaration is emitted as a fixed fragment so consuming
//! projects never have to define it themselves, and it is bound *first* so
//! a user-declared type with the same metadata name merges into the
//! canonical symbol instead of shadowing it.

use crate::emit::Fragment;
use crate::semantic::{SymbolId, SymbolTable};
use crate::syntax::SourceUnit;

pub const MARKER_NAMESPACE: &str = "Contractor";
pub const MARKER_TYPE_NAME: &str = "AutoImplementAttribute";
pub const MARKER_FRAGMENT_NAME: &str = "Contractor.AutoImplementAttribute.cs";

/// Source text of the marker attribute declaration. This exact text is both
/// bound into the symbol table and emitted verbatim as a fragment.
pub const MARKER_SOURCE: &str = "\
using System;

namespace Contractor
{
    [AttributeUsage(AttributeTargets.Interface, Inherited = false, AllowMultiple = false)]
    sealed class AutoImplementAttribute : Attribute
    {
    }
}
";

/// The synthetic unit carrying the marker declaration. Prepended to the
/// user's units so it parses and binds like any other source.
pub fn synthetic_unit() -> SourceUnit {
    SourceUnit::new(MARKER_FRAGMENT_NAME, MARKER_SOURCE)
}

/// The marker's own output fragment, present in every run
pub fn output_fragment() -> Fragment {
    Fragment {
        name: MARKER_FRAGMENT_NAME.to_string(),
        code: MARKER_SOURCE.to_string(),
    }
}

/// Resolved identity of the marker attribute within one run's symbol table
#[derive(Debug, Clone, Copy)]
pub struct MarkerDescriptor {
    pub symbol: SymbolId,
}

impl MarkerDescriptor {
    pub fn metadata_name() -> String {
        format!("{}.{}", MARKER_NAMESPACE, MARKER_TYPE_NAME)
    }

    /// Look the marker up after binding. `None` means the synthetic unit
    /// failed to parse or bind, which is an internal failure upstream.
    pub fn resolve(table: &SymbolTable) -> Option<Self> {
        let symbol = table.lookup(&Self::metadata_name())?;
        Some(Self { symbol })
    }
}
