use crate::syntax::Span;
use std::collections::HashMap;

/// Index into a run's [`SymbolTable`]. Identity comparisons between
/// resolved ids are what "same type" means everywhere downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Placeholder id used while a declaration is being assembled,
    /// before the table assigns the real one
    pub const UNBOUND: SymbolId = SymbolId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Interface,
    Class,
}

/// One attribute applied to a declaration, as written plus where it landed
/// after resolution
#[derive(Debug, Clone)]
pub struct AttributeUse {
    /// Attribute name as written, minus any type-argument list
    pub name: String,
    /// Unit the attribute list lives in; its using directives scope the
    /// name lookup
    pub unit: usize,
    pub span: Span,
    pub resolved: Option<SymbolId>,
}

/// One entry of a base list
#[derive(Debug, Clone)]
pub struct BaseRef {
    /// Base name as written, minus any type-argument list
    pub name: String,
    /// Number of type arguments supplied at the use site
    pub arity: usize,
    /// Unit the base list lives in; partial types can state bases in
    /// several units, each resolving under its own using directives
    pub unit: usize,
    pub resolved: Option<SymbolId>,
}

/// A property declared by an interface
#[derive(Debug, Clone)]
pub struct PropertyMember {
    pub name: String,
    /// Type text exactly as written in the declaration
    pub ty: String,
    pub span: Span,
    /// Unit the declaring text lives in; partial interfaces can spread
    /// members over several units
    pub unit: usize,
}

/// A bound type. Partial declarations of the same type merge into one
/// symbol, so downstream passes never see the same type twice.
#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub id: SymbolId,
    pub kind: TypeKind,
    pub name: String,
    /// Number of declared type parameters
    pub arity: usize,
    /// Type parameter list verbatim, e.g. `<T, TKey>`, empty when non-generic
    pub type_params: String,
    pub namespace: Vec<String>,
    /// Names of enclosing types, outermost first. Non-empty means nested.
    pub containers: Vec<String>,
    /// Accessibility modifiers in declaration order, e.g. `["public"]`
    pub accessibility: Vec<String>,
    pub is_partial: bool,
    /// Unit and name-identifier span of the first declaration seen
    pub unit: usize,
    pub span: Span,
    pub attributes: Vec<AttributeUse>,
    pub bases: Vec<BaseRef>,
    pub properties: Vec<PropertyMember>,
}

impl TypeSymbol {
    /// CLR-style unique name: dotted path with a backtick arity suffix,
    /// e.g. `Demo.Outer.IBox\`1`
    pub fn metadata_name(&self) -> String {
        let mut parts: Vec<&str> = self.namespace.iter().map(String::as_str).collect();
        parts.extend(self.containers.iter().map(String::as_str));
        parts.push(&self.name);
        let mut name = parts.join(".");
        if self.arity > 0 {
            name.push('`');
            name.push_str(&self.arity.to_string());
        }
        name
    }

    /// Human-facing name for diagnostics, e.g. `Demo.Box<T>`
    pub fn display_name(&self) -> String {
        let mut parts: Vec<&str> = self.namespace.iter().map(String::as_str).collect();
        parts.extend(self.containers.iter().map(String::as_str));
        parts.push(&self.name);
        let mut name = parts.join(".");
        name.push_str(&self.type_params);
        name
    }

    pub fn is_nested(&self) -> bool {
        !self.containers.is_empty()
    }
}

/// Interning table keyed by metadata name. Bind order matters: the first
/// symbol bound under a simple name owns that name for fallback lookups,
/// which is how the canonical marker shadows user-declared duplicates.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<TypeSymbol>,
    by_metadata_name: HashMap<String, SymbolId>,
    by_simple_name: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a declaration, merging into an existing symbol when the
    /// metadata name is already taken (partial declarations, or a user
    /// type colliding with the canonical marker)
    pub fn bind(&mut self, mut declaration: TypeSymbol) -> SymbolId {
        let metadata_name = declaration.metadata_name();
        if let Some(&id) = self.by_metadata_name.get(&metadata_name) {
            let existing = &mut self.symbols[id.index()];
            // All declarations of a partial type must say `partial`;
            // one that doesn't makes the whole type non-partial
            existing.is_partial = existing.is_partial && declaration.is_partial;
            if existing.accessibility.is_empty() {
                existing.accessibility = declaration.accessibility;
            }
            if existing.type_params.is_empty() {
                existing.type_params = declaration.type_params;
            }
            existing.attributes.extend(declaration.attributes);
            existing.bases.extend(declaration.bases);
            existing.properties.extend(declaration.properties);
            // Kind clash keeps the first declaration's kind; the clash is
            // already a compile error on the user's side
            return id;
        }

        let id = SymbolId(self.symbols.len() as u32);
        declaration.id = id;
        let simple_name = simple_key(&declaration.name, declaration.arity);
        self.by_metadata_name.insert(metadata_name, id);
        self.by_simple_name.entry(simple_name).or_insert(id);
        self.symbols.push(declaration);
        id
    }

    pub fn get(&self, id: SymbolId) -> &TypeSymbol {
        &self.symbols[id.index()]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut TypeSymbol {
        &mut self.symbols[id.index()]
    }

    /// Exact lookup by metadata name
    pub fn lookup(&self, metadata_name: &str) -> Option<SymbolId> {
        self.by_metadata_name.get(metadata_name).copied()
    }

    /// First-bound lookup by simple name (with arity suffix)
    pub fn lookup_simple(&self, key: &str) -> Option<SymbolId> {
        self.by_simple_name.get(key).copied()
    }

    pub fn symbols(&self) -> &[TypeSymbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Key used in the simple-name index, mirroring the metadata arity suffix
pub fn simple_key(name: &str, arity: usize) -> String {
    if arity > 0 {
        format!("{}`{}", name, arity)
    } else {
        name.to_string()
    }
}
