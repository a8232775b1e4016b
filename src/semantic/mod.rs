mod binder;
mod matcher;
mod symbols;

pub use binder::Binder;
pub use matcher::{match_contracts, ClassMatch, ContractSet};
pub use symbols::{
    AttributeUse, BaseRef, PropertyMember, SymbolId, SymbolTable, TypeKind, TypeSymbol,
};
