//! Type and symbol model
//!
//! Symbols are immutable values compared structurally. Types are shared through
//! [`TypeRef`] handles; variables are told apart by their [`VariableId`] so that
//! shadowed declarations with equal names stay distinct.

mod builtins;
mod cache;
mod error;
mod symbols;
mod types;
mod value;

pub use builtins::{BuiltinMethod, Builtins, builtins};
pub use cache::InstantiationCache;
pub use error::SymbolError;
pub use symbols::{
    LabelAllocator, LabelSymbol, MethodId, MethodKind, MethodSymbol, NamespaceSymbol, ParameterSymbol,
    SymbolKind, VariableId, VariableKind, VariableRef, VariableSymbol,
};
pub use types::{IndexerSymbol, TypeKind, TypeMember, TypeRef, TypeSymbol, find_common_ancestor};
pub use value::ConstValue;
