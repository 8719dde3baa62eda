//! Symbol model invariant violations

use thiserror::Error;

/// A generic instantiation the binder should never have requested
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// The receiver is not a generic type definition
    #[error("type '{name}' is not a generic type definition")]
    NotGenericDefinition {
        /// Receiver type
        name: String,
    },
    /// Argument count differs from the definition's arity
    #[error("type '{name}' expects {expected} type arguments, got {found}")]
    ArityMismatch {
        /// Generic definition
        name: String,
        /// Declared arity
        expected: usize,
        /// Supplied count
        found: usize,
    },
    /// A type argument is itself generic or a placeholder
    #[error("type argument '{argument}' of '{name}' is not concrete")]
    NonConcreteArgument {
        /// Generic definition
        name: String,
        /// Offending argument
        argument: String,
    },
    /// A member refers to a placeholder owned by another definition
    #[error("member of '{name}' refers to foreign type parameter '{placeholder}'")]
    ForeignPlaceholder {
        /// Generic definition
        name: String,
        /// Offending placeholder
        placeholder: String,
    },
}
