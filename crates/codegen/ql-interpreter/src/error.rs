//! Evaluation errors

use ql_const_eval::ConstError;
use thiserror::Error;

/// Malformed input to the evaluator
///
/// These never come from user code that bound without diagnostics and was
/// lowered successfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpreterError {
    /// A body still holds structured control flow or nested blocks
    #[error("method '{method}' is not lowered")]
    NotLowered {
        /// Method name
        method: String,
    },

    /// A jump targets a label its body does not declare
    #[error("method '{method}' jumps to undeclared label '{label}'")]
    UndeclaredLabel {
        /// Method name
        method: String,
        /// Label name
        label: String,
    },

    /// A variable was read before any value was stored
    #[error("variable '{name}' has no value")]
    UnboundVariable {
        /// Variable name
        name: String,
    },

    /// A call names a method with no lowered body
    #[error("no body for method '{name}'")]
    UnknownMethod {
        /// Rendered signature
        name: String,
    },

    /// A call passes the wrong number of arguments
    #[error("method '{name}' takes {expected} arguments, got {found}")]
    ArgumentCount {
        /// Rendered signature
        name: String,
        /// Parameter count
        expected: usize,
        /// Argument count
        found: usize,
    },

    /// An error placeholder reached evaluation
    #[error("cannot evaluate an expression that failed to bind")]
    ErrorExpression,

    /// A value had the wrong shape for its use
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected value kind
        expected: &'static str,
        /// Actual value kind
        found: &'static str,
    },

    /// An operator was applied to operands it does not accept
    #[error(transparent)]
    Operation(#[from] ConstError),
}

/// A fault raised by the evaluated program
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Array access outside `0..length`
    #[error("index {index} is out of range for length {length}")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
        /// Array length
        length: usize,
    },

    /// `new Array<T>(size)` with a negative size
    #[error("array size {size} is negative")]
    NegativeArraySize {
        /// Requested size
        size: i64,
    },

    /// Read of an element that was never assigned and has no default
    #[error("element {index} was never assigned")]
    UninitializedElement {
        /// Element index
        index: usize,
    },

    /// Calls nested deeper than the evaluator allows
    #[error("call to '{method}' exceeds the maximum call depth of {limit}")]
    CallDepthExceeded {
        /// Called method
        method: String,
        /// Configured limit
        limit: usize,
    },

    /// A cast whose value does not fit the target type
    #[error(transparent)]
    Conversion(ConstError),
}
