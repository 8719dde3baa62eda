//! Tree-walking evaluation of lowered programs
//!
//! The evaluator runs the flat bodies produced by `ql-lower` with an
//! instruction pointer and a label table per method. The entry method
//! executes against a [`VariableStore`] owned by the caller, so top-level
//! variables can be inspected once evaluation returns; every other call gets
//! a fresh frame.
//!
//! Operators share their semantics with constant folding, which means a
//! division by zero yields the same sentinel string at runtime as it does
//! when folded. Faults the program itself can trigger, such as an array index
//! out of range, become runtime diagnostics in the [`EvaluationResult`].
//! So does recursion past [`Evaluator::with_max_call_depth`].

mod error;
mod evaluator;
mod store;
mod value;

pub use error::{InterpreterError, RuntimeError};
pub use evaluator::{DEFAULT_MAX_CALL_DEPTH, EvaluationResult, Evaluator, evaluate};
pub use store::VariableStore;
pub use value::{ArrayRef, Value};

#[cfg(test)]
mod tests;
