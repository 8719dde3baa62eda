//! Literal semantics
//!
//! Lowering folds operators over literals with these functions and the
//! evaluator applies the very same ones at run time, so a folded literal is
//! always the value the unfolded expression would have produced.
//!
//! Division and modulo by zero do not fail: they produce the string
//! [`DIVIDE_BY_ZERO`], for integer and float divisors alike.

mod error;
mod evaluator;

pub use error::ConstError;
pub use evaluator::{DIVIDE_BY_ZERO, convert, fold_binary, fold_unary};
