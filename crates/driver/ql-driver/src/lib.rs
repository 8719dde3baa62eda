//! Compilation driver
//!
//! A [`Compilation`] owns the syntax trees of one program together with its
//! [`CompilerOptions`] and runs the pipeline on demand: binding (memoized),
//! lowering, control-flow analysis and evaluation. Problems in user code
//! surface as diagnostics; [`CompileError`] is reserved for malformed input
//! and broken stage contracts.

mod compilation;
mod error;
mod options;

pub use compilation::Compilation;
pub use error::CompileError;
pub use options::CompilerOptions;

#[cfg(test)]
mod tests;
