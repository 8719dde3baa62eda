//! Bound tree lowering
//!
//! Lowering turns bound method bodies into flat label and goto form and
//! simplifies them. Each pass rewrites structured control flow, folds literal
//! operations and then cleans up: nested blocks are flattened, stores to
//! variables that are never read are dropped, variables that are never
//! reassigned become read-only, and no-ops and untargeted labels disappear.
//! Passes repeat until one leaves the body unchanged.
//!
//! ```text
//! if (c) T else E      goto else unless c; T; goto end; else: E; end:
//! while (c) B          continue: goto break unless c; B; goto continue; break:
//! for (i; c; u) B      i; while (c) { B; continue: u; }
//! ```

mod clean;
mod desugar;
mod error;
mod lowerer;

pub use error::LowerError;
pub use lowerer::{LowerOptions, LoweredProgram, LoweringContext, lower};

#[cfg(test)]
mod tests;
