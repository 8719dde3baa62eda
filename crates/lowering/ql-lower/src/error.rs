//! Lowering errors

use thiserror::Error;

/// Internal errors raised while lowering
///
/// Lowering never reports user diagnostics. Each variant means the binder
/// handed over a tree it should have rejected, or a rewrite failed to settle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    /// The rewrite loop kept changing the body
    #[error("lowering of '{method}' did not settle after {passes} passes")]
    FixedPointNotReached {
        /// Method being lowered
        method: String,
        /// Passes run before giving up
        passes: usize,
    },

    /// A jump targets a label the lowered body does not declare
    #[error("'{method}' jumps to undeclared label '{label}'")]
    UndeclaredLabel {
        /// Method being lowered
        method: String,
        /// Missing label
        label: String,
    },
}
