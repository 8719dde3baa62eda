//! Control flow graph construction errors

use thiserror::Error;

/// Internal errors raised while building a graph
///
/// Both indicate that the input was not produced by lowering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CfgError {
    /// A jump names a label that no statement declares
    #[error("jump to undeclared label '{label}'")]
    UnknownLabel {
        /// Label name
        label: String,
    },

    /// Structured control flow survived lowering
    #[error("statement is not in lowered form: {statement}")]
    NotLowered {
        /// Rendered statement
        statement: String,
    },
}
