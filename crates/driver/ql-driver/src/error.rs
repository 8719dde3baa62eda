//! Driver errors

use ql_binder::BindError;
use ql_cfg::CfgError;
use ql_interpreter::InterpreterError;
use ql_lower::LowerError;
use thiserror::Error;

/// Failure of a pipeline stage
///
/// User mistakes are diagnostics, never a [`CompileError`]. These errors mean
/// the syntax trees were malformed or a later stage broke its own contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The syntax trees are structurally malformed
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Lowering failed
    #[error(transparent)]
    Lower(#[from] LowerError),

    /// A lowered body could not be turned into a graph
    #[error(transparent)]
    Cfg(#[from] CfgError),

    /// Evaluation hit malformed input
    #[error(transparent)]
    Interpreter(#[from] InterpreterError),

    /// A later stage was requested for a program with diagnostics
    #[error("program has {count} diagnostics")]
    HasDiagnostics {
        /// Number of diagnostics
        count: usize,
    },
}
