//! Binder failures that are not user diagnostics

use ql_cfg::CfgError;
use ql_lower::LowerError;
use ql_span::Span;
use ql_symbols::SymbolError;
use ql_syntax::SyntaxKind;
use thiserror::Error;

/// A syntax tree the binder cannot make sense of, or a failure in a later
/// stage the binder runs for its own checks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A node lacks a child its kind requires
    #[error("{kind} node at {span:?} has no child {index}")]
    MissingChild {
        /// Parent kind
        kind: SyntaxKind,
        /// Parent span
        span: Span,
        /// Expected child position
        index: usize,
    },
    /// A node of this kind cannot appear here
    #[error("unexpected {kind} node at {span:?} where {expected} was expected")]
    UnexpectedNode {
        /// Found kind
        kind: SyntaxKind,
        /// Node span
        span: Span,
        /// What the position allows
        expected: &'static str,
    },
    /// A generic instantiation the binder validated still failed
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    /// Lowering for the return-path check failed
    #[error(transparent)]
    Lower(#[from] LowerError),
    /// Graph construction for the return-path check failed
    #[error(transparent)]
    Cfg(#[from] CfgError),
}
