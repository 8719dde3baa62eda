//! Bound tree
//!
//! The binder produces, and the lowerer rewrites, trees of [`BoundStatement`]
//! and [`BoundExpression`]. Nodes are plain values: rewriting consumes a node
//! and returns a new one, and two trees are the same when they are structurally
//! equal.

mod conversion;
mod operators;
mod printer;
mod rewriter;
mod tree;

pub use conversion::Conversion;
pub use operators::{BinaryOperatorKind, BoundBinaryOperator, BoundUnaryOperator, UnaryOperatorKind};
pub use rewriter::BoundTreeRewriter;
pub use tree::{BoundExpression, BoundMethod, BoundNodeRef, BoundProgram, BoundStatement, LoopLabels};
