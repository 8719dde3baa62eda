//! Const evaluation errors

use thiserror::Error;

/// Errors that can occur while evaluating literal operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstError {
    /// No unary operation applies to the operand
    #[error("invalid unary operation: {operator} {operand_type}")]
    InvalidUnaryOp {
        /// Operator
        operator: String,
        /// Operand type
        operand_type: String,
    },

    /// No binary operation applies to the operands
    #[error("invalid binary operation: {left_type} {operator} {right_type}")]
    InvalidBinaryOp {
        /// Left operand type
        left_type: String,
        /// Operator
        operator: String,
        /// Right operand type
        right_type: String,
    },

    /// The value cannot be represented in the target type
    #[error("cannot convert '{value}' to {target}")]
    InvalidConversion {
        /// Rendered source value
        value: String,
        /// Target type name
        target: String,
    },
}
