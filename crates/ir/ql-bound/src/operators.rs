//! Operator tables
//!
//! Operators resolve from fixed tables keyed by operator text and operand
//! types. When no entry matches exactly, operand base types are tried up to
//! the universal base.

use ql_symbols::{TypeRef, builtins, find_common_ancestor};
use std::sync::{Arc, LazyLock};

/// Semantic unary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperatorKind {
    /// `+x`
    Identity,
    /// `-x`
    Negation,
    /// `!x`
    LogicalNegation,
    /// `~x`
    OnesComplement,
}

/// Semantic binary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperatorKind {
    /// `+`, numeric addition or string concatenation
    Addition,
    /// `-`
    Subtraction,
    /// `*`
    Multiplication,
    /// `/`
    Division,
    /// `%`
    Modulo,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `&`
    BitwiseAnd,
    /// `|`
    BitwiseOr,
    /// `^`
    BitwiseXor,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `<`
    Less,
    /// `<=`
    LessOrEquals,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEquals,
}

/// A resolved unary operator
#[derive(Debug, Clone, PartialEq)]
pub struct BoundUnaryOperator {
    /// Operator text
    pub syntax: &'static str,
    /// Operation
    pub kind: UnaryOperatorKind,
    /// Accepted operand type
    pub operand_type: TypeRef,
    /// Result type
    pub result_type: TypeRef,
}

/// A resolved binary operator
#[derive(Debug, Clone, PartialEq)]
pub struct BoundBinaryOperator {
    /// Operator text
    pub syntax: &'static str,
    /// Operation
    pub kind: BinaryOperatorKind,
    /// Accepted left operand type
    pub left_type: TypeRef,
    /// Accepted right operand type
    pub right_type: TypeRef,
    /// Result type
    pub result_type: TypeRef,
}

static UNARY_OPERATORS: LazyLock<Vec<BoundUnaryOperator>> = LazyLock::new(|| {
    let builtins = builtins();
    let entry = |syntax, kind, ty: &TypeRef| BoundUnaryOperator {
        syntax,
        kind,
        operand_type: Arc::clone(ty),
        result_type: Arc::clone(ty),
    };
    vec![
        entry("+", UnaryOperatorKind::Identity, &builtins.int),
        entry("-", UnaryOperatorKind::Negation, &builtins.int),
        entry("~", UnaryOperatorKind::OnesComplement, &builtins.int),
        entry("+", UnaryOperatorKind::Identity, &builtins.float),
        entry("-", UnaryOperatorKind::Negation, &builtins.float),
        entry("!", UnaryOperatorKind::LogicalNegation, &builtins.bool),
    ]
});

static BINARY_OPERATORS: LazyLock<Vec<BoundBinaryOperator>> = LazyLock::new(|| {
    use BinaryOperatorKind as Op;

    let builtins = builtins();
    let mut table = Vec::new();
    let mut add = |syntax, kind, left: &TypeRef, right: &TypeRef, result: &TypeRef| {
        table.push(BoundBinaryOperator {
            syntax,
            kind,
            left_type: Arc::clone(left),
            right_type: Arc::clone(right),
            result_type: Arc::clone(result),
        });
    };

    let (int, float, bool, string, char) = (
        &builtins.int,
        &builtins.float,
        &builtins.bool,
        &builtins.string,
        &builtins.char,
    );
    let arithmetic = [
        ("+", Op::Addition),
        ("-", Op::Subtraction),
        ("*", Op::Multiplication),
        ("/", Op::Division),
        ("%", Op::Modulo),
    ];
    let comparison = [
        ("<", Op::Less),
        ("<=", Op::LessOrEquals),
        (">", Op::Greater),
        (">=", Op::GreaterOrEquals),
    ];
    let equality = [("==", Op::Equals), ("!=", Op::NotEquals)];

    for (syntax, kind) in arithmetic {
        add(syntax, kind, int, int, int);
        add(syntax, kind, float, float, float);
        add(syntax, kind, int, float, float);
        add(syntax, kind, float, int, float);
    }
    for scalar in [int, float, bool, char, string] {
        add("+", Op::Addition, string, scalar, string);
        if scalar != string {
            add("+", Op::Addition, scalar, string, string);
        }
    }
    for (syntax, kind) in comparison {
        add(syntax, kind, int, int, bool);
        add(syntax, kind, float, float, bool);
        add(syntax, kind, int, float, bool);
        add(syntax, kind, float, int, bool);
        add(syntax, kind, char, char, bool);
    }
    for (syntax, kind) in equality {
        for scalar in [int, float, bool, char, string] {
            add(syntax, kind, scalar, scalar, bool);
        }
        add(syntax, kind, int, float, bool);
        add(syntax, kind, float, int, bool);
        add(syntax, kind, &builtins.object, &builtins.object, bool);
    }
    add("&&", Op::LogicalAnd, bool, bool, bool);
    add("||", Op::LogicalOr, bool, bool, bool);
    for (syntax, kind) in [("&", Op::BitwiseAnd), ("|", Op::BitwiseOr), ("^", Op::BitwiseXor)] {
        add(syntax, kind, int, int, int);
        add(syntax, kind, bool, bool, bool);
    }
    add("<<", Op::LeftShift, int, int, int);
    add(">>", Op::RightShift, int, int, int);
    table
});

/// `ty`, then its base types up to the universal base
fn ancestry(ty: &TypeRef) -> Vec<TypeRef> {
    let mut chain = vec![Arc::clone(ty)];
    while let Some(base) = chain.last().and_then(|last| last.base().map(Arc::clone)) {
        chain.push(base);
    }
    chain
}

impl BoundUnaryOperator {
    /// Resolves `syntax` applied to an operand of type `operand`
    pub fn bind(syntax: &str, operand: &TypeRef) -> Option<Self> {
        ancestry(operand).iter().find_map(|candidate| {
            UNARY_OPERATORS
                .iter()
                .find(|entry| entry.syntax == syntax && entry.operand_type == *candidate)
                .cloned()
        })
    }
}

impl BoundBinaryOperator {
    /// Resolves `syntax` applied to operands of types `left` and `right`
    pub fn bind(syntax: &str, left: &TypeRef, right: &TypeRef) -> Option<Self> {
        let lookup = |lhs: &TypeRef, rhs: &TypeRef| {
            BINARY_OPERATORS
                .iter()
                .find(|entry| entry.syntax == syntax && entry.left_type == *lhs && entry.right_type == *rhs)
                .cloned()
        };
        if let Some(operator) = lookup(left, right) {
            return Some(operator);
        }
        let common = find_common_ancestor(left, right);
        if let Some(operator) = lookup(&common, &common) {
            return Some(operator);
        }
        let right_chain = ancestry(right);
        ancestry(left).iter().find_map(|left_candidate| {
            right_chain
                .iter()
                .find_map(|right_candidate| lookup(left_candidate, right_candidate))
        })
    }
}
