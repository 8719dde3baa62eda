//! Literal operator and conversion evaluation

use crate::ConstError;
use ql_bound::{BinaryOperatorKind as Op, UnaryOperatorKind};
use ql_symbols::{ConstValue, TypeSymbol};

/// Result of dividing or taking the modulo by zero
pub const DIVIDE_BY_ZERO: &str = "ERR: Can't divide by zero";

fn divide_by_zero() -> ConstValue {
    ConstValue::String(DIVIDE_BY_ZERO.to_string())
}

/// Applies a unary operator to a literal
///
/// # Errors
///
/// Returns [`ConstError::InvalidUnaryOp`] when the operator does not accept the
/// operand's type.
pub fn fold_unary(kind: UnaryOperatorKind, operand: &ConstValue) -> Result<ConstValue, ConstError> {
    let folded = match (kind, operand) {
        (UnaryOperatorKind::Identity, ConstValue::Int(_) | ConstValue::Float(_)) => Some(operand.clone()),
        (UnaryOperatorKind::Negation, ConstValue::Int(value)) => Some(ConstValue::Int(value.wrapping_neg())),
        (UnaryOperatorKind::Negation, ConstValue::Float(value)) => Some(ConstValue::Float(-value)),
        (UnaryOperatorKind::LogicalNegation, ConstValue::Bool(value)) => Some(ConstValue::Bool(!value)),
        (UnaryOperatorKind::OnesComplement, ConstValue::Int(value)) => Some(ConstValue::Int(!value)),
        _ => None,
    };
    folded.ok_or_else(|| ConstError::InvalidUnaryOp {
        operator: format!("{kind:?}"),
        operand_type: operand.type_name().to_string(),
    })
}

/// Applies a binary operator to two literals
///
/// Integer arithmetic wraps on overflow. Mixed integer and float operands are
/// widened to float. `+` with a string on either side concatenates the
/// rendered values. Equality between values of unrelated types is false.
///
/// # Errors
///
/// Returns [`ConstError::InvalidBinaryOp`] when the operator does not accept
/// the operand types.
pub fn fold_binary(left: &ConstValue, kind: Op, right: &ConstValue) -> Result<ConstValue, ConstError> {
    let folded = match (left, right) {
        (ConstValue::Int(lhs), ConstValue::Int(rhs)) => fold_int(*lhs, kind, *rhs),
        (ConstValue::Int(_) | ConstValue::Float(_), ConstValue::Int(_) | ConstValue::Float(_)) => left
            .as_float()
            .zip(right.as_float())
            .and_then(|(lhs, rhs)| fold_float(lhs, kind, rhs)),
        (ConstValue::Bool(lhs), ConstValue::Bool(rhs)) => fold_bool(*lhs, kind, *rhs),
        (ConstValue::Char(lhs), ConstValue::Char(rhs)) => fold_ordered(lhs, kind, rhs),
        (ConstValue::String(_), _) | (_, ConstValue::String(_)) if kind == Op::Addition => {
            Some(ConstValue::String(format!("{left}{right}")))
        }
        _ => None,
    };
    folded
        .or_else(|| match kind {
            Op::Equals => Some(ConstValue::Bool(left == right)),
            Op::NotEquals => Some(ConstValue::Bool(left != right)),
            _ => None,
        })
        .ok_or_else(|| ConstError::InvalidBinaryOp {
            left_type: left.type_name().to_string(),
            operator: format!("{kind:?}"),
            right_type: right.type_name().to_string(),
        })
}

fn fold_int(lhs: i64, kind: Op, rhs: i64) -> Option<ConstValue> {
    let value = match kind {
        Op::Division | Op::Modulo if rhs == 0 => return Some(divide_by_zero()),
        Op::Addition => lhs.wrapping_add(rhs),
        Op::Subtraction => lhs.wrapping_sub(rhs),
        Op::Multiplication => lhs.wrapping_mul(rhs),
        Op::Division => lhs.wrapping_div(rhs),
        Op::Modulo => lhs.wrapping_rem(rhs),
        Op::BitwiseAnd => lhs & rhs,
        Op::BitwiseOr => lhs | rhs,
        Op::BitwiseXor => lhs ^ rhs,
        Op::LeftShift => lhs.wrapping_shl(rhs as u32),
        Op::RightShift => lhs.wrapping_shr(rhs as u32),
        _ => return fold_ordered(&lhs, kind, &rhs),
    };
    Some(ConstValue::Int(value))
}

#[allow(clippy::float_cmp, reason = "division by exactly zero is the only case that yields the sentinel")]
fn fold_float(lhs: f64, kind: Op, rhs: f64) -> Option<ConstValue> {
    let value = match kind {
        Op::Division | Op::Modulo if rhs == 0.0 => return Some(divide_by_zero()),
        Op::Addition => lhs + rhs,
        Op::Subtraction => lhs - rhs,
        Op::Multiplication => lhs * rhs,
        Op::Division => lhs / rhs,
        Op::Modulo => lhs % rhs,
        _ => return fold_ordered(&lhs, kind, &rhs),
    };
    Some(ConstValue::Float(value))
}

fn fold_bool(lhs: bool, kind: Op, rhs: bool) -> Option<ConstValue> {
    let value = match kind {
        Op::LogicalAnd => lhs && rhs,
        Op::LogicalOr => lhs || rhs,
        Op::BitwiseAnd => lhs & rhs,
        Op::BitwiseOr => lhs | rhs,
        Op::BitwiseXor | Op::NotEquals => lhs != rhs,
        Op::Equals => lhs == rhs,
        _ => return None,
    };
    Some(ConstValue::Bool(value))
}

/// Equality and ordering comparisons
fn fold_ordered<Operand: PartialOrd>(lhs: &Operand, kind: Op, rhs: &Operand) -> Option<ConstValue> {
    let value = match kind {
        Op::Equals => lhs == rhs,
        Op::NotEquals => lhs != rhs,
        Op::Less => lhs < rhs,
        Op::LessOrEquals => lhs <= rhs,
        Op::Greater => lhs > rhs,
        Op::GreaterOrEquals => lhs >= rhs,
        _ => return None,
    };
    Some(ConstValue::Bool(value))
}

/// Converts a literal to the built-in type `target`
///
/// Conversion to `object` and to the value's own type returns the value
/// unchanged. Float to integer truncates toward zero.
///
/// # Errors
///
/// Returns [`ConstError::InvalidConversion`] when no conversion exists or the
/// value does not fit, such as a string that does not parse as a number.
pub fn convert(value: &ConstValue, target: &TypeSymbol) -> Result<ConstValue, ConstError> {
    let failed = || ConstError::InvalidConversion {
        value: value.to_string(),
        target: target.to_string(),
    };
    if !target.type_arguments().is_empty() {
        return Err(failed());
    }
    match (target.name(), value) {
        (name, _) if name == "object" || name == value.type_name() => Ok(value.clone()),
        ("float", ConstValue::Int(integer)) => Ok(ConstValue::Float(*integer as f64)),
        ("int", ConstValue::Float(float)) => Ok(ConstValue::Int(*float as i64)),
        ("int", ConstValue::Char(character)) => Ok(ConstValue::Int(i64::from(u32::from(*character)))),
        ("char", ConstValue::Int(integer)) => u32::try_from(*integer)
            .ok()
            .and_then(char::from_u32)
            .map(ConstValue::Char)
            .ok_or_else(failed),
        ("string", _) => Ok(ConstValue::String(value.to_string())),
        ("int", ConstValue::String(text)) => text.trim().parse().map(ConstValue::Int).map_err(|_| failed()),
        ("float", ConstValue::String(text)) => text.trim().parse().map(ConstValue::Float).map_err(|_| failed()),
        ("bool", ConstValue::String(text)) => text.trim().parse().map(ConstValue::Bool).map_err(|_| failed()),
        _ => Err(failed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_symbols::builtins;

    fn int(value: i64) -> ConstValue {
        ConstValue::Int(value)
    }

    #[test]
    fn test_int_arithmetic() {
        assert_eq!(fold_binary(&int(4), Op::Multiplication, &int(2)), Ok(int(8)));
        assert_eq!(fold_binary(&int(7), Op::Division, &int(2)), Ok(int(3)));
        assert_eq!(fold_binary(&int(-7), Op::Modulo, &int(3)), Ok(int(-1)));
        assert_eq!(fold_binary(&int(1), Op::LeftShift, &int(4)), Ok(int(16)));
    }

    #[test]
    fn test_division_by_zero_yields_sentinel() {
        let sentinel = ConstValue::from(DIVIDE_BY_ZERO);
        assert_eq!(fold_binary(&int(9), Op::Division, &int(0)), Ok(sentinel.clone()));
        assert_eq!(fold_binary(&int(9), Op::Modulo, &int(0)), Ok(sentinel.clone()));
        assert_eq!(
            fold_binary(&ConstValue::Float(1.5), Op::Division, &ConstValue::Float(0.0)),
            Ok(sentinel.clone())
        );
        assert_eq!(fold_binary(&ConstValue::Float(1.5), Op::Division, &int(0)), Ok(sentinel));
    }

    #[test]
    fn test_overflow_wraps() {
        assert_eq!(fold_binary(&int(i64::MAX), Op::Addition, &int(1)), Ok(int(i64::MIN)));
        assert_eq!(fold_unary(UnaryOperatorKind::Negation, &int(i64::MIN)), Ok(int(i64::MIN)));
    }

    #[test]
    fn test_mixed_operands_widen_to_float() {
        assert_eq!(
            fold_binary(&int(1), Op::Addition, &ConstValue::Float(0.5)),
            Ok(ConstValue::Float(1.5))
        );
        assert_eq!(
            fold_binary(&int(2), Op::Less, &ConstValue::Float(2.5)),
            Ok(ConstValue::Bool(true))
        );
    }

    #[test]
    fn test_string_concatenation_renders_scalars() {
        let text = ConstValue::from("n=");
        assert_eq!(fold_binary(&text, Op::Addition, &int(3)), Ok(ConstValue::from("n=3")));
        assert_eq!(
            fold_binary(&ConstValue::Char('x'), Op::Addition, &ConstValue::from("y")),
            Ok(ConstValue::from("xy"))
        );
    }

    #[test]
    fn test_equality_across_types_is_false() {
        assert_eq!(
            fold_binary(&int(1), Op::Equals, &ConstValue::from("1")),
            Ok(ConstValue::Bool(false))
        );
        assert_eq!(
            fold_binary(&ConstValue::from("a"), Op::Equals, &ConstValue::from("a")),
            Ok(ConstValue::Bool(true))
        );
    }

    #[test]
    fn test_invalid_operations() {
        assert!(matches!(
            fold_binary(&ConstValue::Bool(true), Op::Subtraction, &int(1)),
            Err(ConstError::InvalidBinaryOp { .. })
        ));
        assert!(matches!(
            fold_unary(UnaryOperatorKind::LogicalNegation, &int(1)),
            Err(ConstError::InvalidUnaryOp { .. })
        ));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(fold_unary(UnaryOperatorKind::OnesComplement, &int(0)), Ok(int(-1)));
        assert_eq!(
            fold_unary(UnaryOperatorKind::LogicalNegation, &ConstValue::Bool(false)),
            Ok(ConstValue::Bool(true))
        );
        assert_eq!(fold_unary(UnaryOperatorKind::Identity, &int(5)), Ok(int(5)));
    }

    #[test]
    fn test_conversions() {
        let builtins = builtins();
        assert_eq!(convert(&int(3), &builtins.float), Ok(ConstValue::Float(3.0)));
        assert_eq!(convert(&ConstValue::Float(-2.7), &builtins.int), Ok(int(-2)));
        assert_eq!(convert(&ConstValue::Char('A'), &builtins.int), Ok(int(65)));
        assert_eq!(convert(&int(97), &builtins.char), Ok(ConstValue::Char('a')));
        assert_eq!(convert(&ConstValue::Bool(true), &builtins.string), Ok(ConstValue::from("true")));
        assert_eq!(convert(&ConstValue::from(" 42 "), &builtins.int), Ok(int(42)));
        assert_eq!(convert(&int(3), &builtins.object), Ok(int(3)));
    }

    #[test]
    fn test_failed_conversions() {
        let builtins = builtins();
        assert!(matches!(
            convert(&ConstValue::from("forty"), &builtins.int),
            Err(ConstError::InvalidConversion { .. })
        ));
        assert!(matches!(
            convert(&int(-1), &builtins.char),
            Err(ConstError::InvalidConversion { .. })
        ));
        assert!(matches!(
            convert(&ConstValue::Bool(true), &builtins.int),
            Err(ConstError::InvalidConversion { .. })
        ));
    }
}
