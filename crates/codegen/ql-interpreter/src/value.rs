//! Runtime values

use ql_symbols::{ConstValue, TypeSymbol};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable array storage
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// A value produced while evaluating
///
/// Scalars are copied on assignment; arrays are references, so two variables
/// holding the same array observe each other's element writes.
#[derive(Debug, Clone)]
pub enum Value {
    /// Result of a `void` call
    Void,
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Character
    Char(char),
    /// String
    String(String),
    /// Array reference
    Array(ArrayRef),
}

impl Value {
    /// Fresh array holding `elements`
    pub fn array(elements: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(elements)))
    }

    /// Element value of a new array of `ty`, `Void` when the type has no default
    pub fn default_for(ty: &TypeSymbol) -> Self {
        if !ty.type_arguments().is_empty() {
            return Self::Void;
        }
        match ty.name() {
            "int" => Self::Int(0),
            "float" => Self::Float(0.0),
            "bool" => Self::Bool(false),
            "char" => Self::Char('\0'),
            "string" => Self::String(String::new()),
            _ => Self::Void,
        }
    }

    /// Literal equivalent of a scalar
    pub fn to_const(&self) -> Option<ConstValue> {
        match self {
            Self::Int(value) => Some(ConstValue::Int(*value)),
            Self::Float(value) => Some(ConstValue::Float(*value)),
            Self::Bool(value) => Some(ConstValue::Bool(*value)),
            Self::Char(value) => Some(ConstValue::Char(*value)),
            Self::String(value) => Some(ConstValue::String(value.clone())),
            Self::Void | Self::Array(_) => None,
        }
    }

    /// Integer payload
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Name of the value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::Array(_) => "array",
        }
    }
}

impl From<ConstValue> for Value {
    fn from(value: ConstValue) -> Self {
        match value {
            ConstValue::Int(value) => Self::Int(value),
            ConstValue::Float(value) => Self::Float(value),
            ConstValue::Bool(value) => Self::Bool(value),
            ConstValue::Char(value) => Self::Char(value),
            ConstValue::String(value) => Self::String(value),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(left), Self::Array(right)) => Rc::ptr_eq(left, right),
            (Self::Void, Self::Void) => true,
            _ => self
                .to_const()
                .is_some_and(|left| other.to_const().is_some_and(|right| left == right)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => Ok(()),
            Self::Array(elements) => {
                formatter.write_str("[")?;
                for (index, element) in elements.borrow().iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(", ")?;
                    }
                    write!(formatter, "{element}")?;
                }
                formatter.write_str("]")
            }
            scalar => scalar
                .to_const()
                .map_or(Ok(()), |value| write!(formatter, "{value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_symbols::builtins;

    #[test]
    fn test_arrays_compare_by_reference() {
        let first = Value::array(vec![Value::Int(1)]);
        let alias = first.clone();
        let copy = Value::array(vec![Value::Int(1)]);
        assert_eq!(first, alias);
        assert_ne!(first, copy);
    }

    #[test]
    fn test_rendering() {
        let array = Value::array(vec![Value::Int(1), Value::Float(2.5), Value::String("x".to_string())]);
        assert_eq!(array.to_string(), "[1, 2.5, x]");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Void.to_string(), "");
    }

    #[test]
    fn test_defaults_follow_element_type() {
        let builtins = builtins();
        assert_eq!(Value::default_for(&builtins.int), Value::Int(0));
        assert_eq!(Value::default_for(&builtins.string), Value::String(String::new()));
        assert_eq!(Value::default_for(&builtins.object), Value::Void);
    }
}
