//! Conversion classification

use ql_symbols::{TypeSymbol, builtins};

/// How a value of one type can become a value of another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// No conversion exists
    None,
    /// Same type, nothing to do
    Identity,
    /// Applied silently where a value of the target type is expected
    Implicit,
    /// Requires a cast
    Explicit,
}

impl Conversion {
    /// Classifies the conversion from `from` to `to`
    pub fn classify(from: &TypeSymbol, to: &TypeSymbol) -> Self {
        let builtins = builtins();
        if from == to || *from == *builtins.error || *to == *builtins.error {
            return Self::Identity;
        }
        if *from == *builtins.void || *to == *builtins.void {
            return Self::None;
        }
        if *to == *builtins.object {
            return Self::Implicit;
        }
        if *from == *builtins.object {
            return Self::Explicit;
        }

        let is = |ty: &TypeSymbol, name: &str| ty.type_arguments().is_empty() && ty.name() == name;
        let scalar = |ty: &TypeSymbol| ["int", "float", "bool", "char"].iter().any(|name| is(ty, name));

        if (is(from, "int") && is(to, "float")) || (is(from, "char") && (is(to, "int") || is(to, "string"))) {
            return Self::Implicit;
        }
        if (is(from, "float") && is(to, "int"))
            || (is(from, "int") && is(to, "char"))
            || (scalar(from) && is(to, "string"))
            || (is(from, "string") && (is(to, "int") || is(to, "float") || is(to, "bool")))
        {
            return Self::Explicit;
        }
        Self::None
    }

    /// Returns true unless no conversion exists
    pub fn exists(self) -> bool {
        self != Self::None
    }

    /// Returns true for the identity conversion
    pub fn is_identity(self) -> bool {
        self == Self::Identity
    }

    /// Returns true when the conversion may be applied without a cast
    pub fn is_implicit(self) -> bool {
        matches!(self, Self::Identity | Self::Implicit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_numeric_widening_is_implicit() {
        let builtins = builtins();
        assert_eq!(Conversion::classify(&builtins.int, &builtins.float), Conversion::Implicit);
        assert_eq!(Conversion::classify(&builtins.float, &builtins.int), Conversion::Explicit);
    }

    #[test]
    fn test_everything_converts_to_object() {
        let builtins = builtins();
        let array = builtins.array.make_concrete_type(&[Arc::clone(&builtins.int)]).expect("Array<int>");
        assert!(Conversion::classify(&array, &builtins.object).is_implicit());
        assert_eq!(Conversion::classify(&builtins.object, &array), Conversion::Explicit);
    }

    #[test]
    fn test_missing_conversions() {
        let builtins = builtins();
        assert_eq!(Conversion::classify(&builtins.bool, &builtins.int), Conversion::None);
        assert_eq!(Conversion::classify(&builtins.void, &builtins.object), Conversion::None);
        assert!(!Conversion::classify(&builtins.string, &builtins.char).exists());
    }

    #[test]
    fn test_error_type_converts_silently() {
        let builtins = builtins();
        assert!(Conversion::classify(&builtins.error, &builtins.int).is_identity());
        assert!(Conversion::classify(&builtins.string, &builtins.error).is_identity());
    }
}
