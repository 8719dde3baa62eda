//! Overload selection

use ql_bound::Conversion;
use ql_symbols::{MethodSymbol, TypeRef, builtins};

/// Outcome of picking one overload for a call
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exactly one applicable method
    Found(MethodSymbol),
    /// No method with the name is visible
    Undefined,
    /// Methods exist but none takes this many arguments
    WrongArgumentCount {
        /// Parameter count of the first candidate
        expected: usize,
    },
    /// Several methods take this many arguments but none accepts the types
    NoMatch,
    /// More than one method applies equally well
    Ambiguous(Vec<MethodSymbol>),
}

/// Picks the overload for `arguments` from the first non-empty level
///
/// Candidates are filtered by arity, then by exact parameter types, then by
/// implicit conversions. A single candidate of the right arity is selected
/// even if an argument does not convert, so the caller reports the offending
/// argument instead of the whole call.
pub fn select_overload(levels: &[Vec<MethodSymbol>], arguments: &[TypeRef]) -> Resolution {
    let Some(candidates) = levels.first() else {
        return Resolution::Undefined;
    };
    let by_arity: Vec<&MethodSymbol> = candidates
        .iter()
        .filter(|method| method.parameters.len() == arguments.len())
        .collect();
    let [first, ..] = by_arity.as_slice() else {
        return Resolution::WrongArgumentCount {
            expected: candidates.first().map_or(0, |method| method.parameters.len()),
        };
    };
    let error = &builtins().error;
    let accepts = |method: &MethodSymbol, exact: bool| {
        method.parameters.iter().zip(arguments).all(|(parameter, argument)| {
            argument == error
                || if exact {
                    *argument == parameter.ty
                } else {
                    Conversion::classify(argument, &parameter.ty).is_implicit()
                }
        })
    };
    for exact in [true, false] {
        let mut applicable: Vec<MethodSymbol> = by_arity
            .iter()
            .filter(|method| accepts(method, exact))
            .map(|method| (*method).clone())
            .collect();
        match applicable.len() {
            0 => {}
            1 => return Resolution::Found(applicable.swap_remove(0)),
            _ => return Resolution::Ambiguous(applicable),
        }
    }
    if by_arity.len() == 1 {
        Resolution::Found((*first).clone())
    } else {
        Resolution::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_symbols::{MethodId, MethodKind, NamespaceSymbol, ParameterSymbol};
    use std::sync::Arc;

    fn method(namespace: Option<&str>, parameters: &[&TypeRef]) -> MethodSymbol {
        MethodSymbol {
            name: "f".to_string(),
            namespace: namespace.map(NamespaceSymbol::parse),
            parameters: parameters
                .iter()
                .map(|ty| ParameterSymbol {
                    name: "value".to_string(),
                    ty: Arc::clone(ty),
                })
                .collect(),
            return_type: Arc::clone(&builtins().void),
            kind: MethodKind::User(MethodId(1)),
        }
    }

    #[test]
    fn test_exact_match_beats_conversion() {
        let builtins = builtins();
        let by_int = method(None, &[&builtins.int]);
        let by_float = method(None, &[&builtins.float]);
        let levels = vec![vec![by_float, by_int.clone()]];
        assert_eq!(select_overload(&levels, &[Arc::clone(&builtins.int)]), Resolution::Found(by_int));
    }

    #[test]
    fn test_inner_level_hides_outer() {
        let builtins = builtins();
        let inner = method(None, &[&builtins.string]);
        let outer = method(None, &[&builtins.int]);
        let levels = vec![vec![inner], vec![outer]];
        assert!(matches!(
            select_overload(&levels, &[Arc::clone(&builtins.int)]),
            Resolution::Found(found) if found.parameters[0].ty == builtins.string
        ));
    }

    #[test]
    fn test_same_level_duplicates_are_ambiguous() {
        let levels = vec![vec![method(Some("A"), &[]), method(Some("B"), &[])]];
        assert!(matches!(select_overload(&levels, &[]), Resolution::Ambiguous(candidates) if candidates.len() == 2));
    }

    #[test]
    fn test_arity_and_missing_names() {
        let builtins = builtins();
        let levels = vec![vec![method(None, &[&builtins.int])]];
        assert_eq!(select_overload(&levels, &[]), Resolution::WrongArgumentCount { expected: 1 });
        assert_eq!(select_overload(&[], &[]), Resolution::Undefined);
    }
}
