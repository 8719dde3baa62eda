//! Type symbols and generic instantiation

use crate::error::SymbolError;
use crate::symbols::{MethodSymbol, NamespaceSymbol, ParameterSymbol};
use std::{fmt, iter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shared handle to a type symbol
pub type TypeRef = Arc<TypeSymbol>;

/// The three mutually exclusive shapes of a type
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// A usable type, with bound type arguments when instantiated from a generic
    Concrete {
        /// Bound type arguments, empty for non-generic types
        type_arguments: Vec<TypeRef>,
    },
    /// A template such as `Array<T>`
    GenericDefinition {
        /// Placeholders in declaration order
        parameters: Vec<TypeRef>,
    },
    /// A placeholder such as the `T` of `Array<T>`
    GenericArgument {
        /// Position in the owning definition's parameter list
        ordinal: usize,
        /// Name of the owning definition
        owner: String,
    },
}

/// Element access through `target[index]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexerSymbol {
    /// Index type
    pub index: TypeRef,
    /// Element type
    pub element: TypeRef,
    /// True when elements cannot be assigned through the indexer
    pub read_only: bool,
}

/// A member declared on a type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeMember {
    /// Instance method
    Method(MethodSymbol),
    /// Indexer
    Indexer(IndexerSymbol),
}

/// A named type
#[derive(Debug, Clone)]
pub struct TypeSymbol {
    name: String,
    namespace: Option<NamespaceSymbol>,
    base: Option<TypeRef>,
    kind: TypeKind,
    members: Vec<TypeMember>,
}

impl TypeSymbol {
    /// A concrete type without members
    pub fn concrete(name: impl Into<String>, base: Option<TypeRef>) -> TypeRef {
        Self::concrete_with_members(name, base, Vec::new())
    }

    /// A concrete type with members
    pub fn concrete_with_members(name: impl Into<String>, base: Option<TypeRef>, members: Vec<TypeMember>) -> TypeRef {
        Arc::new(Self {
            name: name.into(),
            namespace: None,
            base,
            kind: TypeKind::Concrete {
                type_arguments: Vec::new(),
            },
            members,
        })
    }

    /// Placeholder number `ordinal` of the generic definition `owner`
    pub fn generic_argument(name: impl Into<String>, owner: impl Into<String>, ordinal: usize) -> TypeRef {
        Arc::new(Self {
            name: name.into(),
            namespace: None,
            base: None,
            kind: TypeKind::GenericArgument {
                ordinal,
                owner: owner.into(),
            },
            members: Vec::new(),
        })
    }

    /// A generic type definition
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::ForeignPlaceholder`] when a member refers to a
    /// placeholder that is not one of `parameters`.
    pub fn generic_definition(
        name: impl Into<String>,
        base: Option<TypeRef>,
        parameters: Vec<TypeRef>,
        members: Vec<TypeMember>,
    ) -> Result<TypeRef, SymbolError> {
        let name = name.into();
        for member in &members {
            for ty in member_types(member) {
                if ty.is_generic_argument() && !parameters.contains(ty) {
                    return Err(SymbolError::ForeignPlaceholder {
                        name,
                        placeholder: ty.name.clone(),
                    });
                }
            }
        }
        Ok(Self::unchecked_generic_definition(name, base, parameters, members))
    }

    pub(super) fn unchecked_generic_definition(
        name: String,
        base: Option<TypeRef>,
        parameters: Vec<TypeRef>,
        members: Vec<TypeMember>,
    ) -> TypeRef {
        Arc::new(Self {
            name,
            namespace: None,
            base,
            kind: TypeKind::GenericDefinition { parameters },
            members,
        })
    }

    /// Type name without type arguments
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring namespace
    pub fn namespace(&self) -> Option<&NamespaceSymbol> {
        self.namespace.as_ref()
    }

    /// Direct base type, `None` for the universal base
    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    /// Shape of the type
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Declared members
    pub fn members(&self) -> &[TypeMember] {
        &self.members
    }

    /// Bound type arguments of a concrete instantiation
    pub fn type_arguments(&self) -> &[TypeRef] {
        match &self.kind {
            TypeKind::Concrete { type_arguments } => type_arguments,
            TypeKind::GenericDefinition { .. } | TypeKind::GenericArgument { .. } => &[],
        }
    }

    /// Number of type parameters of a generic definition
    pub fn arity(&self) -> usize {
        match &self.kind {
            TypeKind::GenericDefinition { parameters } => parameters.len(),
            TypeKind::Concrete { .. } | TypeKind::GenericArgument { .. } => 0,
        }
    }

    /// Returns true for concrete types
    pub fn is_concrete(&self) -> bool {
        matches!(self.kind, TypeKind::Concrete { .. })
    }

    /// Returns true for generic type definitions
    pub fn is_generic_definition(&self) -> bool {
        matches!(self.kind, TypeKind::GenericDefinition { .. })
    }

    /// Returns true for placeholders
    pub fn is_generic_argument(&self) -> bool {
        matches!(self.kind, TypeKind::GenericArgument { .. })
    }

    /// The indexer, if the type declares one
    pub fn indexer(&self) -> Option<&IndexerSymbol> {
        self.members.iter().find_map(|member| match member {
            TypeMember::Indexer(indexer) => Some(indexer),
            TypeMember::Method(_) => None,
        })
    }

    /// Instance methods with the given name
    pub fn methods_named<'ty>(&'ty self, name: &'ty str) -> impl Iterator<Item = &'ty MethodSymbol> + 'ty {
        self.members.iter().filter_map(move |member| match member {
            TypeMember::Method(method) if method.name == name => Some(method),
            TypeMember::Method(_) | TypeMember::Indexer(_) => None,
        })
    }

    /// Follows base types up to the universal base
    pub fn root(self: &Arc<Self>) -> TypeRef {
        let mut current = Arc::clone(self);
        while let Some(base) = current.base.clone() {
            current = base;
        }
        current
    }

    /// Returns true when `ancestor` is this type or one of its bases
    pub fn derives_from(&self, ancestor: &Self) -> bool {
        if self == ancestor {
            return true;
        }
        self.base.as_ref().is_some_and(|base| base.derives_from(ancestor))
    }

    /// Instantiates a generic type definition with concrete arguments
    ///
    /// Every placeholder appearing in a member signature is replaced by the
    /// argument at its ordinal. Members may only mention concrete types and the
    /// definition's own placeholders, so one level of substitution is complete.
    ///
    /// # Errors
    ///
    /// Fails when the receiver is not a generic definition, when the argument
    /// count differs from its arity, or when an argument is not concrete.
    pub fn make_concrete_type(&self, arguments: &[TypeRef]) -> Result<TypeRef, SymbolError> {
        let TypeKind::GenericDefinition { parameters } = &self.kind else {
            return Err(SymbolError::NotGenericDefinition {
                name: self.to_string(),
            });
        };
        if parameters.len() != arguments.len() {
            return Err(SymbolError::ArityMismatch {
                name: self.name.clone(),
                expected: parameters.len(),
                found: arguments.len(),
            });
        }
        if let Some(argument) = arguments.iter().find(|argument| !argument.is_concrete()) {
            return Err(SymbolError::NonConcreteArgument {
                name: self.name.clone(),
                argument: argument.to_string(),
            });
        }

        let substitute = |ty: &TypeRef| match &ty.kind {
            TypeKind::GenericArgument { ordinal, owner } if *owner == self.name => arguments
                .get(*ordinal)
                .map(Arc::clone)
                .ok_or_else(|| SymbolError::ArityMismatch {
                    name: self.name.clone(),
                    expected: parameters.len(),
                    found: *ordinal + 1,
                }),
            TypeKind::GenericArgument { .. } => Err(SymbolError::ForeignPlaceholder {
                name: self.name.clone(),
                placeholder: ty.name.clone(),
            }),
            TypeKind::Concrete { .. } | TypeKind::GenericDefinition { .. } => Ok(Arc::clone(ty)),
        };

        let members = self
            .members
            .iter()
            .map(|member| match member {
                TypeMember::Method(method) => {
                    let parameters = method
                        .parameters
                        .iter()
                        .map(|parameter| {
                            Ok(ParameterSymbol {
                                name: parameter.name.clone(),
                                ty: substitute(&parameter.ty)?,
                            })
                        })
                        .collect::<Result<Vec<_>, SymbolError>>()?;
                    Ok(TypeMember::Method(MethodSymbol {
                        parameters,
                        return_type: substitute(&method.return_type)?,
                        ..method.clone()
                    }))
                }
                TypeMember::Indexer(indexer) => Ok(TypeMember::Indexer(IndexerSymbol {
                    index: substitute(&indexer.index)?,
                    element: substitute(&indexer.element)?,
                    read_only: indexer.read_only,
                })),
            })
            .collect::<Result<Vec<_>, SymbolError>>()?;

        tracing::trace!(definition = %self.name, arguments = arguments.len(), "instantiated generic type");
        Ok(Arc::new(Self {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            base: self.base.clone(),
            kind: TypeKind::Concrete {
                type_arguments: arguments.to_vec(),
            },
            members,
        }))
    }
}

fn member_types(member: &TypeMember) -> Vec<&TypeRef> {
    match member {
        TypeMember::Method(method) => method
            .parameters
            .iter()
            .map(|parameter| &parameter.ty)
            .chain(iter::once(&method.return_type))
            .collect(),
        TypeMember::Indexer(indexer) => vec![&indexer.index, &indexer.element],
    }
}

/// Closest type both operands convert to
///
/// Types form a single-level hierarchy under `object`, so the answer is the
/// type itself when both are equal and the universal base otherwise.
pub fn find_common_ancestor(left: &TypeRef, right: &TypeRef) -> TypeRef {
    if left == right {
        Arc::clone(left)
    } else {
        left.root()
    }
}

impl PartialEq for TypeSymbol {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.namespace != other.namespace {
            return false;
        }
        match (&self.kind, &other.kind) {
            (
                TypeKind::Concrete { type_arguments: left },
                TypeKind::Concrete { type_arguments: right },
            ) => left == right,
            (TypeKind::GenericDefinition { parameters: left }, TypeKind::GenericDefinition { parameters: right }) => {
                left.len() == right.len()
            }
            (
                TypeKind::GenericArgument { ordinal: left, owner: left_owner },
                TypeKind::GenericArgument { ordinal: right, owner: right_owner },
            ) => left == right && left_owner == right_owner,
            _ => false,
        }
    }
}

impl Eq for TypeSymbol {}

impl Hash for TypeSymbol {
    fn hash<State: Hasher>(&self, state: &mut State) {
        self.name.hash(state);
        self.namespace.hash(state);
        match &self.kind {
            TypeKind::Concrete { type_arguments } => {
                0_u8.hash(state);
                type_arguments.hash(state);
            }
            TypeKind::GenericDefinition { parameters } => {
                1_u8.hash(state);
                parameters.len().hash(state);
            }
            TypeKind::GenericArgument { ordinal, owner } => {
                2_u8.hash(state);
                ordinal.hash(state);
                owner.hash(state);
            }
        }
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.name)?;
        let arguments = match &self.kind {
            TypeKind::Concrete { type_arguments } => type_arguments.as_slice(),
            TypeKind::GenericDefinition { parameters } => parameters.as_slice(),
            TypeKind::GenericArgument { .. } => &[],
        };
        if !arguments.is_empty() {
            formatter.write_str("<")?;
            for (index, argument) in arguments.iter().enumerate() {
                if index > 0 {
                    formatter.write_str(", ")?;
                }
                write!(formatter, "{argument}")?;
            }
            formatter.write_str(">")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::builtins;

    #[test]
    fn test_array_of_int_indexer_returns_int() {
        let builtins = builtins();
        let array = builtins
            .array
            .make_concrete_type(&[Arc::clone(&builtins.int)])
            .expect("instantiate Array<int>");
        let indexer = array.indexer().expect("array indexer");
        assert_eq!(indexer.element, builtins.int);
        assert_ne!(indexer.element.name(), "T");
        assert_eq!(array.to_string(), "Array<int>");
        assert!(array.is_concrete());
    }

    #[test]
    fn test_array_length_survives_substitution() {
        let builtins = builtins();
        let array = builtins
            .array
            .make_concrete_type(&[Arc::clone(&builtins.string)])
            .expect("instantiate Array<string>");
        let length = array.methods_named("Length").next().expect("Length member");
        assert_eq!(length.return_type, builtins.int);
    }

    #[test]
    fn test_nested_instantiation() {
        let builtins = builtins();
        let inner = builtins.array.make_concrete_type(&[Arc::clone(&builtins.int)]).expect("inner");
        let outer = builtins.array.make_concrete_type(&[Arc::clone(&inner)]).expect("outer");
        assert_eq!(outer.indexer().map(|indexer| &indexer.element), Some(&inner));
        assert_eq!(outer.to_string(), "Array<Array<int>>");
    }

    #[test]
    fn test_arity_mismatch_is_rejected() {
        let builtins = builtins();
        let result = builtins
            .array
            .make_concrete_type(&[Arc::clone(&builtins.int), Arc::clone(&builtins.int)]);
        assert_eq!(
            result,
            Err(SymbolError::ArityMismatch {
                name: "Array".to_string(),
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn test_non_concrete_argument_is_rejected() {
        let builtins = builtins();
        let placeholder = TypeSymbol::generic_argument("U", "Other", 0);
        let result = builtins.array.make_concrete_type(&[placeholder]);
        assert!(matches!(result, Err(SymbolError::NonConcreteArgument { .. })));
    }

    #[test]
    fn test_concrete_receiver_is_rejected() {
        let builtins = builtins();
        let result = builtins.int.make_concrete_type(&[]);
        assert!(matches!(result, Err(SymbolError::NotGenericDefinition { .. })));
    }

    #[test]
    fn test_foreign_placeholder_in_definition() {
        let builtins = builtins();
        let foreign = TypeSymbol::generic_argument("U", "Other", 0);
        let own = TypeSymbol::generic_argument("T", "Box", 0);
        let result = TypeSymbol::generic_definition(
            "Box",
            Some(Arc::clone(&builtins.object)),
            vec![own],
            vec![TypeMember::Indexer(IndexerSymbol {
                index: Arc::clone(&builtins.int),
                element: foreign,
                read_only: true,
            })],
        );
        assert!(matches!(result, Err(SymbolError::ForeignPlaceholder { .. })));
    }

    #[test]
    fn test_structural_equality_ignores_identity() {
        let first = TypeSymbol::concrete("int", None);
        let second = TypeSymbol::concrete("int", None);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_common_ancestor() {
        let builtins = builtins();
        assert_eq!(find_common_ancestor(&builtins.int, &builtins.int), builtins.int);
        assert_eq!(find_common_ancestor(&builtins.int, &builtins.string), builtins.object);
        assert!(builtins.string.derives_from(&builtins.object));
    }
}
