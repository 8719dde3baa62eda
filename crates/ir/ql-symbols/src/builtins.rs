//! Built-in symbol table

use crate::symbols::{MethodKind, MethodSymbol, ParameterSymbol};
use crate::types::{IndexerSymbol, TypeMember, TypeRef, TypeSymbol};
use crate::value::ConstValue;
use std::sync::{Arc, LazyLock};

/// Methods implemented by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinMethod {
    /// `print(object)` appends the value to the evaluation output
    Print,
    /// `len(string)` counts characters
    Len,
    /// `Array<T>.Length()`
    ArrayLength,
}

/// Types and methods every compilation can see
#[derive(Debug)]
pub struct Builtins {
    /// Universal base type
    pub object: TypeRef,
    /// 64-bit integer
    pub int: TypeRef,
    /// 64-bit float
    pub float: TypeRef,
    /// Boolean
    pub bool: TypeRef,
    /// String
    pub string: TypeRef,
    /// Character
    pub char: TypeRef,
    /// Absence of a value
    pub void: TypeRef,
    /// Type of expressions that failed to bind
    pub error: TypeRef,
    /// Generic definition `Array<T>`
    pub array: TypeRef,
    methods: Vec<MethodSymbol>,
}

static BUILTINS: LazyLock<Builtins> = LazyLock::new(Builtins::new);

/// The shared built-in symbol table
pub fn builtins() -> &'static Builtins {
    &BUILTINS
}

impl Builtins {
    fn new() -> Self {
        let object = TypeSymbol::concrete("object", None);
        let derived = |name: &str| TypeSymbol::concrete(name, Some(Arc::clone(&object)));
        let int = derived("int");
        let float = derived("float");
        let bool = derived("bool");
        let string = derived("string");
        let char = derived("char");
        let void = derived("void");
        let error = TypeSymbol::concrete("?", None);

        let element = TypeSymbol::generic_argument("T", "Array", 0);
        let array = TypeSymbol::unchecked_generic_definition(
            "Array".to_string(),
            Some(Arc::clone(&object)),
            vec![Arc::clone(&element)],
            vec![
                TypeMember::Indexer(IndexerSymbol {
                    index: Arc::clone(&int),
                    element,
                    read_only: false,
                }),
                TypeMember::Method(MethodSymbol {
                    name: "Length".to_string(),
                    namespace: None,
                    parameters: Vec::new(),
                    return_type: Arc::clone(&int),
                    kind: MethodKind::Builtin(BuiltinMethod::ArrayLength),
                }),
            ],
        );

        let methods = vec![
            MethodSymbol {
                name: "print".to_string(),
                namespace: None,
                parameters: vec![ParameterSymbol {
                    name: "value".to_string(),
                    ty: Arc::clone(&object),
                }],
                return_type: Arc::clone(&void),
                kind: MethodKind::Builtin(BuiltinMethod::Print),
            },
            MethodSymbol {
                name: "len".to_string(),
                namespace: None,
                parameters: vec![ParameterSymbol {
                    name: "text".to_string(),
                    ty: Arc::clone(&string),
                }],
                return_type: Arc::clone(&int),
                kind: MethodKind::Builtin(BuiltinMethod::Len),
            },
        ];

        Self {
            object,
            int,
            float,
            bool,
            string,
            char,
            void,
            error,
            array,
            methods,
        }
    }

    /// Global built-in methods
    pub fn methods(&self) -> &[MethodSymbol] {
        &self.methods
    }

    /// Looks up a built-in type or generic definition by name
    pub fn lookup_type(&self, name: &str) -> Option<TypeRef> {
        let ty = match name {
            "object" => &self.object,
            "int" => &self.int,
            "float" => &self.float,
            "bool" => &self.bool,
            "string" => &self.string,
            "char" => &self.char,
            "void" => &self.void,
            "Array" => &self.array,
            _ => return None,
        };
        Some(Arc::clone(ty))
    }

    /// Type of a literal value
    pub fn type_of(&self, value: &ConstValue) -> TypeRef {
        let ty = match value {
            ConstValue::Int(_) => &self.int,
            ConstValue::Float(_) => &self.float,
            ConstValue::Bool(_) => &self.bool,
            ConstValue::String(_) => &self.string,
            ConstValue::Char(_) => &self.char,
        };
        Arc::clone(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_derive_from_object() {
        let builtins = builtins();
        for name in ["int", "float", "bool", "string", "char"] {
            let ty = builtins.lookup_type(name).expect("builtin type");
            assert_eq!(ty.base(), Some(&builtins.object));
        }
        assert!(builtins.object.base().is_none());
    }

    #[test]
    fn test_array_is_generic_definition() {
        let builtins = builtins();
        assert!(builtins.array.is_generic_definition());
        assert_eq!(builtins.array.arity(), 1);
        assert_eq!(builtins.array.to_string(), "Array<T>");
    }

    #[test]
    fn test_literal_types() {
        let builtins = builtins();
        assert_eq!(builtins.type_of(&ConstValue::Char('q')), builtins.char);
        assert_eq!(builtins.type_of(&ConstValue::from("q")), builtins.string);
    }
}
