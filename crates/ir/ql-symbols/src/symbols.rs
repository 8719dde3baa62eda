//! Variable, method, label and namespace symbols

use crate::builtins::BuiltinMethod;
use crate::types::TypeRef;
use crate::value::ConstValue;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// What a symbol names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A type
    Type,
    /// A local variable or constant
    Variable,
    /// A method
    Method,
    /// A method parameter
    Parameter,
    /// A goto target
    Label,
    /// A namespace
    Namespace,
}

/// Dotted namespace name such as `Geo.Shapes`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceSymbol {
    segments: Vec<String>,
}

impl NamespaceSymbol {
    /// Splits a dotted name into segments
    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted.split('.').map(str::to_string).collect(),
        }
    }

    /// Builds a namespace from already split segments
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Name segments in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for NamespaceSymbol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.segments.join("."))
    }
}

/// Stable identity of a variable within one compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub u32);

/// How a variable came to exist
#[derive(Debug, Clone, PartialEq)]
pub enum VariableKind {
    /// Declared with `var` or `const` in a method body
    Local,
    /// Parameter at the given position
    Parameter(usize),
    /// Constant carrying its literal value
    Constant(ConstValue),
}

/// A variable, parameter or constant
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSymbol {
    /// Identity, distinguishes shadowed variables with equal names
    pub id: VariableId,
    /// Source name
    pub name: String,
    /// Declared or inferred type
    pub ty: TypeRef,
    /// True when the variable cannot be assigned after declaration
    pub read_only: bool,
    /// Local, parameter or constant
    pub kind: VariableKind,
}

/// Shared handle to a variable symbol
pub type VariableRef = Arc<VariableSymbol>;

impl VariableSymbol {
    /// A local variable
    pub fn local(id: VariableId, name: impl Into<String>, ty: TypeRef, read_only: bool) -> VariableRef {
        Arc::new(Self {
            id,
            name: name.into(),
            ty,
            read_only,
            kind: VariableKind::Local,
        })
    }

    /// A parameter at `ordinal`
    pub fn parameter(id: VariableId, name: impl Into<String>, ty: TypeRef, ordinal: usize) -> VariableRef {
        Arc::new(Self {
            id,
            name: name.into(),
            ty,
            read_only: false,
            kind: VariableKind::Parameter(ordinal),
        })
    }

    /// A constant, always read-only
    pub fn constant(id: VariableId, name: impl Into<String>, ty: TypeRef, value: ConstValue) -> VariableRef {
        Arc::new(Self {
            id,
            name: name.into(),
            ty,
            read_only: true,
            kind: VariableKind::Constant(value),
        })
    }

    /// The same variable marked read-only
    pub fn promoted(&self) -> VariableRef {
        Arc::new(Self {
            read_only: true,
            ..self.clone()
        })
    }

    /// Literal value of a constant
    pub fn constant_value(&self) -> Option<&ConstValue> {
        match &self.kind {
            VariableKind::Constant(value) => Some(value),
            VariableKind::Local | VariableKind::Parameter(_) => None,
        }
    }

    /// Returns true for parameters
    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, VariableKind::Parameter(_))
    }
}

/// A declared parameter of a method signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterSymbol {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: TypeRef,
}

/// Identity of a method declaration within one compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub u32);

/// Where a method's body comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Declared in source
    User(MethodId),
    /// Implemented by the evaluator
    Builtin(BuiltinMethod),
}

/// A method signature
///
/// Equality covers name, namespace, parameter types and return type, which is
/// exactly what distinguishes overloads.
#[derive(Debug, Clone)]
pub struct MethodSymbol {
    /// Method name
    pub name: String,
    /// Declaring namespace
    pub namespace: Option<NamespaceSymbol>,
    /// Ordered parameters
    pub parameters: Vec<ParameterSymbol>,
    /// Return type, `void` for procedures
    pub return_type: TypeRef,
    /// Source of the body
    pub kind: MethodKind,
}

impl MethodSymbol {
    /// Returns true when both signatures take the same parameter types
    pub fn same_parameters(&self, other: &Self) -> bool {
        self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(left, right)| left.ty == right.ty)
    }

    /// Name including its namespace
    pub fn qualified_name(&self) -> String {
        self.namespace
            .as_ref()
            .map_or_else(|| self.name.clone(), |namespace| format!("{namespace}.{}", self.name))
    }
}

impl PartialEq for MethodSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.return_type == other.return_type
            && self.same_parameters(other)
    }
}

impl Eq for MethodSymbol {}

impl Hash for MethodSymbol {
    fn hash<State: Hasher>(&self, state: &mut State) {
        self.name.hash(state);
        self.namespace.hash(state);
        self.return_type.hash(state);
        for parameter in &self.parameters {
            parameter.ty.hash(state);
        }
    }
}

impl fmt::Display for MethodSymbol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}(", self.qualified_name())?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{}", parameter.ty)?;
        }
        write!(formatter, "): {}", self.return_type)
    }
}

/// A goto target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelSymbol {
    /// Unique within one compilation
    pub id: u32,
    /// Display name
    pub name: String,
}

impl fmt::Display for LabelSymbol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.name)
    }
}

/// Hands out labels that are never reused within a compilation
#[derive(Debug, Default, Clone)]
pub struct LabelAllocator {
    next: u32,
}

impl LabelAllocator {
    /// Creates an allocator starting at id 1
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generated label named `{prefix}{id}`
    pub fn fresh(&mut self, prefix: &str) -> LabelSymbol {
        self.next += 1;
        LabelSymbol {
            id: self.next,
            name: format!("{prefix}{}", self.next),
        }
    }

    /// Label with a user-written name
    pub fn named(&mut self, name: &str) -> LabelSymbol {
        self.next += 1;
        LabelSymbol {
            id: self.next,
            name: name.to_string(),
        }
    }
}
