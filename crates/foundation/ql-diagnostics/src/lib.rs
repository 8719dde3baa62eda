//! User-facing diagnostics
//!
//! Every binder rule that can fail on well-formed syntax reports a [`Diagnostic`]
//! into a [`DiagnosticBag`] and keeps going. Internal invariant violations are
//! not diagnostics; each pipeline crate has its own error type for those.

use ql_span::{SourceText, Span};
use serde::Serialize;
use std::sync::Arc;
use std::{fmt, slice, vec};
use thiserror::Error;

/// What went wrong
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind")]
pub enum DiagnosticKind {
    /// A variable with this name already exists in the same scope
    #[error("variable '{name}' is already declared in this scope")]
    VariableAlreadyDeclared {
        /// Variable name
        name: String,
    },
    /// A method with the same signature already exists in the same scope
    #[error("method '{name}' is already declared with the same signature")]
    MethodAlreadyDeclared {
        /// Method name
        name: String,
    },
    /// A label with this name already exists in the same method
    #[error("label '{name}' is already declared in this method")]
    LabelAlreadyDeclared {
        /// Label name
        name: String,
    },
    /// No variable with this name is visible
    #[error("variable '{name}' doesn't exist")]
    UndefinedName {
        /// Variable name
        name: String,
    },
    /// No method with this name is visible
    #[error("method '{name}' doesn't exist")]
    UndefinedMethod {
        /// Method name
        name: String,
    },
    /// No type with this name exists
    #[error("type '{name}' doesn't exist")]
    UndefinedType {
        /// Type name
        name: String,
    },
    /// No namespace with this name exists
    #[error("namespace '{name}' doesn't exist")]
    UndefinedNamespace {
        /// Dotted namespace name
        name: String,
    },
    /// The type has no member with this name
    #[error("type '{type_name}' has no member '{member}'")]
    UndefinedMember {
        /// Receiver type
        type_name: String,
        /// Member name
        member: String,
    },
    /// A goto targets a label that is not declared in the method
    #[error("label '{name}' doesn't exist")]
    UndefinedLabel {
        /// Label name
        name: String,
    },
    /// More than one symbol matches a reference equally well
    #[error("reference to '{name}' is ambiguous between {candidates}")]
    AmbigousSymbolReference {
        /// Referenced name
        name: String,
        /// Rendered candidate signatures
        candidates: String,
    },
    /// No unary operator accepts the operand type
    #[error("unary operator '{operator}' is not defined for type '{operand}'")]
    UndefinedUnaryOperator {
        /// Operator text
        operator: String,
        /// Operand type
        operand: String,
    },
    /// No binary operator accepts the operand types
    #[error("binary operator '{operator}' is not defined for types '{left}' and '{right}'")]
    UndefinedBinaryOperator {
        /// Operator text
        operator: String,
        /// Left operand type
        left: String,
        /// Right operand type
        right: String,
    },
    /// Only an explicit conversion exists between the types
    #[error("cannot implicitly convert type '{from}' to '{to}', an explicit conversion exists")]
    CannotImplicitlyConvert {
        /// Source type
        from: String,
        /// Target type
        to: String,
    },
    /// No conversion exists between the types
    #[error("cannot convert type '{from}' to '{to}'")]
    NoExplicitConversion {
        /// Source type
        from: String,
        /// Target type
        to: String,
    },
    /// Assignment to a read-only variable or constant
    #[error("'{name}' is read-only and cannot be assigned to")]
    CannotAssignReadOnly {
        /// Variable name
        name: String,
    },
    /// The left side of an assignment is not assignable
    #[error("the left-hand side of an assignment must be a variable or an indexer")]
    InvalidAssignmentTarget,
    /// `break` or `continue` outside of a loop
    #[error("'{keyword}' can only be used inside a loop")]
    InvalidBreakOrContinue {
        /// Offending keyword
        keyword: String,
    },
    /// Call with the wrong number of arguments
    #[error("method '{name}' requires {expected} arguments but was given {found}")]
    WrongArgumentCount {
        /// Method name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        found: usize,
    },
    /// No overload accepts the argument types
    #[error("no overload of '{name}' accepts arguments ({arguments})")]
    NoMatchingOverload {
        /// Method name
        name: String,
        /// Rendered argument types
        arguments: String,
    },
    /// Generic type used with the wrong number of type arguments
    #[error("type '{name}' requires {expected} type arguments but was given {found}")]
    WrongTypeArgumentCount {
        /// Generic type name
        name: String,
        /// Declared arity
        expected: usize,
        /// Supplied count
        found: usize,
    },
    /// Indexing a type without an indexer
    #[error("cannot apply indexing to an expression of type '{type_name}'")]
    CannotIndex {
        /// Receiver type
        type_name: String,
    },
    /// A void expression used where a value is needed
    #[error("expression must have a value")]
    ExpressionMustHaveValue,
    /// `return expr;` inside a void method
    #[error("method '{name}' returns void, so a return keyword must not be followed by an expression")]
    InvalidReturn {
        /// Method name
        name: String,
    },
    /// Bare `return;` inside a non-void method
    #[error("method '{name}' must return a value of type '{type_name}'")]
    MissingReturnValue {
        /// Method name
        name: String,
        /// Declared return type
        type_name: String,
    },
    /// Some control path falls off the end of a non-void method
    #[error("not all code paths of '{name}' return a value")]
    NotAllPathsReturn {
        /// Method name
        name: String,
    },
    /// Literal text that does not denote a value of its type
    #[error("'{text}' is not a valid {type_name} literal")]
    InvalidLiteral {
        /// Literal text
        text: String,
        /// Literal type
        type_name: String,
    },
    /// Top-level statements next to an explicit `main`
    #[error("cannot declare 'main' when top-level statements are used")]
    MainWithTopLevelStatements,
    /// Top-level statements spread over several compilation units
    #[error("only one compilation unit can contain top-level statements")]
    TopLevelStatementsInMultipleUnits,
    /// `main` with parameters or a non-void return type
    #[error("'main' must not take parameters and must return void")]
    InvalidMainSignature,
    /// Fault raised while evaluating the program
    #[error("runtime error: {message}")]
    Runtime {
        /// Fault description
        message: String,
    },
    /// Internal invariant violation surfaced to the caller
    #[error("internal error: {message}")]
    Internal {
        /// Error description
        message: String,
    },
}

/// A diagnostic with its location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Source the span refers to, when known
    #[serde(skip)]
    pub source: Option<Arc<SourceText>>,
    /// Offending span
    pub span: Span,
    /// Diagnostic kind and payload
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Creates a diagnostic
    #[must_use]
    pub fn new(source: Option<Arc<SourceText>>, span: Span, kind: DiagnosticKind) -> Self {
        Self { source, span, kind }
    }

    /// Message without location
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(source) = &self.source else {
            return write!(formatter, "{}", self.kind);
        };
        write!(formatter, "{}: {}", source.location(self.span.start), self.kind)
    }
}

/// Ordered diagnostic list
///
/// Keeps at most one diagnostic per span of a source. The first report wins,
/// so a later check cannot pile a second message onto a node already flagged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Creates an empty bag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic unless one is already present at its span
    pub fn push(&mut self, diagnostic: Diagnostic) {
        let reported = self
            .diagnostics
            .iter()
            .any(|existing| existing.span == diagnostic.span && existing.source == diagnostic.source);
        if !reported {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Reports `kind` at `span` of `source`
    pub fn report(&mut self, source: Option<&Arc<SourceText>>, span: Span, kind: DiagnosticKind) {
        self.push(Diagnostic::new(source.map(Arc::clone), span, kind));
    }

    /// Appends every diagnostic of `other`, keeping de-duplication
    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in other {
            self.push(diagnostic);
        }
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns true when nothing was reported
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterates in report order
    pub fn iter(&self) -> slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Consumes the bag
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'bag> IntoIterator for &'bag DiagnosticBag {
    type Item = &'bag Diagnostic;
    type IntoIter = slice::Iter<'bag, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redeclared(name: &str) -> DiagnosticKind {
        DiagnosticKind::VariableAlreadyDeclared {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_display_with_source_has_location() {
        let source = Arc::new(SourceText::new("main.ql", "var x = 10;\nvar x = 5;"));
        let diagnostic = Diagnostic::new(Some(source), Span::new(16, 17), redeclared("x"));
        assert_eq!(
            diagnostic.to_string(),
            "(2, 5): variable 'x' is already declared in this scope"
        );
    }

    #[test]
    fn test_display_without_source_is_message() {
        let diagnostic = Diagnostic::new(None, Span::new(16, 17), redeclared("x"));
        assert_eq!(diagnostic.to_string(), diagnostic.message());
    }

    #[test]
    fn test_bag_drops_duplicates() {
        let mut bag = DiagnosticBag::new();
        bag.report(None, Span::new(1, 2), redeclared("x"));
        bag.report(None, Span::new(1, 2), redeclared("x"));
        bag.report(None, Span::new(3, 4), redeclared("x"));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_bag_keeps_first_report_at_a_span() {
        let mut bag = DiagnosticBag::new();
        bag.report(None, Span::new(4, 5), DiagnosticKind::InvalidMainSignature);
        bag.report(
            None,
            Span::new(4, 5),
            DiagnosticKind::NotAllPathsReturn {
                name: "main".to_string(),
            },
        );
        assert_eq!(bag.len(), 1);
        assert_eq!(
            bag.iter().next().map(|diagnostic| &diagnostic.kind),
            Some(&DiagnosticKind::InvalidMainSignature)
        );
    }

    #[test]
    fn test_diagnostic_serializes_kind_and_span() {
        let diagnostic = Diagnostic::new(None, Span::new(0, 1), DiagnosticKind::ExpressionMustHaveValue);
        let json = serde_json::to_value(&diagnostic).expect("serialize diagnostic");
        assert_eq!(json["kind"], "ExpressionMustHaveValue");
        assert_eq!(json["span"]["end"], 1);
    }
}
