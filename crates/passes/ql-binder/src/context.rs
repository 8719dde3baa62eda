//! State shared while binding one program

use crate::BindError;
use crate::scope::{ScopeId, ScopeKind, ScopeTree};
use indexmap::IndexMap;
use ql_diagnostics::{DiagnosticBag, DiagnosticKind};
use ql_span::{SourceText, Span};
use ql_symbols::{
    InstantiationCache, LabelAllocator, MethodId, MethodSymbol, NamespaceSymbol, TypeRef, VariableId, builtins,
};
use ql_syntax::{SyntaxKind, SyntaxNode};
use std::sync::Arc;

/// Symbol tables, counters and diagnostics for one binding run
#[derive(Debug)]
pub struct BindContext {
    /// Every scope opened so far
    pub scopes: ScopeTree,
    /// Reported diagnostics
    pub diagnostics: DiagnosticBag,
    /// Label numbering shared with lowering
    pub labels: LabelAllocator,
    /// Generic instantiations requested by type references
    pub instances: InstantiationCache,
    /// Methods of every declared namespace, in declaration order
    pub namespaces: IndexMap<NamespaceSymbol, Vec<MethodSymbol>>,
    source: Option<Arc<SourceText>>,
    next_variable: u32,
    next_method: u32,
}

impl Default for BindContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BindContext {
    /// Creates a context whose global scope holds the built-in methods
    pub fn new() -> Self {
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        for method in builtins().methods() {
            scopes.declare_method(root, method.clone());
        }
        Self {
            scopes,
            diagnostics: DiagnosticBag::new(),
            labels: LabelAllocator::new(),
            instances: InstantiationCache::new(),
            namespaces: IndexMap::new(),
            source: None,
            next_variable: 0,
            next_method: 0,
        }
    }

    /// Source text attached to diagnostics reported from now on
    pub fn set_source(&mut self, source: Option<Arc<SourceText>>) {
        self.source = source;
    }

    /// Reports `kind` at `span` of the current source
    pub fn report(&mut self, span: Span, kind: DiagnosticKind) {
        self.diagnostics.report(self.source.as_ref(), span, kind);
    }

    /// Identity for a newly declared variable
    pub fn fresh_variable_id(&mut self) -> VariableId {
        self.next_variable += 1;
        VariableId(self.next_variable)
    }

    /// Identity for a newly declared method
    pub fn fresh_method_id(&mut self) -> MethodId {
        self.next_method += 1;
        MethodId(self.next_method)
    }

    /// Resolves a type reference, reporting unknown names and bad arity
    ///
    /// Failures yield the error type so binding can continue.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] when `node` is not a type reference or a checked
    /// instantiation still fails.
    pub fn resolve_type(&mut self, node: &SyntaxNode) -> Result<TypeRef, BindError> {
        let builtins = builtins();
        let error = || Ok(Arc::clone(&builtins.error));
        match node.kind {
            SyntaxKind::TypeName => match builtins.lookup_type(&node.text) {
                None => {
                    self.report(node.span, DiagnosticKind::UndefinedType { name: node.text.clone() });
                    error()
                }
                Some(ty) if ty.is_generic_definition() => {
                    self.report(
                        node.span,
                        DiagnosticKind::WrongTypeArgumentCount {
                            name: node.text.clone(),
                            expected: ty.arity(),
                            found: 0,
                        },
                    );
                    error()
                }
                Some(ty) => Ok(ty),
            },
            SyntaxKind::GenericTypeName => {
                let Some(definition) = builtins.lookup_type(&node.text) else {
                    self.report(node.span, DiagnosticKind::UndefinedType { name: node.text.clone() });
                    return error();
                };
                let expected = if definition.is_generic_definition() { definition.arity() } else { 0 };
                if expected != node.children.len() {
                    self.report(
                        node.span,
                        DiagnosticKind::WrongTypeArgumentCount {
                            name: node.text.clone(),
                            expected,
                            found: node.children.len(),
                        },
                    );
                    return error();
                }
                let mut arguments = Vec::with_capacity(node.children.len());
                for child in &node.children {
                    arguments.push(self.resolve_type(child)?);
                }
                if arguments.iter().any(|argument| *argument == builtins.error) {
                    return error();
                }
                Ok(self.instances.instantiate(&definition, &arguments)?)
            }
            kind => Err(BindError::UnexpectedNode {
                kind,
                span: node.span,
                expected: "a type",
            }),
        }
    }

    /// Candidate methods for a bare name, grouped by lookup level
    ///
    /// Levels run from the innermost declaring scope outward: enclosing
    /// namespace members come in their scope's position, the global scope
    /// last among scopes, and every imported namespace of the unit together
    /// as a final level. Empty levels are skipped.
    pub fn method_levels(&self, scope: ScopeId, name: &str) -> Vec<Vec<MethodSymbol>> {
        let mut levels: Vec<Vec<MethodSymbol>> = self
            .scopes
            .ancestors(scope)
            .into_iter()
            .map(|id| match &self.scopes.get(id).kind {
                ScopeKind::Namespace(namespace) => self.namespace_methods(namespace, name).unwrap_or_default(),
                _ => self.scopes.methods_named(id, name),
            })
            .collect();
        levels.push(
            self.scopes
                .imports(scope)
                .iter()
                .filter_map(|namespace| self.namespace_methods(namespace, name))
                .flatten()
                .collect(),
        );
        levels.retain(|level| !level.is_empty());
        levels
    }

    /// Methods named `name` in `namespace`, `None` when the namespace is unknown
    pub fn namespace_methods(&self, namespace: &NamespaceSymbol, name: &str) -> Option<Vec<MethodSymbol>> {
        self.namespaces.get(namespace).map(|methods| {
            methods
                .iter()
                .filter(|method| method.name == name)
                .cloned()
                .collect()
        })
    }
}
