//! Lexical scopes
//!
//! Scopes form a tree: global, then one per compilation unit, then namespace
//! bodies, methods and blocks. Variables stop resolving at the nearest method
//! scope, so nested methods never capture locals of their parent.

use la_arena::{Arena, Idx};
use ql_symbols::{MethodSymbol, NamespaceSymbol, VariableRef};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Unique identifier for a scope
pub type ScopeId = Idx<ScopeData>;

/// What opened a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    /// Built-in and global methods
    Global,
    /// One compilation unit, holds its imports and aliases
    Unit,
    /// Methods declared inside `namespace name { ... }`
    Namespace(NamespaceSymbol),
    /// Parameters and labels of one method
    Method,
    /// `{ ... }` or a `for` header
    Block,
}

/// A scope in the source code
#[derive(Debug, Clone)]
pub struct ScopeData {
    /// Enclosing scope, `None` only for the global scope
    pub parent: Option<ScopeId>,
    /// What opened the scope
    pub kind: ScopeKind,
    variables: FxHashMap<String, VariableRef>,
    methods: Vec<MethodSymbol>,
    imports: Vec<NamespaceSymbol>,
    aliases: FxHashMap<String, NamespaceSymbol>,
}

/// Every scope created while binding one program
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Arena<ScopeData>,
    root: ScopeId,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Creates a tree holding only the global scope
    pub fn new() -> Self {
        let mut scopes = Arena::new();
        let root = scopes.alloc(ScopeData::new(None, ScopeKind::Global));
        Self { scopes, root }
    }

    /// The global scope
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Opens a child scope of `parent`
    pub fn enter(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        self.scopes.alloc(ScopeData::new(Some(parent), kind))
    }

    /// Scope data
    pub fn get(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id]
    }

    /// Declares `variable` in `scope`
    ///
    /// Returns false when the scope already declares a variable of that name.
    pub fn declare_variable(&mut self, scope: ScopeId, variable: &VariableRef) -> bool {
        let variables = &mut self.scopes[scope].variables;
        if variables.contains_key(&variable.name) {
            return false;
        }
        variables.insert(variable.name.clone(), Arc::clone(variable));
        true
    }

    /// Resolves a variable, walking outward up to the enclosing method
    pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> Option<VariableRef> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = &self.scopes[id];
            if let Some(variable) = data.variables.get(name) {
                return Some(Arc::clone(variable));
            }
            if data.kind == ScopeKind::Method {
                return None;
            }
            current = data.parent;
        }
        None
    }

    /// Declares `method` in `scope`
    ///
    /// Returns false when the scope already declares a method with the same
    /// name and parameter types.
    pub fn declare_method(&mut self, scope: ScopeId, method: MethodSymbol) -> bool {
        let methods = &mut self.scopes[scope].methods;
        if methods
            .iter()
            .any(|existing| existing.name == method.name && existing.same_parameters(&method))
        {
            return false;
        }
        methods.push(method);
        true
    }

    /// Methods named `name` declared directly in `scope`
    pub fn methods_named(&self, scope: ScopeId, name: &str) -> Vec<MethodSymbol> {
        self.scopes[scope]
            .methods
            .iter()
            .filter(|method| method.name == name)
            .cloned()
            .collect()
    }

    /// Scopes from `scope` outward to the global scope
    pub fn ancestors(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![scope];
        while let Some(parent) = chain.last().and_then(|last| self.scopes[*last].parent) {
            chain.push(parent);
        }
        chain
    }

    /// Nearest enclosing compilation unit scope
    pub fn unit_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.ancestors(scope)
            .into_iter()
            .find(|id| self.scopes[*id].kind == ScopeKind::Unit)
    }

    /// Records `with namespace;` in a unit scope
    pub fn import(&mut self, unit: ScopeId, namespace: NamespaceSymbol) {
        let imports = &mut self.scopes[unit].imports;
        if !imports.contains(&namespace) {
            imports.push(namespace);
        }
    }

    /// Records `with alias = namespace;` in a unit scope
    pub fn alias(&mut self, unit: ScopeId, alias: &str, namespace: NamespaceSymbol) {
        self.scopes[unit].aliases.insert(alias.to_string(), namespace);
    }

    /// Namespaces imported by the unit enclosing `scope`
    pub fn imports(&self, scope: ScopeId) -> &[NamespaceSymbol] {
        self.unit_of(scope)
            .map_or(&[][..], |unit| self.scopes[unit].imports.as_slice())
    }

    /// Namespace bound to `alias` in the unit enclosing `scope`
    pub fn resolve_alias(&self, scope: ScopeId, alias: &str) -> Option<&NamespaceSymbol> {
        self.unit_of(scope)
            .and_then(|unit| self.scopes[unit].aliases.get(alias))
    }
}

impl ScopeData {
    fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            parent,
            kind,
            variables: FxHashMap::default(),
            methods: Vec::new(),
            imports: Vec::new(),
            aliases: FxHashMap::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_symbols::{VariableId, VariableSymbol, builtins};

    fn variable(id: u32, name: &str) -> VariableRef {
        VariableSymbol::local(VariableId(id), name, Arc::clone(&builtins().int), false)
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut tree = ScopeTree::new();
        let method = tree.enter(tree.root(), ScopeKind::Method);
        let block = tree.enter(method, ScopeKind::Block);
        assert!(tree.declare_variable(method, &variable(1, "x")));
        assert!(tree.declare_variable(block, &variable(2, "x")));
        assert_eq!(tree.lookup_variable(block, "x").map(|found| found.id), Some(VariableId(2)));
        assert_eq!(tree.lookup_variable(method, "x").map(|found| found.id), Some(VariableId(1)));
    }

    #[test]
    fn test_redeclaration_in_same_scope_is_rejected() {
        let mut tree = ScopeTree::new();
        let method = tree.enter(tree.root(), ScopeKind::Method);
        assert!(tree.declare_variable(method, &variable(1, "x")));
        assert!(!tree.declare_variable(method, &variable(2, "x")));
    }

    #[test]
    fn test_variables_stop_at_method_boundary() {
        let mut tree = ScopeTree::new();
        let outer = tree.enter(tree.root(), ScopeKind::Method);
        tree.declare_variable(outer, &variable(1, "x"));
        let block = tree.enter(outer, ScopeKind::Block);
        let nested = tree.enter(block, ScopeKind::Method);
        assert!(tree.lookup_variable(block, "x").is_some());
        assert!(tree.lookup_variable(nested, "x").is_none());
    }

    #[test]
    fn test_imports_are_found_from_nested_scopes() {
        let mut tree = ScopeTree::new();
        let unit = tree.enter(tree.root(), ScopeKind::Unit);
        tree.import(unit, NamespaceSymbol::parse("Geo"));
        tree.alias(unit, "g", NamespaceSymbol::parse("Geo.Shapes"));
        let method = tree.enter(unit, ScopeKind::Method);
        assert_eq!(tree.imports(method), &[NamespaceSymbol::parse("Geo")]);
        assert_eq!(tree.resolve_alias(method, "g").map(ToString::to_string), Some("Geo.Shapes".to_string()));
    }
}
