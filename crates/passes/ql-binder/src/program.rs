//! Declarations, entry point rules and the binding driver

use crate::BindError;
use crate::context::BindContext;
use crate::method::{PendingMethod, bind_method, bind_signature};
use crate::scope::ScopeKind;
use ql_bound::BoundProgram;
use ql_diagnostics::DiagnosticKind;
use ql_lower::LowerOptions;
use ql_span::{SourceText, Span};
use ql_symbols::{MethodKind, MethodSymbol, NamespaceSymbol, builtins};
use ql_syntax::{SyntaxKind, SyntaxNode, SyntaxTree};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Name of the entry method
const ENTRY_NAME: &str = "main";

/// Knobs for binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOptions {
    /// Report `NotAllPathsReturn` for value-returning methods
    pub check_all_paths_return: bool,
    /// Lowering used by the return-path check
    pub lowering: LowerOptions,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            check_all_paths_return: true,
            lowering: LowerOptions::default(),
        }
    }
}

/// Explicit `main` seen while declaring
struct ExplicitMain {
    symbol: MethodSymbol,
    span: Span,
    source: Option<Arc<SourceText>>,
    valid: bool,
}

/// Binds every compilation unit into one program
///
/// Declarations of all units are collected first, so methods and namespaces
/// resolve regardless of declaration order. Bodies are bound afterwards in
/// declaration order; the entry method synthesized from top-level statements
/// comes last.
///
/// # Errors
///
/// Returns [`BindError`] when a syntax tree is malformed. Problems in
/// well-formed trees are reported as diagnostics on the returned program.
#[instrument(level = "debug", skip_all, fields(units = trees.len()))]
pub fn bind_program(trees: &[SyntaxTree], options: &BindOptions) -> Result<BoundProgram, BindError> {
    let mut ctx = BindContext::new();
    let root = ctx.scopes.root();
    let mut units = Vec::with_capacity(trees.len());
    let mut pending = Vec::new();
    let mut top_level: Vec<Vec<SyntaxNode>> = Vec::with_capacity(trees.len());
    let mut explicit_main: Option<ExplicitMain> = None;

    for tree in trees {
        ctx.set_source(tree.source.clone());
        let unit = ctx.scopes.enter(root, ScopeKind::Unit);
        units.push(unit);
        let mut statements = Vec::new();
        for member in tree.members() {
            match member.kind {
                SyntaxKind::MethodDeclaration => {
                    let symbol = bind_signature(&mut ctx, member, None)?;
                    if !ctx.scopes.declare_method(root, symbol.clone()) {
                        ctx.report(
                            member.span,
                            DiagnosticKind::MethodAlreadyDeclared {
                                name: symbol.name.clone(),
                            },
                        );
                    }
                    if symbol.name == ENTRY_NAME && explicit_main.is_none() {
                        let valid = symbol.parameters.is_empty() && symbol.return_type == builtins().void;
                        if !valid {
                            ctx.report(member.span, DiagnosticKind::InvalidMainSignature);
                        }
                        explicit_main = Some(ExplicitMain {
                            symbol: symbol.clone(),
                            span: member.span,
                            source: tree.source.clone(),
                            valid,
                        });
                    }
                    pending.push((tree.source.clone(), PendingMethod::declared(symbol, member, unit)?));
                }
                SyntaxKind::NamespaceDeclaration => {
                    let namespace = NamespaceSymbol::parse(&member.text);
                    let scope = ctx.scopes.enter(unit, ScopeKind::Namespace(namespace.clone()));
                    ctx.namespaces.entry(namespace.clone()).or_default();
                    for declaration in &member.children {
                        if declaration.kind != SyntaxKind::MethodDeclaration {
                            return Err(BindError::UnexpectedNode {
                                kind: declaration.kind,
                                span: declaration.span,
                                expected: "a method declaration",
                            });
                        }
                        let symbol = bind_signature(&mut ctx, declaration, Some(namespace.clone()))?;
                        declare_in_namespace(&mut ctx, &namespace, &symbol, declaration.span);
                        pending.push((tree.source.clone(), PendingMethod::declared(symbol, declaration, scope)?));
                    }
                }
                SyntaxKind::WithDirective => {}
                _ => statements.push(member.clone()),
            }
        }
        top_level.push(statements);
    }

    for (tree, unit) in trees.iter().zip(&units) {
        ctx.set_source(tree.source.clone());
        for directive in tree.members().iter().filter(|member| member.kind == SyntaxKind::WithDirective) {
            let namespace = NamespaceSymbol::parse(&directive.text);
            if !ctx.namespaces.contains_key(&namespace) {
                ctx.report(
                    directive.span,
                    DiagnosticKind::UndefinedNamespace {
                        name: namespace.to_string(),
                    },
                );
                continue;
            }
            if let Some(alias) = directive.child_of_kind(SyntaxKind::Alias) {
                ctx.scopes.alias(*unit, &alias.text, namespace);
                continue;
            }
            ctx.scopes.import(*unit, namespace);
        }
    }

    let with_statements: Vec<usize> = top_level
        .iter()
        .enumerate()
        .filter(|(_, statements)| !statements.is_empty())
        .map(|(index, _)| index)
        .collect();
    for index in with_statements.iter().skip(1) {
        if let (Some(tree), Some(first)) = (trees.get(*index), top_level[*index].first()) {
            ctx.set_source(tree.source.clone());
            ctx.report(first.span, DiagnosticKind::TopLevelStatementsInMultipleUnits);
        }
    }

    let (entry, synthesized) = if let Some(main) = &explicit_main {
        if !with_statements.is_empty() {
            ctx.set_source(main.source.clone());
            ctx.report(main.span, DiagnosticKind::MainWithTopLevelStatements);
        }
        (main.valid.then(|| main.symbol.clone()), None)
    } else if let Some(&index) = with_statements.first() {
        let statements = &top_level[index];
        let symbol = MethodSymbol {
            name: ENTRY_NAME.to_string(),
            namespace: None,
            parameters: Vec::new(),
            return_type: Arc::clone(&builtins().void),
            kind: MethodKind::User(ctx.fresh_method_id()),
        };
        let pending = PendingMethod {
            symbol: symbol.clone(),
            span: statements.first().map_or(Span::default(), |first| first.span),
            scope: units[index],
            parameters: &[],
            statements,
        };
        (Some(symbol), Some((trees.get(index).and_then(|tree| tree.source.clone()), pending)))
    } else {
        (None, None)
    };

    let mut methods = Vec::with_capacity(pending.len() + 1);
    for (source, method) in pending.iter().chain(synthesized.iter()) {
        ctx.set_source(source.clone());
        methods.push(bind_method(&mut ctx, options, method)?);
    }

    let diagnostics = ctx.diagnostics.into_vec();
    debug!(methods = methods.len(), diagnostics = diagnostics.len(), "bound program");
    Ok(BoundProgram {
        methods,
        entry,
        diagnostics,
        labels: ctx.labels,
    })
}

fn declare_in_namespace(ctx: &mut BindContext, namespace: &NamespaceSymbol, symbol: &MethodSymbol, span: Span) {
    let methods = ctx.namespaces.entry(namespace.clone()).or_default();
    if methods
        .iter()
        .any(|existing| existing.name == symbol.name && existing.same_parameters(symbol))
    {
        ctx.report(
            span,
            DiagnosticKind::MethodAlreadyDeclared {
                name: symbol.name.clone(),
            },
        );
        return;
    }
    methods.push(symbol.clone());
}
