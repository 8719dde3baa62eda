//! Flattening and cleanup after each rewrite pass

use ql_bound::{BoundExpression, BoundNodeRef, BoundStatement, BoundTreeRewriter};
use ql_symbols::{LabelSymbol, VariableId, VariableRef};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::trace;

/// Result of [`flatten_and_clean`]
#[derive(Debug)]
pub struct Cleaned {
    /// Flat statement list
    pub statements: Vec<BoundStatement>,
    /// Some variable became read-only, so another rewrite pass is due
    pub promoted: bool,
}

/// Flattens `body`, removes dead stores, promotes never-assigned variables to
/// read-only and drops no-ops and untargeted labels
pub fn flatten_and_clean(body: BoundStatement) -> Cleaned {
    let mut statements = Vec::new();
    flatten(body, &mut statements);
    let statements = remove_dead_stores(statements);
    let (statements, promoted) = promote_read_only(statements);
    Cleaned {
        statements: drop_noise(statements),
        promoted,
    }
}

fn flatten(statement: BoundStatement, into: &mut Vec<BoundStatement>) {
    match statement {
        BoundStatement::Block(statements) => {
            for inner in statements {
                flatten(inner, into);
            }
        }
        _ => into.push(statement),
    }
}

/// Variables read and variables assigned anywhere in a statement list
#[derive(Debug, Default)]
struct Usage {
    reads: FxHashSet<VariableId>,
    writes: FxHashSet<VariableId>,
}

impl Usage {
    fn of(statements: &[BoundStatement]) -> Self {
        let mut usage = Self::default();
        for statement in statements {
            for node in BoundNodeRef::Statement(statement).descendants() {
                match node {
                    BoundNodeRef::Expression(BoundExpression::Variable(variable)) => {
                        usage.reads.insert(variable.id);
                    }
                    BoundNodeRef::Expression(BoundExpression::Assignment { variable, .. }) => {
                        usage.writes.insert(variable.id);
                    }
                    _ => {}
                }
            }
        }
        usage
    }
}

/// Replaces stores to unread variables with the stored expression
struct DeadStoreRemoval<'usage> {
    usage: &'usage Usage,
    removed: usize,
}

impl BoundTreeRewriter for DeadStoreRemoval<'_> {
    fn rewrite_variable_declaration(&mut self, variable: VariableRef, initializer: BoundExpression) -> BoundStatement {
        let initializer = self.rewrite_expression(initializer);
        if self.usage.reads.contains(&variable.id) {
            BoundStatement::VariableDeclaration { variable, initializer }
        } else {
            self.removed += 1;
            BoundStatement::Expression(initializer)
        }
    }

    fn rewrite_assignment(&mut self, variable: VariableRef, value: BoundExpression) -> BoundExpression {
        let value = self.rewrite_expression(value);
        if self.usage.reads.contains(&variable.id) {
            BoundExpression::Assignment {
                variable,
                value: Box::new(value),
            }
        } else {
            self.removed += 1;
            value
        }
    }
}

fn remove_dead_stores(mut statements: Vec<BoundStatement>) -> Vec<BoundStatement> {
    loop {
        let usage = Usage::of(&statements);
        let mut removal = DeadStoreRemoval {
            usage: &usage,
            removed: 0,
        };
        let rewritten: Vec<BoundStatement> = statements
            .into_iter()
            .map(|statement| removal.rewrite_statement(statement))
            .collect();
        if removal.removed == 0 {
            return rewritten;
        }
        trace!(removed = removal.removed, "removed dead stores");
        statements = rewritten;
    }
}

/// Swaps variable symbols by identity
struct Substitution<'table> {
    replacements: &'table FxHashMap<VariableId, VariableRef>,
}

impl Substitution<'_> {
    fn current(&self, variable: VariableRef) -> VariableRef {
        self.replacements
            .get(&variable.id)
            .map_or(variable, Arc::clone)
    }
}

impl BoundTreeRewriter for Substitution<'_> {
    fn rewrite_variable_declaration(&mut self, variable: VariableRef, initializer: BoundExpression) -> BoundStatement {
        BoundStatement::VariableDeclaration {
            variable: self.current(variable),
            initializer: self.rewrite_expression(initializer),
        }
    }

    fn rewrite_variable(&mut self, variable: VariableRef) -> BoundExpression {
        BoundExpression::Variable(self.current(variable))
    }
}

fn promote_read_only(statements: Vec<BoundStatement>) -> (Vec<BoundStatement>, bool) {
    let usage = Usage::of(&statements);
    let replacements: FxHashMap<VariableId, VariableRef> = statements
        .iter()
        .filter_map(|statement| match statement {
            BoundStatement::VariableDeclaration { variable, .. }
                if !variable.read_only && !usage.writes.contains(&variable.id) =>
            {
                Some((variable.id, variable.promoted()))
            }
            _ => None,
        })
        .collect();
    if replacements.is_empty() {
        return (statements, false);
    }
    trace!(promoted = replacements.len(), "promoted variables to read-only");
    let mut substitution = Substitution {
        replacements: &replacements,
    };
    let rewritten = statements
        .into_iter()
        .map(|statement| substitution.rewrite_statement(statement))
        .collect();
    (rewritten, true)
}

fn drop_noise(statements: Vec<BoundStatement>) -> Vec<BoundStatement> {
    let targets: FxHashSet<LabelSymbol> = statements
        .iter()
        .filter_map(|statement| match statement {
            BoundStatement::Goto(label) | BoundStatement::ConditionalGoto { label, .. } => Some(label.clone()),
            _ => None,
        })
        .collect();
    statements
        .into_iter()
        .filter(|statement| match statement {
            BoundStatement::Nop => false,
            BoundStatement::Label(label) => targets.contains(label),
            _ => true,
        })
        .collect()
}
