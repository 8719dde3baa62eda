//! Basic block partitioning and reachability

use crate::CfgError;
use crate::dot::Dot;
use indexmap::IndexMap;
use ql_bound::{BoundExpression, BoundStatement, BoundUnaryOperator, UnaryOperatorKind};
use ql_symbols::{ConstValue, LabelSymbol, builtins};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::{fmt, mem, slice};
use tracing::{debug, trace};

/// Identity of a block within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BasicBlockId(pub usize);

impl fmt::Display for BasicBlockId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "N{}", self.0)
    }
}

/// Role of a block in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Synthetic entry, no predecessors
    Start,
    /// Synthetic exit, no successors
    End,
    /// Straight-line run of statements
    Body,
}

/// A maximal straight-line run of statements
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// Identity
    pub id: BasicBlockId,
    /// Start, end or body
    pub kind: BlockKind,
    /// Statements in execution order, empty for start and end
    pub statements: Vec<BoundStatement>,
}

/// A possible transfer of control between blocks
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlockEdge {
    /// Source block
    pub from: BasicBlockId,
    /// Destination block
    pub to: BasicBlockId,
    /// Guard under which the edge is taken, `None` when unconditional
    pub condition: Option<BoundExpression>,
}

/// Control flow graph of one lowered method body
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    start: BasicBlockId,
    end: BasicBlockId,
    blocks: IndexMap<BasicBlockId, BasicBlock>,
    edges: Vec<BasicBlockEdge>,
}

impl ControlFlowGraph {
    /// Builds the graph of a flat statement list and prunes unreachable blocks
    ///
    /// # Errors
    ///
    /// Returns [`CfgError::NotLowered`] for blocks, structured control flow or
    /// nested methods, and [`CfgError::UnknownLabel`] for a jump to a label no
    /// statement declares.
    pub fn build(statements: &[BoundStatement]) -> Result<Self, CfgError> {
        let parts = partition(statements)?;
        let start = BasicBlockId(0);
        let end = BasicBlockId(parts.len() + 1);

        let mut blocks = IndexMap::new();
        blocks.insert(
            start,
            BasicBlock {
                id: start,
                kind: BlockKind::Start,
                statements: Vec::new(),
            },
        );
        let mut targets = FxHashMap::default();
        for (index, part) in parts.into_iter().enumerate() {
            let id = BasicBlockId(index + 1);
            if let Some(BoundStatement::Label(label)) = part.first() {
                targets.insert(label.clone(), id);
            }
            blocks.insert(
                id,
                BasicBlock {
                    id,
                    kind: BlockKind::Body,
                    statements: part,
                },
            );
        }
        blocks.insert(
            end,
            BasicBlock {
                id: end,
                kind: BlockKind::End,
                statements: Vec::new(),
            },
        );

        let lookup = |label: &LabelSymbol| {
            targets.get(label).copied().ok_or_else(|| CfgError::UnknownLabel {
                label: label.name.clone(),
            })
        };
        let edge = |from, to, condition| BasicBlockEdge { from, to, condition };

        let mut edges = vec![edge(start, BasicBlockId(1).min(end), None)];
        for block in blocks.values().filter(|block| block.kind == BlockKind::Body) {
            let next = BasicBlockId(block.id.0 + 1);
            match block.statements.last() {
                Some(BoundStatement::Goto(label)) => edges.push(edge(block.id, lookup(label)?, None)),
                Some(BoundStatement::ConditionalGoto {
                    label,
                    condition,
                    jump_if_true,
                }) => {
                    let negated = negate(condition);
                    let (jump_condition, fallthrough_condition) = if *jump_if_true {
                        (condition.clone(), negated)
                    } else {
                        (negated, condition.clone())
                    };
                    edges.push(edge(block.id, lookup(label)?, Some(jump_condition)));
                    edges.push(edge(block.id, next, Some(fallthrough_condition)));
                }
                Some(BoundStatement::Return(_)) => edges.push(edge(block.id, end, None)),
                _ => edges.push(edge(block.id, next, None)),
            }
        }

        let mut graph = Self {
            start,
            end,
            blocks,
            edges,
        };
        graph.remove_unreachable();
        debug!(
            blocks = graph.blocks.len(),
            edges = graph.edges.len(),
            "built control flow graph"
        );
        Ok(graph)
    }

    /// Builds the graph of a lowered method body
    ///
    /// # Errors
    ///
    /// See [`ControlFlowGraph::build`].
    pub fn from_body(body: &BoundStatement) -> Result<Self, CfgError> {
        match body {
            BoundStatement::Block(statements) => Self::build(statements),
            _ => Self::build(slice::from_ref(body)),
        }
    }

    /// Deletes body blocks without predecessors until none remain
    fn remove_unreachable(&mut self) {
        loop {
            let unreachable = self
                .blocks
                .values()
                .find(|block| block.kind == BlockKind::Body && self.incoming(block.id).next().is_none())
                .map(|block| block.id);
            let Some(id) = unreachable else {
                break;
            };
            trace!(block = %id, "removing unreachable block");
            self.blocks.shift_remove(&id);
            self.edges.retain(|edge| edge.from != id);
        }
    }

    /// Synthetic entry block
    pub fn start(&self) -> BasicBlockId {
        self.start
    }

    /// Synthetic exit block
    pub fn end(&self) -> BasicBlockId {
        self.end
    }

    /// Surviving blocks in program order, start first and end last
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values()
    }

    /// Block by identity, `None` once pruned
    pub fn block(&self, id: BasicBlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    /// All edges
    pub fn edges(&self) -> &[BasicBlockEdge] {
        &self.edges
    }

    /// Edges entering `id`
    pub fn incoming(&self, id: BasicBlockId) -> impl Iterator<Item = &BasicBlockEdge> {
        self.edges.iter().filter(move |edge| edge.to == id)
    }

    /// Edges leaving `id`
    pub fn outgoing(&self, id: BasicBlockId) -> impl Iterator<Item = &BasicBlockEdge> {
        self.edges.iter().filter(move |edge| edge.from == id)
    }

    /// Returns true when every edge into the end block leaves a block that
    /// finishes with a return statement
    pub fn all_paths_return(&self) -> bool {
        self.incoming(self.end).all(|edge| {
            self.blocks
                .get(&edge.from)
                .and_then(|block| block.statements.last())
                .is_some_and(|statement| matches!(statement, BoundStatement::Return(_)))
        })
    }

    /// Graphviz rendering of the graph
    pub fn dot(&self) -> Dot<'_> {
        Dot::new(self)
    }
}

/// Splits a flat statement list before every label and after every jump
fn partition(statements: &[BoundStatement]) -> Result<Vec<Vec<BoundStatement>>, CfgError> {
    let mut parts = Vec::new();
    let mut current = Vec::new();
    for statement in statements {
        match statement {
            BoundStatement::Label(_) => {
                if !current.is_empty() {
                    parts.push(mem::take(&mut current));
                }
                current.push(statement.clone());
            }
            BoundStatement::Goto(_) | BoundStatement::ConditionalGoto { .. } | BoundStatement::Return(_) => {
                current.push(statement.clone());
                parts.push(mem::take(&mut current));
            }
            BoundStatement::VariableDeclaration { .. } | BoundStatement::Expression(_) | BoundStatement::Nop => {
                current.push(statement.clone());
            }
            BoundStatement::Block(_)
            | BoundStatement::If { .. }
            | BoundStatement::While { .. }
            | BoundStatement::DoWhile { .. }
            | BoundStatement::For { .. }
            | BoundStatement::MethodDeclaration(_) => {
                return Err(CfgError::NotLowered {
                    statement: statement.to_string().trim_end().to_string(),
                });
            }
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    Ok(parts)
}

/// Logical negation, folding literals and double negation
fn negate(condition: &BoundExpression) -> BoundExpression {
    match condition {
        BoundExpression::Literal(ConstValue::Bool(value)) => BoundExpression::Literal(ConstValue::Bool(!value)),
        BoundExpression::Unary { operator, operand } if operator.kind == UnaryOperatorKind::LogicalNegation => {
            operand.as_ref().clone()
        }
        _ => {
            let boolean = &builtins().bool;
            BoundExpression::Unary {
                operator: BoundUnaryOperator {
                    syntax: "!",
                    kind: UnaryOperatorKind::LogicalNegation,
                    operand_type: Arc::clone(boolean),
                    result_type: Arc::clone(boolean),
                },
                operand: Box::new(condition.clone()),
            }
        }
    }
}
