//! Graphviz export

use crate::graph::{BasicBlock, BlockKind, ControlFlowGraph};
use std::fmt;

/// DOT rendering of a [`ControlFlowGraph`]
///
/// Nodes are labeled with their statements, left-aligned one per line. Edges
/// carry their guard when conditional.
#[derive(Debug, Clone, Copy)]
pub struct Dot<'graph> {
    graph: &'graph ControlFlowGraph,
}

impl<'graph> Dot<'graph> {
    /// Wraps `graph` for rendering
    pub fn new(graph: &'graph ControlFlowGraph) -> Self {
        Self { graph }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn node_label(block: &BasicBlock) -> String {
    match block.kind {
        BlockKind::Start => "<Start>".to_string(),
        BlockKind::End => "<End>".to_string(),
        BlockKind::Body => block
            .statements
            .iter()
            .map(|statement| format!("{}\\l", escape(statement.to_string().trim_end())))
            .collect(),
    }
}

impl fmt::Display for Dot<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "digraph G {{")?;
        for block in self.graph.blocks() {
            writeln!(formatter, "    {} [label = \"{}\", shape = box]", block.id, node_label(block))?;
        }
        for edge in self.graph.edges() {
            match &edge.condition {
                Some(condition) => writeln!(
                    formatter,
                    "    {} -> {} [label = \"{}\"]",
                    edge.from,
                    edge.to,
                    escape(&condition.to_string())
                )?,
                None => writeln!(formatter, "    {} -> {}", edge.from, edge.to)?,
            }
        }
        writeln!(formatter, "}}")
    }
}
