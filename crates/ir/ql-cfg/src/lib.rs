//! Control flow graphs of lowered method bodies
//!
//! A body is split into basic blocks before every label and after every jump
//! or return, framed by synthetic start and end blocks. Blocks that nothing
//! jumps or falls into are pruned, which can cascade. The graph answers
//! whether every path through a method returns and renders itself as
//! Graphviz DOT for debugging.

mod dot;
mod error;
mod graph;

pub use dot::Dot;
pub use error::CfgError;
pub use graph::{BasicBlock, BasicBlockEdge, BasicBlockId, BlockKind, ControlFlowGraph};
