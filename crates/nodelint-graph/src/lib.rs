//! Sea-of-Nodes program-dependence graphs for nodelint.
//!
//! Each function body is lifted into a graph where data and control are
//! explicit edges between tagged nodes. Construction follows the direct SSA
//! algorithm of Braun et al.: basic blocks track the current value of every
//! local variable, unsealed blocks collect incomplete φs, and sealing fills
//! φ operands from predecessors with trivial-φ elimination.
//!
//! This crate provides:
//! - `Graph` / `GraphNode` / `GraphNodeKind` - the graph itself
//! - `BasicBlock` - SSA bookkeeping during construction
//! - `GraphBuilder` - AST → graph lowering for every statement form
//! - `dot` - Graphviz rendering for debugging

pub mod graph;
pub use graph::{Graph, GraphNode, GraphNodeId, GraphNodeKind};

pub mod block;
pub use block::BasicBlock;

pub mod builder;
pub use builder::{GraphBuildError, GraphBuilder, OrphanJump};

pub mod dot;
