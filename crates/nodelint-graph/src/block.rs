//! Basic blocks and the SSA variable machinery.
//!
//! A block tracks the current SSA version of every variable written in it,
//! the last control node (`next`) and the last emitted node (`newest`).
//! Reads of variables not locally bound go through global value numbering:
//! unsealed blocks record an incomplete φ, single-predecessor blocks
//! delegate upstream, and merges build a φ with trivial-φ elimination.
//!
//! The φ-completion walk can recurse through cycles; a placeholder value of
//! zero is written first to break them, and overwritten with the real value
//! on the way out.

use crate::graph::{Graph, GraphNode, GraphNodeId, GraphNodeKind};
use nodelint_ast::NodeId;
use rustc_hash::FxHashMap;

/// One basic block. Fields are managed through `Graph` methods because
/// every non-trivial operation needs to touch other blocks and nodes.
#[derive(Debug, Default)]
pub struct BasicBlock {
    /// Predecessor block indices.
    pub(crate) prevs: Vec<u16>,
    /// Current SSA version per declaration identifier. Zero is a cycle
    /// placeholder, overwritten before the block is finished.
    pub(crate) values: FxHashMap<NodeId, GraphNodeId>,
    /// φs inserted while the block was unsealed, waiting for operands.
    pub(crate) incomplete_phis: Vec<(NodeId, GraphNodeId)>,
    /// Last control node added; new control nodes chain after it.
    pub(crate) next: GraphNodeId,
    /// Last node added, control or not.
    pub(crate) newest: GraphNodeId,
    pub(crate) sealed: bool,
    pub(crate) filled: bool,
}

impl BasicBlock {
    pub fn new(prevs: Vec<u16>) -> Self {
        BasicBlock {
            prevs,
            ..BasicBlock::default()
        }
    }

    #[inline]
    pub fn prevs(&self) -> &[u16] {
        &self.prevs
    }

    #[inline]
    pub fn next(&self) -> GraphNodeId {
        self.next
    }

    #[inline]
    pub fn newest(&self) -> GraphNodeId {
        self.newest
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled
    }
}

impl Graph {
    pub fn block_add_prev(&mut self, block: u16, prev: u16) {
        let b = self.block_mut(block);
        assert!(!b.sealed, "cannot add predecessors to a sealed block");
        assert!(!b.prevs.contains(&prev));
        b.prevs.push(prev);
    }

    /// Append a node to a block with no control predecessor.
    pub fn block_add_node(&mut self, block: u16, node: GraphNode, control: bool) -> GraphNodeId {
        assert!(!self.block(block).filled, "cannot append to a filled block");
        let id = self.add_node(node);
        let b = self.block_mut(block);
        b.newest = id;
        if control {
            b.next = id;
        }
        id
    }

    /// Append a control node chained after `prev`.
    pub fn block_add_node_with_prev(
        &mut self,
        block: u16,
        node: GraphNode,
        prev: GraphNodeId,
    ) -> GraphNodeId {
        assert!(!self.block(block).filled, "cannot append to a filled block");
        let id = self.add_node_with_prev(node, prev);
        let b = self.block_mut(block);
        b.newest = id;
        b.next = id;
        id
    }

    /// Append a control node with several predecessors (a merge point).
    pub fn block_add_node_with_prevs(
        &mut self,
        block: u16,
        node: GraphNode,
        prevs: &[GraphNodeId],
    ) -> GraphNodeId {
        assert!(!self.block(block).filled, "cannot append to a filled block");
        let id = self.add_node_with_prevs(node, prevs);
        let b = self.block_mut(block);
        b.newest = id;
        b.next = id;
        id
    }

    /// Reuse an existing node as the block's newest value instead of
    /// emitting a duplicate.
    pub fn block_set_newest(&mut self, block: u16, node: GraphNodeId) {
        self.block_mut(block).newest = node;
    }

    /// Point a fresh block's control chain at an existing node of a
    /// previous block.
    pub fn block_set_next(&mut self, block: u16, node: GraphNodeId) {
        self.block_mut(block).next = node;
    }

    pub fn block_set_filled(&mut self, block: u16) {
        self.block_mut(block).filled = true;
    }

    /// Record the SSA version of `decl` in this block.
    pub fn write_variable(&mut self, block: u16, decl: NodeId, value: GraphNodeId) {
        self.block_mut(block).values.insert(decl, value);
    }

    /// The block-local SSA version of `decl`, if any.
    pub fn read_variable(&self, block: u16, decl: NodeId) -> Option<GraphNodeId> {
        self.block(block).values.get(&decl).copied()
    }

    /// Global value numbering: find `decl`'s value through predecessors.
    /// Returns zero when no value can exist (a use before any write on an
    /// entry path); callers surface that as a build failure.
    pub fn read_nonlocal_variable(&mut self, block: u16, decl: NodeId) -> GraphNodeId {
        if let Some(existing) = self.read_variable(block, decl) {
            return existing;
        }
        if self.block(block).prevs.is_empty() {
            // Use before declaration reached the entry block.
            return 0;
        }

        let result = if !self.block(block).sealed {
            self.add_incomplete_phi(block, decl)
        } else if self.block(block).prevs.len() == 1 {
            let prev = self.block(block).prevs[0];
            self.read_nonlocal_variable(prev, decl)
        } else {
            self.complete_simple_phi(block, decl)
        };
        self.write_variable(block, decl, result);
        result
    }

    /// Build the φ for `decl` at a sealed multi-predecessor block, eliding
    /// it when every predecessor agrees.
    pub fn complete_simple_phi(&mut self, block: u16, decl: NodeId) -> GraphNodeId {
        let mut trivial = true;
        self.write_variable(block, decl, 0); // placeholder breaks cycles
        let prevs = self.block(block).prevs.clone();

        let mut inputs: Vec<GraphNodeId> = Vec::new();
        for prev in prevs {
            let new_input = match self.read_variable(prev, decl) {
                Some(existing) => existing,
                None => self.read_nonlocal_variable(prev, decl),
            };
            if new_input == 0 {
                continue;
            }
            if let Some(&last) = inputs.last() {
                if last != new_input {
                    trivial = false;
                }
            }
            // Even when elision later fails, every input must be kept or
            // the φ stops lining up with the merge's predecessors.
            inputs.push(new_input);
        }

        if inputs.is_empty() {
            return 0;
        }
        if trivial {
            return inputs[0];
        }
        self.add_phi(block, inputs)
    }

    /// Emit a φ threaded immediately after the block's `Merge` node, at the
    /// tail of any φ chain already there.
    pub fn add_phi(&mut self, block: u16, inputs: Vec<GraphNodeId>) -> GraphNodeId {
        let prevs = self.block(block).prevs.clone();
        assert!(!prevs.is_empty(), "a phi needs predecessors");

        let prev_block_next = self.block(prevs[0]).next;
        let merge = self.node(prev_block_next).next(0);
        assert_eq!(
            self.node(merge).kind,
            GraphNodeKind::Merge,
            "phis thread after the join block's Merge"
        );

        let mut insert_point = merge;
        while self.node(insert_point).next_count() == 1 {
            let next_id = self.node(insert_point).next(0);
            if self.node(next_id).kind == GraphNodeKind::Phi {
                insert_point = next_id;
            } else {
                break;
            }
        }

        let phi = self.add_node(GraphNode::with_inputs(GraphNodeKind::Phi, inputs, None));
        self.node_mut(phi).add_prev(insert_point);
        if self.node(insert_point).next_count() > 0 {
            assert_eq!(self.node(insert_point).next_count(), 1);
            let prev_next = self.node(insert_point).next(0);
            self.node_mut(phi).add_next(prev_next);
            self.node_mut(prev_next).replace_prev(insert_point, phi);
            self.node_mut(insert_point).set_next(0, phi);
        } else {
            self.node_mut(insert_point).add_next(phi);
        }

        if insert_point == self.block(block).next {
            let b = self.block_mut(block);
            b.next = phi;
            b.newest = phi;
        }
        phi
    }

    /// Emit an operand-less φ in an unsealed block and remember it for
    /// completion at sealing time.
    pub fn add_incomplete_phi(&mut self, block: u16, decl: NodeId) -> GraphNodeId {
        let phi = self.add_phi(block, Vec::new());
        self.block_mut(block).incomplete_phis.push((decl, phi));
        phi
    }

    /// Declare the block's predecessor set final and fill every incomplete
    /// φ by asking each predecessor for the variable's value.
    pub fn seal_block(&mut self, block: u16) {
        assert!(!self.block(block).sealed, "block sealed twice");

        let incomplete = std::mem::take(&mut self.block_mut(block).incomplete_phis);
        for (decl, phi) in incomplete {
            assert_eq!(self.node(phi).kind, GraphNodeKind::Phi);
            let prevs = self.block(block).prevs.clone();
            for prev in prevs {
                let op = self.read_nonlocal_variable(prev, decl);
                self.node_mut(phi).add_input(op);
            }
        }
        self.block_mut(block).sealed = true;
    }
}
