//! Tree walks over the arena.

use crate::node::{AstArena, NodeId};

/// Pre-order walk over the subtree rooted at `root`, `root` included.
pub fn walk(arena: &AstArena, root: NodeId, mut cb: impl FnMut(NodeId)) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        cb(id);
        // Push in reverse so children pop in source order.
        let mut children = arena.children(id);
        children.reverse();
        stack.extend(children);
    }
}

/// What to do with a node during a bounded walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkDecision {
    /// Visit the node, do not descend into it.
    VisitOver,
    /// Do not visit the node, but descend into its children.
    SkipInto,
    /// Neither visit nor descend.
    SkipOver,
}

/// Decision-driven walk used by import resolution: the root's children are
/// always considered, and `decide` controls visiting/descent per node.
pub fn walk_decide(
    arena: &AstArena,
    root: NodeId,
    visit: &mut impl FnMut(NodeId),
    decide: &mut impl FnMut(NodeId) -> WalkDecision,
) {
    let mut stack = arena.children(root);
    stack.reverse();
    while let Some(id) = stack.pop() {
        match decide(id) {
            WalkDecision::VisitOver => visit(id),
            WalkDecision::SkipInto => {
                let mut children = arena.children(id);
                children.reverse();
                stack.extend(children);
            }
            WalkDecision::SkipOver => {}
        }
    }
}
