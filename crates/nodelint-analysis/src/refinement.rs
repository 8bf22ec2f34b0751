//! Flow-sensitive type refinement at conditional branches.
//!
//! At an `IfTrue`/`IfFalse` control node, the nodes appearing truthily or
//! falsily in the originating condition get their sum types narrowed in a
//! branch-scoped overlay. Logical not inverts, `&&` pins both sides true in
//! the taken branch, `||` pins both sides false in the untaken one.
//! Refinement only ever narrows; the overlay never widens a type.

use crate::typeresolution::TypeResolver;
use nodelint_ast::{AstKind, LogicalOp, UnaryOp};
use nodelint_common::Tribool;
use nodelint_graph::{Graph, GraphNodeId, GraphNodeKind};
use nodelint_module::Module;
use nodelint_types::{BaseType, TypeInfo};
use rustc_hash::FxHashMap;

/// Branch-scoped type overlay, consulted before the memoized node types.
#[derive(Clone, Debug, Default)]
pub struct ScopedTypes {
    pub types: FxHashMap<GraphNodeId, TypeInfo>,
}

impl ScopedTypes {
    /// The node's type under this scope's refinements.
    pub fn type_of(
        &self,
        resolver: &TypeResolver<'_>,
        module: &Module,
        graph: &Graph,
        node: GraphNodeId,
    ) -> TypeInfo {
        self.types
            .get(&node)
            .cloned()
            .unwrap_or_else(|| resolver.resolve_node_type(module, graph, node))
    }
}

/// Narrow a sum by the node's known truthiness. A truthy value cannot be
/// null or undefined; dropping to a single element replaces the sum.
fn refine_by_truthiness(ty: &mut TypeInfo, truthy: bool) {
    if !truthy {
        return;
    }
    let Some(sum) = ty.as_sum() else {
        return;
    };
    let mut elements: Vec<TypeInfo> = sum
        .elements
        .iter()
        .filter(|e| !matches!(e.base(), BaseType::Null | BaseType::Undefined))
        .cloned()
        .collect();
    if elements.is_empty() {
        return;
    }
    *ty = if elements.len() > 1 {
        TypeInfo::make_sum(elements)
    } else {
        elements.swap_remove(0)
    };
}

/// Truthiness constraints implied by `node` appearing in a condition that
/// evaluated to `cond_is_true`. Two families matter: value sources with
/// opaque types (calls, phis, loads, arguments) and the boolean operators
/// combining them.
fn infer_refinements_from_node(
    module: &Module,
    graph: &Graph,
    node_id: GraphNodeId,
    cond_is_true: bool,
) -> FxHashMap<GraphNodeId, Tribool> {
    let mut truthiness: FxHashMap<GraphNodeId, Tribool> = FxHashMap::default();
    let node = graph.node(node_id);
    let pinned = if cond_is_true { Tribool::Yes } else { Tribool::No };

    match node.kind {
        GraphNodeKind::Call
        | GraphNodeKind::Phi
        | GraphNodeKind::LoadValue
        | GraphNodeKind::Argument => {
            truthiness.insert(node_id, pinned);
        }
        GraphNodeKind::UnaryOperator => {
            let is_not = node.ast.is_some_and(|ast| {
                matches!(
                    module.arena().kind(ast),
                    AstKind::UnaryExpression {
                        op: UnaryOp::LogicalNot,
                        ..
                    }
                )
            });
            if is_not {
                truthiness =
                    infer_refinements_from_node(module, graph, node.input(0), cond_is_true);
                for value in truthiness.values_mut() {
                    *value = !*value;
                }
            }
        }
        GraphNodeKind::BinaryOperator => {
            let logical_op = node.ast.and_then(|ast| match module.arena().kind(ast) {
                AstKind::LogicalExpression { op, .. } => Some(*op),
                _ => None,
            });
            let both_pinned = matches!(
                (logical_op, cond_is_true),
                (Some(LogicalOp::And), true) | (Some(LogicalOp::Or), false)
            );
            if both_pinned {
                let left =
                    infer_refinements_from_node(module, graph, node.input(0), cond_is_true);
                let right =
                    infer_refinements_from_node(module, graph, node.input(1), cond_is_true);
                truthiness = left;
                for (key, value) in right {
                    // Contradictions like `a && !a` are happily ignored.
                    if value != Tribool::Maybe {
                        truthiness.insert(key, value);
                    }
                }
            }
        }
        _ => {}
    }

    truthiness
}

/// Apply the refinements implied by taking one side of a branch.
/// `branch_node` is the `If`/`Loop` the `IfTrue`/`IfFalse` hangs off.
fn infer_refinements_from_branch(
    resolver: &TypeResolver<'_>,
    module: &Module,
    graph: &Graph,
    scope: &mut ScopedTypes,
    branch_node: GraphNodeId,
    cond_is_true: bool,
) {
    // Infinite `for (;;)` loops have no condition.
    if graph.node(branch_node).input_count() == 0 {
        return;
    }
    let cond = graph.node(branch_node).input(0);
    let truthiness = infer_refinements_from_node(module, graph, cond, cond_is_true);

    for (node, tri) in truthiness {
        if tri == Tribool::Maybe {
            continue;
        }
        let entry = scope
            .types
            .entry(node)
            .or_insert_with(|| resolver.resolve_node_type(module, graph, node));
        refine_by_truthiness(entry, tri == Tribool::Yes);
    }
}

/// Refine the scope when stepping onto a branch-side control node.
pub fn refine_types(
    resolver: &TypeResolver<'_>,
    module: &Module,
    graph: &Graph,
    scope: &mut ScopedTypes,
    node_id: GraphNodeId,
) {
    match graph.node(node_id).kind {
        GraphNodeKind::IfTrue => {
            let branch = graph.node(node_id).prev(0);
            infer_refinements_from_branch(resolver, module, graph, scope, branch, true);
        }
        GraphNodeKind::IfFalse => {
            let branch = graph.node(node_id).prev(0);
            infer_refinements_from_branch(resolver, module, graph, scope, branch, false);
        }
        _ => {}
    }
}
