//! The graph-walking type checker.
//!
//! Walks control successors from `Start`, resolving every node's type on
//! the way and carrying a branch-scoped refinement overlay: `IfTrue` and
//! `IfFalse` successors get a refined copy of the current scope, and joins
//! reset it (refinements never survive their branch). Calls and property
//! loads are checked against the scoped types.

use crate::refinement::{ScopedTypes, refine_types};
use crate::typeresolution::TypeResolver;
use nodelint_ast::AstKind;
use nodelint_common::reporting;
use nodelint_graph::{Graph, GraphNodeId, GraphNodeKind, dot};
use nodelint_module::Module;
use nodelint_types::{BaseType, TypeInfo};
use rustc_hash::FxHashSet;
use std::rc::Rc;

/// Run refinement-aware type resolution and the call/property checks over
/// one function's graph.
pub fn typecheck_graph(resolver: &TypeResolver<'_>, module: &Module, graph: &Graph) {
    reporting::trace(
        None,
        &format!("Graph data:\n{}", dot::graph_to_dot(module.arena(), graph)),
    );

    let mut visited: FxHashSet<GraphNodeId> = FxHashSet::default();
    let mut worklist: Vec<(GraphNodeId, Rc<ScopedTypes>)> =
        vec![(0, Rc::new(ScopedTypes::default()))];

    while let Some((node_id, scope)) = worklist.pop() {
        let node = graph.node(node_id);
        for n in 0..node.next_count() {
            let next_id = node.next(n);
            if !visited.insert(next_id) {
                continue;
            }
            let next_scope = match graph.node(next_id).kind {
                GraphNodeKind::IfTrue | GraphNodeKind::IfFalse => {
                    let mut refined = (*scope).clone();
                    refine_types(resolver, module, graph, &mut refined, next_id);
                    Rc::new(refined)
                }
                // Refinements are branch-scoped; they stop at the join.
                GraphNodeKind::Merge => Rc::new(ScopedTypes::default()),
                _ => Rc::clone(&scope),
            };
            worklist.push((next_id, next_scope));
        }

        resolver.resolve_node_type(module, graph, node_id);

        match node.kind {
            GraphNodeKind::Call => check_call_node(resolver, module, graph, &scope, node_id),
            GraphNodeKind::LoadNamedProperty | GraphNodeKind::LoadProperty => {
                check_property_load(resolver, module, graph, &scope, node_id);
            }
            _ => {}
        }
    }
}

/// Element-wise compatibility between a found and an expected type.
/// Unknown on either side is silence, not an error.
fn check_types_compatibility(module: &Module, found_node: nodelint_ast::NodeId, found: &TypeInfo, expected: &TypeInfo) {
    if expected.base() == BaseType::Unknown || found.base() == BaseType::Unknown {
        return;
    }
    if found == expected {
        return;
    }

    if expected.base() == BaseType::Sum {
        // Satisfying a sum needs element-wise inclusion checks that are
        // not implemented yet; stay silent rather than guess.
        return;
    }

    if found.base() != expected.base() {
        reporting::error(
            Some(&module.location_of(found_node)),
            &format!(
                "Expected type \"{}\", but got \"{}\"",
                expected.name(),
                found.name()
            ),
        );
        return;
    }

    if found.base() == BaseType::Promise {
        let expected_inner = expected.as_promise().map_or("unknown", |p| p.nested.name());
        let found_inner = found.as_promise().map_or("unknown", |p| p.nested.name());
        reporting::error(
            Some(&module.location_of(found_node)),
            &format!(
                "Expected a Promise<{expected_inner}>, but got an incompatible Promise<{found_inner}>."
            ),
        );
    }
}

fn check_call_node(
    resolver: &TypeResolver<'_>,
    module: &Module,
    graph: &Graph,
    scope: &ScopedTypes,
    node_id: GraphNodeId,
) {
    let node = graph.node(node_id);
    let Some(call_ast) = node.ast else {
        return;
    };
    let callee_type = scope.type_of(resolver, module, graph, node.input(0));

    let Some(callee) = callee_type.as_function() else {
        if callee_type.base() != BaseType::Unknown {
            let callee_ast = match module.arena().kind(call_ast) {
                AstKind::CallExpression { callee, .. } => Some(*callee),
                _ => None,
            };
            let callee_source = callee_ast
                .map(|c| module.source_excerpt(module.arena().span(c)))
                .unwrap_or_default();
            reporting::error(
                Some(&module.location_of(call_ast)),
                &format!(
                    "Trying to call \"{callee_source}\", but it has type {}",
                    callee_type.name()
                ),
            );
        }
        return;
    };
    let Some(shape) = resolver.function_shape(callee) else {
        return;
    };

    let declared = shape.argument_types.len();
    let provided = node.input_count() - 1;
    if provided > declared && !shape.variadic {
        reporting::warn(
            Some(&module.location_of(call_ast)),
            &format!("Function only takes {declared} arguments, but {provided} were provided"),
        );
    }

    let argument_asts: Vec<nodelint_ast::NodeId> = match module.arena().kind(call_ast) {
        AstKind::CallExpression { arguments, .. } => arguments.clone(),
        _ => Vec::new(),
    };
    for i in 0..declared.min(provided) {
        let found = scope.type_of(resolver, module, graph, node.input(i + 1));
        let found_node = argument_asts.get(i).copied().unwrap_or(call_ast);
        check_types_compatibility(module, found_node, &found, &shape.argument_types[i]);
    }
}

fn check_property_load(
    resolver: &TypeResolver<'_>,
    module: &Module,
    graph: &Graph,
    scope: &ScopedTypes,
    node_id: GraphNodeId,
) {
    let node = graph.node(node_id);
    let Some(ast) = node.ast else {
        return;
    };
    let prop_name = if node.kind == GraphNodeKind::LoadNamedProperty {
        module.arena().identifier_name(ast)
    } else {
        None
    };
    // Diagnostics about the access point at the whole member expression.
    let access_node = module.arena().parent(ast).unwrap_or(ast);

    let object_type = scope.type_of(resolver, module, graph, node.input(0));
    match object_type.base() {
        BaseType::Undefined | BaseType::Null | BaseType::Number | BaseType::Boolean => {
            reporting::error(
                Some(&module.location_of(ast)),
                &format!(
                    "Trying to access a property on a \"{}\" value",
                    object_type.name()
                ),
            );
        }
        BaseType::String => {
            // String properties are not modeled.
        }
        BaseType::Promise => {
            if let Some(name) = prop_name {
                if !matches!(name, "then" | "catch" | "finally") {
                    reporting::warn(
                        Some(&module.location_of(access_node)),
                        &format!(
                            "Trying to access property \"{name}\" on a promise, are you missing an await?"
                        ),
                    );
                }
            } else if node.kind == GraphNodeKind::LoadProperty {
                // Conceivably a contrived .then lookup, so only a suggestion.
                reporting::suggest(
                    Some(&module.location_of(access_node)),
                    "Suspicious dynamic property access on a promise object, are you missing an await?",
                );
            }
        }
        BaseType::Object => {
            if let (Some(name), Some(object)) = (prop_name, object_type.as_object()) {
                if object.strict && !object.properties.contains_key(name) {
                    reporting::error(
                        Some(&module.location_of(access_node)),
                        &format!(
                            "Trying to access property \"{name}\", but it is always undefined in this object"
                        ),
                    );
                }
            }
        }
        _ => {}
    }
}
