//! Promise misuse: calls whose result is a promise but is never awaited.

use crate::typeresolution::TypeResolver;
use nodelint_ast::{AstKind, queries};
use nodelint_common::reporting;
use nodelint_graph::{Graph, GraphNodeKind};
use nodelint_module::Module;
use nodelint_types::BaseType;

/// Check every call in the graph whose resolved type is a promise.
///
/// Returning the promise from an async function (or one annotated to
/// return a Promise) is correct, as is immediately chaining
/// `then`/`catch`/`finally`. Anything else is a likely missing `await`:
/// a suggestion when returned from a plain function, a warning when the
/// result is consumed as a value.
pub fn missing_await_pass(resolver: &TypeResolver<'_>, module: &Module, graph: &Graph) {
    let arena = module.arena();

    for (node_id, node) in graph.nodes() {
        if node.kind != GraphNodeKind::Call {
            continue;
        }
        let ty = resolver.resolve_node_type(module, graph, node_id);
        if ty.base() != BaseType::Promise {
            continue;
        }
        let Some(call_ast) = node.ast else {
            continue;
        };
        let Some(parent) = arena.parent(call_ast) else {
            continue;
        };
        if matches!(arena.kind(parent), AstKind::AwaitExpression { .. }) {
            continue;
        }

        if queries::is_returned_value(arena, call_ast).is_yes() {
            // Walk up to the function returning this value.
            let mut fun = Some(call_ast);
            while let Some(current) = fun {
                if queries::is_function_node(arena, current) {
                    break;
                }
                fun = arena.parent(current);
            }
            let Some(fun) = fun else {
                continue;
            };
            let data = arena.function_data(fun).expect("function node");
            if data.is_async() {
                continue;
            }
            if returns_promise_annotation(module, data.return_type) {
                continue;
            }
            reporting::suggest(
                Some(&module.location_of(call_ast)),
                "Function returns a promise, not a value. Mark the function async, or add a type annotation.",
            );
        } else {
            // Immediately chaining a promise method is fine.
            if let AstKind::MemberExpression { property, .. } = arena.kind(parent) {
                let grandparent = arena.parent(parent);
                let chains = grandparent
                    .is_some_and(|g| matches!(arena.kind(g), AstKind::CallExpression { .. }));
                if chains {
                    if let Some(name) = arena.identifier_name(*property) {
                        if matches!(name, "then" | "catch" | "finally") {
                            continue;
                        }
                    }
                }
            }
            reporting::warn(
                Some(&module.location_of(call_ast)),
                "Possible missing await",
            );
        }
    }
}

/// True iff the function's return annotation names `Promise`.
fn returns_promise_annotation(
    module: &Module,
    return_type: Option<nodelint_ast::NodeId>,
) -> bool {
    let arena = module.arena();
    let Some(mut annotation) = return_type else {
        return false;
    };
    if let AstKind::TypeAnnotation { annotation: inner } = arena.kind(annotation) {
        annotation = *inner;
    }
    match arena.kind(annotation) {
        AstKind::GenericTypeAnnotation { id, .. } => {
            arena.identifier_name(*id) == Some("Promise")
        }
        _ => false,
    }
}
