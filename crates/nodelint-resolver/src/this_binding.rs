//! Best-effort `this` resolution.
//!
//! Arrow functions and class members inherit `this` lexically, so a `this`
//! inside them can often be traced to an enclosing class. Plain functions
//! get their `this` dynamically and resolve to nothing.

use nodelint_ast::{AstArena, AstKind, NodeId, queries};

fn is_lexical_scope_node(arena: &AstArena, id: NodeId) -> bool {
    queries::is_function_node(arena, id)
        || matches!(
            arena.kind(id),
            AstKind::ClassDeclaration(_) | AstKind::ClassExpression(_)
        )
}

/// The class a `this` expression refers to, when it can be determined.
pub fn resolve_this_expression(arena: &AstArena, this_expr: NodeId) -> Option<NodeId> {
    let mut parent = Some(this_expr);
    while let Some(node) = parent {
        if queries::is_function_node(arena, node) {
            return resolve_this_value(arena, node);
        }
        parent = arena.parent(node);
    }
    None
}

/// The class providing the `this` value of a lexical scope.
pub fn resolve_this_value(arena: &AstArena, lexical_scope: NodeId) -> Option<NodeId> {
    let mut target = arena.parent(lexical_scope)?;
    while !is_lexical_scope_node(arena, target) {
        target = arena.parent(target)?;
    }

    match arena.kind(target) {
        AstKind::ClassDeclaration(_) | AstKind::ClassExpression(_) => Some(target),
        AstKind::ArrowFunctionExpression(_)
        | AstKind::ClassMethod(_)
        | AstKind::ClassPrivateMethod(_) => resolve_this_value(arena, target),
        _ => {
            // Class field initializers bind this to their class too.
            let parent = arena.parent(target)?;
            if matches!(
                arena.kind(parent),
                AstKind::ClassProperty { .. } | AstKind::ClassPrivateProperty { .. }
            ) {
                resolve_this_value(arena, target)
            } else {
                // Plain functions take a dynamic this.
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodelint_ast::testing as t;
    use nodelint_ast::{import_babel_ast, walk};

    fn find_this(arena: &AstArena, root: NodeId) -> NodeId {
        let mut found = None;
        walk(arena, root, |id| {
            if matches!(arena.kind(id), AstKind::ThisExpression) {
                found = Some(id);
            }
        });
        found.expect("fixture contains this")
    }

    #[test]
    fn this_inside_a_class_method_resolves_to_the_class() {
        let program = t::program(vec![t::class_decl(
            "C",
            vec![t::class_method(
                "method",
                "m",
                vec![],
                vec![t::ret(Some(serde_json::json!({"type": "ThisExpression"})))],
            )],
        )]);
        let (arena, root) = import_babel_ast(&program).unwrap();
        let this = find_this(&arena, root);
        let class = resolve_this_expression(&arena, this).expect("resolves");
        assert!(matches!(arena.kind(class), AstKind::ClassDeclaration(_)));
    }

    #[test]
    fn this_inside_a_plain_function_is_dynamic() {
        let program = t::program(vec![t::fn_decl(
            "f",
            vec![],
            vec![t::ret(Some(serde_json::json!({"type": "ThisExpression"})))],
            false,
        )]);
        let (arena, root) = import_babel_ast(&program).unwrap();
        let this = find_this(&arena, root);
        assert!(resolve_this_expression(&arena, this).is_none());
    }

    #[test]
    fn arrows_inherit_this_from_the_enclosing_method() {
        let program = t::program(vec![t::class_decl(
            "C",
            vec![t::class_method(
                "method",
                "m",
                vec![],
                vec![t::ret(Some(t::arrow_expr(
                    vec![],
                    serde_json::json!({"type": "ThisExpression"}),
                )))],
            )],
        )]);
        let (arena, root) = import_babel_ast(&program).unwrap();
        let this = find_this(&arena, root);
        assert!(resolve_this_expression(&arena, this).is_some());
    }
}
