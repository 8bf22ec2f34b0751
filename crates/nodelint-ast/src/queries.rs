//! Pure parent-chain predicates over AST shape.
//!
//! Every later pass asks these questions; none of them allocate or recurse
//! more than one or two hops up the tree.

use crate::node::{AstArena, AstKind, NodeId, VariableKind};
use nodelint_common::Tribool;

/// True iff the node is one of the six function-like kinds.
pub fn is_function_node(arena: &AstArena, id: NodeId) -> bool {
    matches!(
        arena.kind(id),
        AstKind::ArrowFunctionExpression(_)
            | AstKind::FunctionExpression(_)
            | AstKind::FunctionDeclaration(_)
            | AstKind::ClassMethod(_)
            | AstKind::ClassPrivateMethod(_)
            | AstKind::ObjectMethod(_)
    )
}

/// True iff the identifier is the key of an object property, class property
/// or method - a name that lives outside lexical scoping.
pub fn is_unscoped_property_or_method_identifier(arena: &AstArena, id: NodeId) -> bool {
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    match arena.kind(parent) {
        AstKind::ObjectProperty { key, .. }
        | AstKind::ClassProperty { key, .. }
        | AstKind::ClassPrivateProperty { key, .. } => *key == id,
        AstKind::ClassMethod(f) | AstKind::ClassPrivateMethod(f) | AstKind::ObjectMethod(f) => {
            f.key == Some(id)
        }
        _ => false,
    }
}

/// True iff the identifier names a structural-type member rather than a
/// value: a function-type parameter name, an object-type property key, or an
/// object-type indexer id.
pub fn is_unscoped_type_identifier(arena: &AstArena, id: NodeId) -> bool {
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    match arena.kind(parent) {
        AstKind::FunctionTypeParam { name, .. } => *name == Some(id),
        AstKind::ObjectTypeProperty { key, .. } => *key == id,
        AstKind::ObjectTypeIndexer { id: indexer_id, .. } => *indexer_id == Some(id),
        _ => false,
    }
}

/// True iff the identifier is the property side of a member expression or
/// the member side of a qualified type name - it does not refer to a value
/// in any lexical scope.
pub fn is_member_property_or_qualified_identifier(arena: &AstArena, id: NodeId) -> bool {
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    match arena.kind(parent) {
        AstKind::MemberExpression { property, .. } => *property == id,
        AstKind::QualifiedTypeIdentifier { id: member, .. } => *member == id,
        _ => false,
    }
}

/// True iff the identifier is the module-external name of an import/export
/// specifier (`foo` in `import { foo as bar }`, `baz` in
/// `export { x as baz }`).
pub fn is_external_specifier_identifier(arena: &AstArena, id: NodeId) -> bool {
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    match arena.kind(parent) {
        AstKind::ImportSpecifier { imported, .. } => *imported == id,
        AstKind::ExportSpecifier { exported, .. }
        | AstKind::ExportDefaultSpecifier { exported } => *exported == id,
        _ => false,
    }
}

/// True iff the identifier declares a hoisted (`var`-kind) variable.
pub fn is_var_declaration_identifier(arena: &AstArena, id: NodeId) -> bool {
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    if !matches!(arena.kind(parent), AstKind::VariableDeclarator { .. }) {
        return false;
    }
    let Some(grandparent) = arena.parent(parent) else {
        return false;
    };
    matches!(
        arena.kind(grandparent),
        AstKind::VariableDeclaration {
            kind: VariableKind::Var,
            ..
        }
    )
}

/// True iff the identifier appears directly in the parameter list of its
/// enclosing function node.
pub fn is_function_parameter_identifier(arena: &AstArena, id: NodeId) -> bool {
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    arena
        .function_data(parent)
        .is_some_and(|f| f.params.contains(&id))
}

/// True iff the identifier is a parameter of an arrow or function
/// *expression* - the kinds whose unused parameters cannot be removed, only
/// renamed with a leading underscore.
pub fn is_functional_expression_argument_identifier(arena: &AstArena, id: NodeId) -> bool {
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    match arena.kind(parent) {
        AstKind::ArrowFunctionExpression(f) | AstKind::FunctionExpression(f) => {
            f.params.contains(&id)
        }
        _ => false,
    }
}

/// Whether the node's value is what its enclosing function returns.
/// Definite `Yes` when the immediate parent is a return statement or an
/// arrow-expression body; `No` at the tree root; `Maybe` everywhere else.
pub fn is_returned_value(arena: &AstArena, id: NodeId) -> Tribool {
    let Some(parent) = arena.parent(id) else {
        return Tribool::No;
    };
    match arena.kind(parent) {
        AstKind::ReturnStatement { .. } => Tribool::Yes,
        AstKind::ArrowFunctionExpression(f) if f.body == id => Tribool::Yes,
        _ => Tribool::Maybe,
    }
}
