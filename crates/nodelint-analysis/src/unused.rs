//! Unused-declaration detection over the cross-reference map.
//!
//! A declaration whose only reference is itself is suspect, minus the
//! shapes that are legitimately reference-free: catch parameters (syntax
//! requires one), exported names, property/method keys, structural-type
//! member names, and the self-name a function expression carries for stack
//! traces.

use nodelint_ast::{AstKind, NodeId, queries};
use nodelint_common::reporting;
use nodelint_module::Module;

/// The `imported` half of an import specifier names an entity in another
/// module, not a local binding.
fn is_nonlocal_imported_identifier(module: &Module, id: NodeId) -> bool {
    let arena = module.arena();
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    matches!(arena.kind(parent), AstKind::ImportSpecifier { imported, .. } if *imported == id)
}

fn is_identifier_of_exported_declaration(module: &Module, id: NodeId) -> bool {
    let arena = module.arena();
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    let declaration = match arena.kind(parent) {
        AstKind::ExportSpecifier { .. } | AstKind::ExportDefaultSpecifier { .. } => return true,
        AstKind::ClassDeclaration(class) => {
            if class.id != Some(id) {
                return false;
            }
            parent
        }
        AstKind::FunctionDeclaration(fun) => {
            if fun.id != Some(id) {
                return false;
            }
            parent
        }
        AstKind::VariableDeclarator {
            id: declarator_id, ..
        } => {
            if *declarator_id != id {
                return false;
            }
            // The exported node is the VariableDeclaration above.
            match arena.parent(parent) {
                Some(decl) => decl,
                None => return false,
            }
        }
        AstKind::TypeAlias { id: alias_id, .. } => {
            if *alias_id != id {
                return false;
            }
            parent
        }
        _ => return false,
    };

    arena.parent(declaration).is_some_and(|grandparent| {
        matches!(
            arena.kind(grandparent),
            AstKind::ExportNamedDeclaration { .. } | AstKind::ExportDefaultDeclaration { .. }
        )
    })
}

/// `{foo: function foo() {}}` - the name is unused but keeps the function
/// from looking anonymous in stack traces.
fn is_function_named_for_stacktraces(module: &Module, id: NodeId) -> bool {
    let arena = module.arena();
    let Some(parent) = arena.parent(id) else {
        return false;
    };
    let Some(fun) = arena.function_data(parent) else {
        return false;
    };
    if fun.id != Some(id) {
        return false;
    }
    arena
        .parent(parent)
        .is_some_and(|gp| matches!(arena.kind(gp), AstKind::ObjectProperty { .. }))
}

/// Report every declaration whose cross-reference list holds only itself.
pub fn find_unused_local_declarations(module: &Module) {
    let arena = module.arena();
    for (&decl, refs) in module.xrefs() {
        if refs.len() > 1 {
            continue;
        }
        let Some(name) = arena.identifier_name(decl) else {
            continue;
        };

        if is_nonlocal_imported_identifier(module, decl) {
            continue;
        }
        // Catch clauses are syntactically required to take a parameter.
        if arena
            .parent(decl)
            .is_some_and(|p| matches!(arena.kind(p), AstKind::CatchClause { .. }))
        {
            continue;
        }
        if is_identifier_of_exported_declaration(module, decl) {
            continue;
        }
        // Properties and methods are reached through member expressions,
        // which resolution does not track; usage is simply unknown.
        if queries::is_unscoped_property_or_method_identifier(arena, decl) {
            continue;
        }
        // Structural-type member names are unscoped, not unused.
        if queries::is_unscoped_type_identifier(arena, decl) {
            continue;
        }
        if is_function_named_for_stacktraces(module, decl) {
            continue;
        }

        let loc = module.location_of(decl);
        if queries::is_functional_expression_argument_identifier(arena, decl) {
            // The parameter cannot be removed, but convention marks it.
            if !name.starts_with('_') {
                reporting::suggest(
                    Some(&loc),
                    &format!("Rename unused parameter {name} to _{name}"),
                );
            }
        } else if arena
            .parent(decl)
            .is_some_and(|p| matches!(arena.kind(p), AstKind::ImportSpecifier { .. }))
        {
            reporting::warn(Some(&loc), &format!("Unused import of {name}"));
        } else if queries::is_function_parameter_identifier(arena, decl) {
            reporting::warn(Some(&loc), &format!("Unused parameter {name}"));
        } else {
            reporting::warn(Some(&loc), &format!("Unused declaration of identifier {name}"));
        }
    }
}
