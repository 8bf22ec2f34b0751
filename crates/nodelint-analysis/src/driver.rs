//! The per-module analysis driver.

use crate::typeresolution::TypeResolver;
use crate::{conditionals, missingawait, typecheck, unused};
use nodelint_ast::{NodeId, queries, walk};
use nodelint_common::reporting;
use nodelint_module::{Module, ModuleHost};
use tracing::info_span;

/// Run every pass over one module: lexical resolution (memoized), the
/// AST-level checks, then graph construction plus the graph passes for
/// each function body.
pub fn analyze_module(host: &ModuleHost, module: &Module) {
    let _span = info_span!("analyze", module = %module.path().display()).entered();

    // Local resolution happens first; imported resolution runs lazily
    // behind it, and both precede any graph work.
    module.resolved_names();
    for (name, node) in module.free_top_level_names() {
        reporting::trace(
            Some(&module.location_of(*node)),
            &format!("Unresolved top-level name {name}, assuming a host global"),
        );
    }

    conditionals::analyze_conditionals(module);
    unused::find_unused_local_declarations(module);

    let resolver = TypeResolver::new(host);
    let mut functions: Vec<NodeId> = Vec::new();
    walk(module.arena(), module.root(), |node| {
        if queries::is_function_node(module.arena(), node) {
            functions.push(node);
        }
    });
    for fun in functions {
        let Some(graph) = module.function_graph(fun) else {
            continue;
        };
        typecheck::typecheck_graph(&resolver, module, &graph);
        missingawait::missing_await_pass(&resolver, module, &graph);
    }
}
