//! AST-level conditional checks: suspicious empty bodies and copy-pasted
//! `if` tests.

use nodelint_ast::{AstKind, NodeId, walk};
use nodelint_common::reporting;
use nodelint_module::Module;
use rustc_hash::FxHashMap;

pub fn analyze_conditionals(module: &Module) {
    find_empty_body_conditionals(module);
    find_duplicate_if_tests(module);
}

/// `if (x);` and friends: a conditional whose entire body is an empty
/// statement, almost always a stray semicolon.
pub fn find_empty_body_conditionals(module: &Module) {
    let arena = module.arena();
    walk(arena, module.root(), |node| {
        let body = match arena.kind(node) {
            AstKind::IfStatement { consequent, .. } => *consequent,
            AstKind::WhileStatement { body, .. }
            | AstKind::DoWhileStatement { body, .. }
            | AstKind::ForStatement { body, .. }
            | AstKind::ForInStatement { body, .. }
            | AstKind::ForOfStatement { body, .. } => *body,
            _ => return,
        };
        if matches!(arena.kind(body), AstKind::EmptyStatement) {
            reporting::warn(
                Some(&module.location_of(node)),
                "Suspicious semicolon after conditional",
            );
        }
    });
}

/// Two branches of one `if`/`else if` chain testing the exact same source
/// text. Catches copy-paste errors; comparison is by source text, so tests
/// differing only in whitespace are considered distinct.
pub fn find_duplicate_if_tests(module: &Module) {
    let arena = module.arena();
    walk(arena, module.root(), |node| {
        if !matches!(arena.kind(node), AstKind::IfStatement { .. }) {
            return;
        }
        // The whole chain is processed from its first `if`; alternates are
        // not re-processed as chain heads.
        if let Some(parent) = arena.parent(node) {
            if let AstKind::IfStatement { alternate, .. } = arena.kind(parent) {
                if *alternate == Some(node) {
                    return;
                }
            }
        }

        let mut tests: FxHashMap<String, NodeId> = FxHashMap::default();
        let mut current = Some(node);
        while let Some(conditional) = current {
            let AstKind::IfStatement {
                test, alternate, ..
            } = arena.kind(conditional)
            else {
                break;
            };
            let test_source = module.source_excerpt(arena.span(*test));
            match tests.get(&test_source) {
                Some(&first) => {
                    reporting::error(
                        Some(&module.location_of(conditional)),
                        &format!(
                            "Duplicate if condition, previously appears on line {}",
                            arena.span(first).start.line
                        ),
                    );
                }
                None => {
                    tests.insert(test_source, conditional);
                }
            }
            current = *alternate;
        }
    });
}
