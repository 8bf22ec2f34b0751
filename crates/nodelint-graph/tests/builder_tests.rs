//! Graph construction tests: lowering shapes, SSA invariants, and the
//! well-formedness properties every built graph must satisfy.

use nodelint_ast::testing as t;
use nodelint_ast::{AstArena, NodeId, import_babel_ast, queries, walk};
use nodelint_graph::{Graph, GraphBuilder, GraphNodeKind, OrphanJump};
use nodelint_resolver::resolve_module_names;

fn build_first_function(
    program: &serde_json::Value,
) -> (AstArena, NodeId, Graph, Vec<OrphanJump>) {
    let (arena, root) = import_babel_ast(program).expect("fixture must import");
    let resolved = resolve_module_names(&arena, root);
    let mut fun = None;
    walk(&arena, root, |id| {
        if fun.is_none() && queries::is_function_node(&arena, id) {
            fun = Some(id);
        }
    });
    let fun = fun.expect("fixture must contain a function");
    let builder = GraphBuilder::new(&arena, &resolved.targets, fun).expect("function node");
    let (graph, orphans) = builder.build().expect("graph must build");
    (arena, fun, graph, orphans)
}

fn kind_count(graph: &Graph, kind: GraphNodeKind) -> usize {
    graph.nodes().filter(|(_, n)| n.kind == kind).count()
}

/// The well-formedness bundle every built graph must satisfy: non-zero
/// inputs, φ operands present, sealed blocks, and End collecting exactly
/// the leaves.
fn assert_well_formed(graph: &Graph) {
    for (id, node) in graph.nodes() {
        for n in 0..node.input_count() {
            assert_ne!(node.input(n), 0, "node {id} has a Start input");
        }
        if node.kind == GraphNodeKind::Phi {
            assert!(node.input_count() >= 1, "phi {id} has no operands");
        }
    }
    for b in 0..graph.block_count() {
        assert!(graph.block(b).is_sealed(), "block {b} left unsealed");
    }
    if let Some(end) = graph.end_node() {
        let leaves: Vec<_> = graph
            .nodes()
            .filter(|&(id, n)| id != end && n.prev_count() > 0 && n.next_count() == 0)
            .map(|(id, _)| id)
            .collect();
        assert!(leaves.is_empty(), "leaves not collected by End: {leaves:?}");
        for n in 0..graph.node(end).prev_count() {
            let prev = graph.node(end).prev(n);
            assert_eq!(graph.node(prev).nexts(), [end]);
        }
    }
}

#[test]
fn empty_function_is_start_and_end() {
    let program = t::program(vec![t::fn_decl("f", vec![], vec![], false)]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_eq!(graph.node(0).kind, GraphNodeKind::Start);
    assert_eq!(graph.node(1).kind, GraphNodeKind::End);
    assert_well_formed(&graph);
}

#[test]
fn straight_line_code_builds_without_phis() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![],
        vec![
            t::var_decl("let", vec![t::declarator(t::ident("x"), Some(t::num(1.0)))]),
            t::ret(Some(t::ident("x"))),
        ],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);
    assert_eq!(kind_count(&graph, GraphNodeKind::Phi), 0);
    assert_eq!(kind_count(&graph, GraphNodeKind::Return), 1);
}

#[test]
fn branch_writing_the_same_value_elides_the_phi() {
    // let x = 1; if (a) {} return x; - both paths agree on x.
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![t::ident("a")],
        vec![
            t::var_decl("let", vec![t::declarator(t::ident("x"), Some(t::num(1.0)))]),
            t::if_stmt(t::ident("a"), t::block(vec![]), None),
            t::ret(Some(t::ident("x"))),
        ],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);
    assert_eq!(kind_count(&graph, GraphNodeKind::Phi), 0, "trivial phi not elided");
}

#[test]
fn diverging_writes_merge_through_a_phi() {
    // let x = 1; if (a) { x = 2; } return x;
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![t::ident("a")],
        vec![
            t::var_decl("let", vec![t::declarator(t::ident("x"), Some(t::num(1.0)))]),
            t::if_stmt(
                t::ident("a"),
                t::block(vec![t::expr_stmt(t::assign("=", t::ident("x"), t::num(2.0)))]),
                None,
            ),
            t::ret(Some(t::ident("x"))),
        ],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);
    assert_eq!(kind_count(&graph, GraphNodeKind::Phi), 1);

    let (phi, phi_node) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Phi)
        .unwrap();
    assert_eq!(phi_node.input_count(), 2);

    // The return reads the merged value.
    let (_, ret) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Return)
        .unwrap();
    assert_eq!(ret.input(0), phi);

    // The phi threads directly after the Merge node.
    let (_, merge) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Merge)
        .unwrap();
    assert_eq!(merge.nexts(), [phi]);
}

#[test]
fn while_loops_merge_the_back_edge_into_the_header() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![t::ident("a")],
        vec![
            t::while_stmt(
                t::ident("a"),
                t::block(vec![t::expr_stmt(t::call(t::ident("g"), vec![]))]),
            ),
            t::ret(Some(t::num(0.0))),
        ],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);
    let (_, merge) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Merge)
        .unwrap();
    assert_eq!(merge.prev_count(), 2, "entry edge plus back edge");
    assert_eq!(kind_count(&graph, GraphNodeKind::Loop), 1);
    assert_eq!(kind_count(&graph, GraphNodeKind::IfTrue), 1);
    assert_eq!(kind_count(&graph, GraphNodeKind::IfFalse), 1);
}

#[test]
fn loop_carried_variables_get_header_phis() {
    // let i = 0; while (a) { i = i + 1; } return i;
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![t::ident("a")],
        vec![
            t::var_decl("let", vec![t::declarator(t::ident("i"), Some(t::num(0.0)))]),
            t::while_stmt(
                t::ident("a"),
                t::block(vec![t::expr_stmt(t::assign(
                    "=",
                    t::ident("i"),
                    t::binary("+", t::ident("i"), t::num(1.0)),
                ))]),
            ),
            t::ret(Some(t::ident("i"))),
        ],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);
    assert!(kind_count(&graph, GraphNodeKind::Phi) >= 1);
}

#[test]
fn breaks_are_tied_up_by_the_enclosing_loop() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![t::ident("a")],
        vec![t::while_stmt(t::ident("a"), t::block(vec![t::break_stmt()]))],
        false,
    )]);
    let (_, _, graph, orphans) = build_first_function(&program);
    assert!(orphans.is_empty());
    assert_well_formed(&graph);
    let (_, brk) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Break)
        .unwrap();
    assert_eq!(brk.next_count(), 1, "break wired into the loop's merge");
}

#[test]
fn continue_jumps_back_to_the_loop_header() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![t::ident("a")],
        vec![t::while_stmt(
            t::ident("a"),
            t::block(vec![t::if_stmt(
                t::ident("a"),
                t::block(vec![t::continue_stmt()]),
                None,
            )]),
        )],
        false,
    )]);
    let (_, _, graph, orphans) = build_first_function(&program);
    assert!(orphans.is_empty());
    assert_well_formed(&graph);
    let (_, cont) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Continue)
        .unwrap();
    assert_eq!(cont.next_count(), 1);
}

#[test]
fn orphan_break_is_reported_not_built() {
    let program = t::program(vec![t::fn_decl("f", vec![], vec![t::break_stmt()], false)]);
    let (_, _, graph, orphans) = build_first_function(&program);
    assert_eq!(orphans.len(), 1);
    assert!(orphans[0].message.contains("break statement outside"));
    assert_eq!(kind_count(&graph, GraphNodeKind::Break), 0);
}

#[test]
fn throw_inside_try_connects_to_the_catch() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![],
        vec![t::try_stmt(
            vec![t::throw_stmt(t::num(1.0))],
            t::ident("e"),
            vec![t::ret(Some(t::ident("e")))],
        )],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);

    let (catch_id, _) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::CatchException)
        .unwrap();
    let (_, prepare) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::PrepareException)
        .unwrap();
    assert!(prepare.nexts().contains(&catch_id));
    assert_eq!(kind_count(&graph, GraphNodeKind::Throw), 0, "throw was caught");

    // The catch parameter reads the CatchException value.
    let (_, ret) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Return)
        .unwrap();
    assert_eq!(ret.input(0), catch_id);
}

#[test]
fn uncaught_throw_becomes_a_terminal_throw_node() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![],
        vec![t::throw_stmt(t::num(1.0))],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);
    assert_eq!(kind_count(&graph, GraphNodeKind::Throw), 1);
}

#[test]
fn finally_clauses_are_an_implementation_limit() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![],
        vec![serde_json::json!({
            "type": "TryStatement",
            "block": t::block(vec![]),
            "handler": null,
            "finalizer": t::block(vec![]),
        })],
        false,
    )]);
    let (arena, root) = import_babel_ast(&program).unwrap();
    let resolved = resolve_module_names(&arena, root);
    let mut fun = None;
    walk(&arena, root, |id| {
        if fun.is_none() && queries::is_function_node(&arena, id) {
            fun = Some(id);
        }
    });
    let builder = GraphBuilder::new(&arena, &resolved.targets, fun.unwrap()).unwrap();
    let err = builder.build().unwrap_err();
    assert!(err.message.contains("finally"));
}

#[test]
fn code_after_return_is_not_lowered() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![],
        vec![
            t::ret(Some(t::num(1.0))),
            t::expr_stmt(t::call(t::ident("g"), vec![])),
        ],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);
    assert_eq!(kind_count(&graph, GraphNodeKind::Call), 0);
    assert_eq!(kind_count(&graph, GraphNodeKind::LoadValue), 0);
}

#[test]
fn conditional_expressions_merge_their_arm_values() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![t::ident("a")],
        vec![t::ret(Some(t::cond_expr(
            t::ident("a"),
            t::num(1.0),
            t::num(2.0),
        )))],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);

    let (phi, phi_node) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Phi)
        .unwrap();
    assert_eq!(phi_node.input_count(), 2);
    for n in 0..2 {
        assert_eq!(graph.node(phi_node.input(n)).kind, GraphNodeKind::Literal);
    }
    let (_, ret) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Return)
        .unwrap();
    assert_eq!(ret.input(0), phi);
}

#[test]
fn switch_cases_chain_with_fallthrough_merges() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![t::ident("a")],
        vec![t::switch_stmt(
            t::ident("a"),
            vec![
                t::switch_case(
                    Some(t::num(1.0)),
                    vec![t::expr_stmt(t::call(t::ident("g"), vec![]))],
                ),
                t::switch_case(None, vec![t::expr_stmt(t::call(t::ident("h"), vec![]))]),
            ],
        )],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);
    assert_eq!(kind_count(&graph, GraphNodeKind::Switch), 1);
    assert_eq!(kind_count(&graph, GraphNodeKind::Case), 2);
}

#[test]
fn for_of_binds_the_loop_variable_to_the_loop_node() {
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![t::ident("arr")],
        vec![t::for_of_stmt(
            t::var_decl("const", vec![t::declarator(t::ident("x"), None)]),
            t::ident("arr"),
            t::block(vec![t::expr_stmt(t::call(t::ident("g"), vec![t::ident("x")]))]),
        )],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);

    let (loop_id, _) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::ForOfLoop)
        .unwrap();
    let (_, call) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Call)
        .unwrap();
    assert_eq!(call.input(1), loop_id, "x reads the loop-produced value");
}

#[test]
fn hoisted_vars_read_undefined_before_their_declaration() {
    // function f() { g(v); var v = 1; }
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![],
        vec![
            t::expr_stmt(t::call(t::ident("g"), vec![t::ident("v")])),
            t::var_decl("var", vec![t::declarator(t::ident("v"), Some(t::num(1.0)))]),
        ],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);
    let (undef, _) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Undefined)
        .unwrap();
    let (_, call) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Call)
        .unwrap();
    assert_eq!(call.input(1), undef);
}

#[test]
fn inner_function_declarations_are_hoisted_in_their_block() {
    // function f() { return g(); function g() {} }
    let program = t::program(vec![t::fn_decl(
        "f",
        vec![],
        vec![
            t::ret(Some(t::call(t::ident("g"), vec![]))),
            t::fn_decl("g", vec![], vec![], false),
        ],
        false,
    )]);
    let (_, _, graph, _) = build_first_function(&program);
    assert_well_formed(&graph);

    let (fun_id, _) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Function)
        .unwrap();
    let (_, call) = graph
        .nodes()
        .find(|(_, n)| n.kind == GraphNodeKind::Call)
        .unwrap();
    assert_eq!(call.input(0), fun_id, "callee is the hoisted function value");
    assert_eq!(kind_count(&graph, GraphNodeKind::LoadValue), 0);
}
