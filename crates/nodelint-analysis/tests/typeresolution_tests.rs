//! Type resolution and refinement over built graphs.

mod common;

use common::fixture;
use nodelint_analysis::{ScopedTypes, TypeResolver, refine_types};
use nodelint_ast::testing as t;
use nodelint_ast::{NodeId, queries, walk};
use nodelint_graph::{Graph, GraphNodeId, GraphNodeKind};
use nodelint_module::Module;
use nodelint_types::BaseType;

fn functions_of(module: &Module) -> Vec<NodeId> {
    let mut functions = Vec::new();
    walk(module.arena(), module.root(), |id| {
        if queries::is_function_node(module.arena(), id) {
            functions.push(id);
        }
    });
    functions
}

fn first_node(graph: &Graph, kind: GraphNodeKind) -> GraphNodeId {
    graph
        .nodes()
        .find(|(_, n)| n.kind == kind)
        .map(|(id, _)| id)
        .unwrap_or_else(|| panic!("graph has no {} node", kind.name()))
}

#[test]
fn return_types_synthesize_from_every_return() {
    // function f(a) { if (a) return 1; return "s"; }
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![t::ident("a")],
            vec![
                t::if_stmt(t::ident("a"), t::ret(Some(t::num(1.0))), None),
                t::ret(Some(t::str_lit("s"))),
            ],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];

    let ret = resolver.resolve_return_type(module, fun);
    let sum = ret.as_sum().expect("two distinct return types");
    let bases: Vec<BaseType> = sum.elements.iter().map(nodelint_types::TypeInfo::base).collect();
    assert!(bases.contains(&BaseType::Number));
    assert!(bases.contains(&BaseType::String));
}

#[test]
fn async_functions_wrap_their_returns_in_promises() {
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "p",
            vec![],
            vec![t::ret(Some(t::num(1.0)))],
            true,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];

    let ret = resolver.resolve_return_type(module, fun);
    let promise = ret.as_promise().expect("async return is a promise");
    assert_eq!(promise.nested.base(), BaseType::Number);
}

#[test]
fn await_unwraps_promise_types() {
    // async function p() { return 1; }  async function f() { return await p(); }
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![
            t::fn_decl("p", vec![], vec![t::ret(Some(t::num(1.0)))], true),
            t::fn_decl(
                "f",
                vec![],
                vec![t::ret(Some(t::await_expr(t::call(t::ident("p"), vec![]))))],
                true,
            ),
        ]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let f = functions_of(module)[1];
    let graph = module.function_graph(f).expect("graph builds");

    let await_node = first_node(&graph, GraphNodeKind::Await);
    let ty = resolver.resolve_node_type(module, &graph, await_node);
    assert_eq!(ty.base(), BaseType::Number);
}

#[test]
fn resolution_is_idempotent_and_memoized() {
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![],
            vec![t::ret(Some(t::num(1.0)))],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).unwrap();

    let literal = first_node(&graph, GraphNodeKind::Literal);
    let first = resolver.resolve_node_type(module, &graph, literal);
    let second = resolver.resolve_node_type(module, &graph, literal);
    assert_eq!(first, second);
    assert_eq!(module.cached_node_type(graph.fun, literal), Some(first));
}

#[test]
fn catch_types_union_over_everything_thrown() {
    // function f(a) { try { if (a) throw 1; throw "s"; } catch (e) { return e; } }
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![t::ident("a")],
            vec![t::try_stmt(
                vec![
                    t::if_stmt(t::ident("a"), t::throw_stmt(t::num(1.0)), None),
                    t::throw_stmt(t::str_lit("s")),
                ],
                t::ident("e"),
                vec![t::ret(Some(t::ident("e")))],
            )],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).expect("graph builds");

    let catch_node = first_node(&graph, GraphNodeKind::CatchException);
    let ty = resolver.resolve_node_type(module, &graph, catch_node);
    let sum = ty.as_sum().expect("number and string are both thrown");
    assert_eq!(sum.elements.len(), 2);
}

#[test]
fn object_literals_assemble_strict_property_maps() {
    // const o = { a: 1, b: "s" };
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![],
            vec![
                t::var_decl(
                    "const",
                    vec![t::declarator(
                        t::ident("o"),
                        Some(t::obj(vec![
                            t::prop(t::ident("a"), t::num(1.0)),
                            t::prop(t::ident("b"), t::str_lit("s")),
                        ])),
                    )],
                ),
                t::ret(Some(t::ident("o"))),
            ],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).unwrap();

    let literal = first_node(&graph, GraphNodeKind::ObjectLiteral);
    let ty = resolver.resolve_node_type(module, &graph, literal);
    let object = ty.as_object().expect("object literal type");
    assert!(object.strict);
    assert_eq!(object.properties["a"].base(), BaseType::Number);
    assert_eq!(object.properties["b"].base(), BaseType::String);
}

#[test]
fn spreads_merge_and_computed_keys_widen() {
    // const a = { x: 1 };  const b = { ...a, [k]: 2 };
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![t::ident("k")],
            vec![
                t::var_decl(
                    "const",
                    vec![t::declarator(
                        t::ident("a"),
                        Some(t::obj(vec![t::prop(t::ident("x"), t::num(1.0))])),
                    )],
                ),
                t::var_decl(
                    "const",
                    vec![t::declarator(
                        t::ident("b"),
                        Some(t::obj(vec![
                            t::spread(t::ident("a")),
                            t::computed_prop(t::ident("k"), t::num(2.0)),
                        ])),
                    )],
                ),
                t::ret(Some(t::ident("b"))),
            ],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).unwrap();

    let literals: Vec<GraphNodeId> = graph
        .nodes()
        .filter(|(_, n)| n.kind == GraphNodeKind::ObjectLiteral)
        .map(|(id, _)| id)
        .collect();
    let b = literals[1];
    let ty = resolver.resolve_node_type(module, &graph, b);
    let object = ty.as_object().expect("object type");
    // The dynamic key may overwrite x, so everything is widened and the
    // property set stops being closed.
    assert!(!object.strict);
    assert_eq!(object.properties["x"].base(), BaseType::Unknown);
}

#[test]
fn nullable_annotations_resolve_to_sums() {
    // function f(x: ?number) { return x; }
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![t::ident_typed("x", t::nullable_ty(t::number_ty()))],
            vec![t::ret(Some(t::ident("x")))],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).unwrap();

    let load = first_node(&graph, GraphNodeKind::LoadValue);
    let ty = resolver.resolve_node_type(module, &graph, load);
    let sum = ty.as_sum().expect("?number is null | number");
    let bases: Vec<BaseType> = sum.elements.iter().map(nodelint_types::TypeInfo::base).collect();
    assert!(bases.contains(&BaseType::Null));
    assert!(bases.contains(&BaseType::Number));
}

#[test]
fn union_annotations_resolve_to_sums() {
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![t::ident_typed(
                "x",
                t::union_ty(vec![t::number_ty(), t::string_ty()]),
            )],
            vec![t::ret(Some(t::ident("x")))],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).unwrap();

    let load = first_node(&graph, GraphNodeKind::LoadValue);
    let ty = resolver.resolve_node_type(module, &graph, load);
    assert!(ty.as_sum().is_some());
}

#[test]
fn truthy_branches_narrow_nullable_parameters() {
    // function f(x: ?number) { if (x) { return x + 1; } return 0; }
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![t::ident_typed("x", t::nullable_ty(t::number_ty()))],
            vec![
                t::if_stmt(
                    t::ident("x"),
                    t::block(vec![t::ret(Some(t::binary(
                        "+",
                        t::ident("x"),
                        t::num(1.0),
                    )))]),
                    None,
                ),
                t::ret(Some(t::num(0.0))),
            ],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).unwrap();

    let if_node = first_node(&graph, GraphNodeKind::If);
    let condition = graph.node(if_node).input(0);
    let unrefined = resolver.resolve_node_type(module, &graph, condition);
    assert!(unrefined.as_sum().is_some(), "x starts as null | number");

    let if_true = first_node(&graph, GraphNodeKind::IfTrue);
    let mut scope = ScopedTypes::default();
    refine_types(&resolver, module, &graph, &mut scope, if_true);

    let refined = scope.type_of(&resolver, module, &graph, condition);
    assert_eq!(refined.base(), BaseType::Number, "null is ruled out");

    // Monotone: the refined type is one of the unrefined sum's elements.
    assert!(unrefined.as_sum().unwrap().elements.contains(&refined));
}

#[test]
fn falsy_branches_do_not_widen() {
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![t::ident_typed("x", t::nullable_ty(t::number_ty()))],
            vec![
                t::if_stmt(t::ident("x"), t::block(vec![]), None),
                t::ret(Some(t::num(0.0))),
            ],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).unwrap();

    let if_node = first_node(&graph, GraphNodeKind::If);
    let condition = graph.node(if_node).input(0);
    let unrefined = resolver.resolve_node_type(module, &graph, condition);

    let if_false = first_node(&graph, GraphNodeKind::IfFalse);
    let mut scope = ScopedTypes::default();
    refine_types(&resolver, module, &graph, &mut scope, if_false);
    let after = scope.type_of(&resolver, module, &graph, condition);
    assert_eq!(after, unrefined, "the falsy side keeps the full sum");
}

#[test]
fn logical_and_pins_both_sides_in_the_taken_branch() {
    // function f(a: ?number, b: ?number) { if (a && b) { ... } }
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![
                t::ident_typed("a", t::nullable_ty(t::number_ty())),
                t::ident_typed("b", t::nullable_ty(t::number_ty())),
            ],
            vec![
                t::if_stmt(
                    t::logical("&&", t::ident("a"), t::ident("b")),
                    t::block(vec![]),
                    None,
                ),
                t::ret(Some(t::num(0.0))),
            ],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).unwrap();

    let if_true = first_node(&graph, GraphNodeKind::IfTrue);
    let mut scope = ScopedTypes::default();
    refine_types(&resolver, module, &graph, &mut scope, if_true);

    // Both LoadValue operands of the && are narrowed.
    let loads: Vec<GraphNodeId> = graph
        .nodes()
        .filter(|(_, n)| n.kind == GraphNodeKind::LoadValue)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(loads.len(), 2);
    for load in loads {
        assert_eq!(
            scope.type_of(&resolver, module, &graph, load).base(),
            BaseType::Number
        );
    }
}

#[test]
fn logical_not_inverts_the_refinement() {
    // if (!x) { } else { /* x is truthy here */ }
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![t::ident_typed("x", t::nullable_ty(t::number_ty()))],
            vec![
                t::if_stmt(
                    t::unary("!", t::ident("x")),
                    t::block(vec![]),
                    Some(t::block(vec![])),
                ),
                t::ret(Some(t::num(0.0))),
            ],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    let graph = module.function_graph(fun).unwrap();

    let load = first_node(&graph, GraphNodeKind::LoadValue);
    let if_false = first_node(&graph, GraphNodeKind::IfFalse);
    let mut scope = ScopedTypes::default();
    refine_types(&resolver, module, &graph, &mut scope, if_false);

    // The false branch of !x means x itself is truthy.
    assert_eq!(
        scope.type_of(&resolver, module, &graph, load).base(),
        BaseType::Number
    );
}

#[test]
fn class_instances_expose_the_merged_member_map() {
    // class C { m() { return 1; } get g() { return "s"; } }  new C().m
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![
            t::class_decl(
                "C",
                vec![
                    t::class_method("method", "m", vec![], vec![t::ret(Some(t::num(1.0)))]),
                    t::class_method("get", "g", vec![], vec![t::ret(Some(t::str_lit("s")))]),
                ],
            ),
            t::fn_decl(
                "f",
                vec![],
                vec![t::ret(Some(t::new_expr(t::ident("C"), vec![])))],
                false,
            ),
        ]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let f = *functions_of(module).last().unwrap();
    let graph = module.function_graph(f).unwrap();

    let new_call = first_node(&graph, GraphNodeKind::NewCall);
    let ty = resolver.resolve_node_type(module, &graph, new_call);
    let object = ty.as_object().expect("instances are objects");
    assert!(!object.strict, "constructors may add fields");
    assert_eq!(object.properties["m"].base(), BaseType::Function);
    assert_eq!(object.properties["g"].base(), BaseType::String, "getter type");
}

#[test]
fn function_graphs_for_unsupported_constructs_resolve_to_nothing() {
    // with(o) {} is not lowered; the function has no graph and its return
    // type degrades to unknown.
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![],
            vec![serde_json::json!({
                "type": "WithStatement",
                "object": t::ident("o"),
                "body": t::block(vec![]),
            })],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];
    assert!(module.function_graph(fun).is_none());
    assert_eq!(
        resolver.resolve_return_type(module, fun).base(),
        BaseType::Unknown
    );
}

#[test]
fn rest_parameters_make_functions_variadic() {
    let fx = fixture(&[(
        "a.js",
        "",
        t::program(vec![t::fn_decl(
            "f",
            vec![
                t::ident("a"),
                serde_json::json!({"type": "RestElement", "argument": t::ident("rest")}),
            ],
            vec![],
            false,
        )]),
    )]);
    let module = fx.host.module(&fx.entry).unwrap();
    let resolver = TypeResolver::new(&fx.host);
    let fun = functions_of(module)[0];

    let ty = nodelint_types::TypeInfo::make_function_def(module.def_site(fun));
    let shape = resolver
        .function_shape(ty.as_function().unwrap())
        .expect("shape forces");
    assert!(shape.variadic);
    assert_eq!(shape.argument_types.len(), 2);
}
