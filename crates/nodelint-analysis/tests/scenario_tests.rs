//! End-to-end diagnostic scenarios over fixture modules.
//!
//! The diagnostic counters are process globals, so every test here takes
//! the same lock, resets them, analyzes one fixture, and asserts on the
//! deltas.

mod common;

use common::fixture;
use nodelint_analysis::analyze_module;
use nodelint_ast::testing as t;
use nodelint_common::reporting::{self, ReportingStats};
use std::sync::Mutex;

static GUARD: Mutex<()> = Mutex::new(());

fn analyze(files: &[(&str, &str, serde_json::Value)]) -> ReportingStats {
    let _guard = GUARD.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    reporting::reset_statistics();
    let fx = fixture(files);
    let module = fx.host.module(&fx.entry).expect("entry module");
    analyze_module(&fx.host, module);
    reporting::statistics()
}

#[test]
fn empty_body_conditional_warns_once() {
    // if (x);
    let stats = analyze(&[(
        "a.js",
        "if (x);",
        t::program(vec![t::if_stmt(t::ident("x"), t::empty_stmt(), None)]),
    )]);
    assert_eq!(stats.warnings, 1);
    assert_eq!(stats.errors, 0);
}

#[test]
fn duplicate_if_test_is_an_error_naming_the_first_line() {
    // if (a) f(); else if (a) g();
    let source = "if (a) f(); else if (a) g();";
    let test1 = t::spanned(t::ident("a"), 4, 5, 1, 4);
    let test2 = t::spanned(t::ident("a"), 21, 22, 1, 21);
    let if2 = t::spanned(
        t::if_stmt(
            test2,
            t::expr_stmt(t::call(t::ident("g"), vec![])),
            None,
        ),
        17,
        28,
        1,
        17,
    );
    let if1 = t::spanned(
        t::if_stmt(
            test1,
            t::expr_stmt(t::call(t::ident("f"), vec![])),
            Some(if2),
        ),
        0,
        28,
        1,
        0,
    );
    let stats = analyze(&[("a.js", source, t::program(vec![if1]))]);
    assert_eq!(stats.errors, 1);
}

#[test]
fn whitespace_variants_of_a_test_are_distinct() {
    // if (a) f(); else if (a ) g(); - comparison is exact source text.
    let source = "if (a) f(); else if (a ) g();";
    let test1 = t::spanned(t::ident("a"), 4, 5, 1, 4);
    let test2 = t::spanned(t::ident("a"), 21, 23, 1, 21);
    let if2 = t::if_stmt(test2, t::expr_stmt(t::call(t::ident("g"), vec![])), None);
    let if1 = t::if_stmt(test1, t::expr_stmt(t::call(t::ident("f"), vec![])), Some(if2));
    let stats = analyze(&[("a.js", source, t::program(vec![if1]))]);
    assert_eq!(stats.errors, 0);
}

#[test]
fn unused_imports_warn_with_the_imported_name() {
    let stats = analyze(&[
        (
            "a.js",
            "import { foo } from './m';",
            t::program(vec![t::import_decl(vec![t::import_spec("foo", "foo")], "./m")]),
        ),
        (
            "m.js",
            "export function foo() {}",
            t::program(vec![t::export_named_decl(t::fn_decl(
                "foo",
                vec![],
                vec![],
                false,
            ))]),
        ),
    ]);
    assert_eq!(stats.warnings, 1, "exactly the unused-import warning");
    assert_eq!(stats.errors, 0);
}

#[test]
fn unused_parameters_of_expressions_get_a_rename_suggestion() {
    // const h = (x) => 42;
    let stats = analyze(&[(
        "a.js",
        "const h = (x) => 42;",
        t::program(vec![t::var_decl(
            "const",
            vec![t::declarator(
                t::ident("h"),
                Some(t::arrow_expr(vec![t::ident("x")], t::num(42.0))),
            )],
        )]),
    )]);
    assert_eq!(stats.suggestions, 1, "rename x to _x");
    // h itself is an unused declaration; that is a separate warning.
    assert_eq!(stats.warnings, 1);
}

#[test]
fn underscore_parameters_are_exempt_from_the_rename_suggestion() {
    let stats = analyze(&[(
        "a.js",
        "export const h = (_x) => 42;",
        t::program(vec![t::export_named_decl(t::var_decl(
            "const",
            vec![t::declarator(
                t::ident("h"),
                Some(t::arrow_expr(vec![t::ident("_x")], t::num(42.0))),
            )],
        ))]),
    )]);
    assert_eq!(stats.suggestions, 0);
    assert_eq!(stats.warnings, 0);
}

#[test]
fn promise_used_as_a_value_warns_about_a_missing_await() {
    // async function p() { return 1; }  function q() { return p() + 1; }
    let stats = analyze(&[(
        "a.js",
        "export async function p() { return 1; }\nexport function q() { return p() + 1; }",
        t::program(vec![
            t::export_named_decl(t::fn_decl(
                "p",
                vec![],
                vec![t::ret(Some(t::num(1.0)))],
                true,
            )),
            t::export_named_decl(t::fn_decl(
                "q",
                vec![],
                vec![t::ret(Some(t::binary(
                    "+",
                    t::call(t::ident("p"), vec![]),
                    t::num(1.0),
                )))],
                false,
            )),
        ]),
    )]);
    assert_eq!(stats.warnings, 1, "possible missing await");
    assert_eq!(stats.errors, 0);
}

#[test]
fn returning_a_promise_from_an_async_function_is_fine() {
    // async function p() { return 1; }  async function q() { return p(); }
    let stats = analyze(&[(
        "a.js",
        "export async function p() { return 1; }\nexport async function q() { return p(); }",
        t::program(vec![
            t::export_named_decl(t::fn_decl(
                "p",
                vec![],
                vec![t::ret(Some(t::num(1.0)))],
                true,
            )),
            t::export_named_decl(t::fn_decl(
                "q",
                vec![],
                vec![t::ret(Some(t::call(t::ident("p"), vec![])))],
                true,
            )),
        ]),
    )]);
    assert_eq!(stats.warnings, 0);
    assert_eq!(stats.suggestions, 0);
    assert_eq!(stats.errors, 0);
}

#[test]
fn returning_a_promise_from_a_plain_function_is_a_suggestion() {
    // function q() { return p(); } - making q async would be clearer.
    let stats = analyze(&[(
        "a.js",
        "export async function p() { return 1; }\nexport function q() { return p(); }",
        t::program(vec![
            t::export_named_decl(t::fn_decl(
                "p",
                vec![],
                vec![t::ret(Some(t::num(1.0)))],
                true,
            )),
            t::export_named_decl(t::fn_decl(
                "q",
                vec![],
                vec![t::ret(Some(t::call(t::ident("p"), vec![])))],
                false,
            )),
        ]),
    )]);
    assert_eq!(stats.suggestions, 1);
    assert_eq!(stats.warnings, 0);
}

#[test]
fn promise_annotated_return_types_count_as_async() {
    // function q(): Promise { return p(); }
    let stats = analyze(&[(
        "a.js",
        "export async function p() { return 1; }\nexport function q(): Promise { return p(); }",
        t::program(vec![
            t::export_named_decl(t::fn_decl(
                "p",
                vec![],
                vec![t::ret(Some(t::num(1.0)))],
                true,
            )),
            t::export_named_decl(t::fn_decl_with_return_type(
                "q",
                vec![],
                vec![t::ret(Some(t::call(t::ident("p"), vec![])))],
                false,
                t::generic_ty("Promise"),
            )),
        ]),
    )]);
    assert_eq!(stats.suggestions, 0);
    assert_eq!(stats.warnings, 0);
}

#[test]
fn accessing_a_missing_property_of_a_strict_object_is_an_error() {
    // function f() { const o = { a: 1 }; return o.b; }
    let stats = analyze(&[(
        "a.js",
        "export function f() { const o = { a: 1 }; return o.b; }",
        t::program(vec![t::export_named_decl(t::fn_decl(
            "f",
            vec![],
            vec![
                t::var_decl(
                    "const",
                    vec![t::declarator(
                        t::ident("o"),
                        Some(t::obj(vec![t::prop(t::ident("a"), t::num(1.0))])),
                    )],
                ),
                t::ret(Some(t::member(t::ident("o"), t::ident("b"), false))),
            ],
            false,
        ))]),
    )]);
    assert_eq!(stats.errors, 1, "o.b is always undefined");
    assert_eq!(stats.warnings, 0);
}

#[test]
fn present_properties_of_a_strict_object_are_fine() {
    let stats = analyze(&[(
        "a.js",
        "export function f() { const o = { a: 1 }; return o.a; }",
        t::program(vec![t::export_named_decl(t::fn_decl(
            "f",
            vec![],
            vec![
                t::var_decl(
                    "const",
                    vec![t::declarator(
                        t::ident("o"),
                        Some(t::obj(vec![t::prop(t::ident("a"), t::num(1.0))])),
                    )],
                ),
                t::ret(Some(t::member(t::ident("o"), t::ident("a"), false))),
            ],
            false,
        ))]),
    )]);
    assert_eq!(stats.errors, 0);
}

#[test]
fn property_access_on_a_number_is_an_error() {
    let stats = analyze(&[(
        "a.js",
        "export function f() { const n = 1; return n.x; }",
        t::program(vec![t::export_named_decl(t::fn_decl(
            "f",
            vec![],
            vec![
                t::var_decl(
                    "const",
                    vec![t::declarator(t::ident("n"), Some(t::num(1.0)))],
                ),
                t::ret(Some(t::member(t::ident("n"), t::ident("x"), false))),
            ],
            false,
        ))]),
    )]);
    assert_eq!(stats.errors, 1);
}

#[test]
fn property_access_on_an_unawaited_promise_warns() {
    // function f() { const v = p(); return v.x; } - v is a promise.
    let stats = analyze(&[(
        "a.js",
        "export async function p() { return 1; }\nexport function f() { return p().x; }",
        t::program(vec![
            t::export_named_decl(t::fn_decl(
                "p",
                vec![],
                vec![t::ret(Some(t::num(1.0)))],
                true,
            )),
            t::export_named_decl(t::fn_decl(
                "f",
                vec![],
                vec![t::ret(Some(t::member(
                    t::call(t::ident("p"), vec![]),
                    t::ident("x"),
                    false,
                )))],
                false,
            )),
        ]),
    )]);
    // One warning for the property access; the call itself also trips the
    // missing-await pass since its value is consumed.
    assert_eq!(stats.warnings, 2);
    assert_eq!(stats.errors, 0);
}

#[test]
fn chaining_then_on_a_promise_is_not_flagged() {
    let stats = analyze(&[(
        "a.js",
        "export async function p() { return 1; }\nexport function f() { return p().then(g); }",
        t::program(vec![
            t::export_named_decl(t::fn_decl(
                "p",
                vec![],
                vec![t::ret(Some(t::num(1.0)))],
                true,
            )),
            t::export_named_decl(t::fn_decl(
                "f",
                vec![],
                vec![t::ret(Some(t::call(
                    t::member(t::call(t::ident("p"), vec![]), t::ident("then"), false),
                    vec![t::ident("g")],
                )))],
                false,
            )),
        ]),
    )]);
    assert_eq!(stats.warnings, 0);
    assert_eq!(stats.errors, 0);
}

#[test]
fn calling_a_non_function_value_is_an_error() {
    let source = "export function f() { const n = 1; n(); }";
    //                                  0123456789...
    // The callee excerpt needs a real span: "n" at offset 35.
    let stats = analyze(&[(
        "a.js",
        source,
        t::program(vec![t::export_named_decl(t::fn_decl(
            "f",
            vec![],
            vec![
                t::var_decl(
                    "const",
                    vec![t::declarator(t::ident("n"), Some(t::num(1.0)))],
                ),
                t::expr_stmt(t::call(t::spanned(t::ident("n"), 35, 36, 1, 35), vec![])),
            ],
            false,
        ))]),
    )]);
    assert_eq!(stats.errors, 1);
}

#[test]
fn overful_argument_lists_warn() {
    let stats = analyze(&[(
        "a.js",
        "export function f(a) {}\nexport function g() { f(1, 2); }",
        t::program(vec![
            t::export_named_decl(t::fn_decl("f", vec![t::ident("a")], vec![], false)),
            t::export_named_decl(t::fn_decl(
                "g",
                vec![],
                vec![t::expr_stmt(t::call(
                    t::ident("f"),
                    vec![t::num(1.0), t::num(2.0)],
                ))],
                false,
            )),
        ]),
    )]);
    // "Function only takes 1 arguments, but 2 were provided", plus the
    // unused-parameter warning for a.
    assert_eq!(stats.warnings, 2);
}

#[test]
fn annotated_parameter_types_are_enforced_at_calls() {
    // function f(x: number) {}  f("s");
    let stats = analyze(&[(
        "a.js",
        "export function f(x: number) { return x; }\nexport function g() { f('s'); }",
        t::program(vec![
            t::export_named_decl(t::fn_decl(
                "f",
                vec![t::ident_typed("x", t::number_ty())],
                vec![t::ret(Some(t::ident("x")))],
                false,
            )),
            t::export_named_decl(t::fn_decl(
                "g",
                vec![],
                vec![t::expr_stmt(t::call(t::ident("f"), vec![t::str_lit("s")]))],
                false,
            )),
        ]),
    )]);
    assert_eq!(stats.errors, 1, "string passed where number expected");
}

#[test]
fn matching_argument_types_pass_the_call_check() {
    let stats = analyze(&[(
        "a.js",
        "export function f(x: number) { return x; }\nexport function g() { f(2); }",
        t::program(vec![
            t::export_named_decl(t::fn_decl(
                "f",
                vec![t::ident_typed("x", t::number_ty())],
                vec![t::ret(Some(t::ident("x")))],
                false,
            )),
            t::export_named_decl(t::fn_decl(
                "g",
                vec![],
                vec![t::expr_stmt(t::call(t::ident("f"), vec![t::num(2.0)]))],
                false,
            )),
        ]),
    )]);
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.warnings, 0);
}

#[test]
fn unused_function_parameters_warn() {
    let stats = analyze(&[(
        "a.js",
        "export function f(unused) {}",
        t::program(vec![t::export_named_decl(t::fn_decl(
            "f",
            vec![t::ident("unused")],
            vec![],
            false,
        ))]),
    )]);
    assert_eq!(stats.warnings, 1, "Unused parameter unused");
}

#[test]
fn orphan_break_statements_are_reported_as_errors() {
    let stats = analyze(&[(
        "a.js",
        "export function f() { break; }",
        t::program(vec![t::export_named_decl(t::fn_decl(
            "f",
            vec![],
            vec![t::break_stmt()],
            false,
        ))]),
    )]);
    assert_eq!(stats.errors, 1);
}
