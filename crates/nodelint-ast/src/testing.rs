//! Compact Babel-JSON fixture builders for tests.
//!
//! Downstream crates exercise the analyzer by feeding it the same JSON the
//! parser front-end would produce. These helpers keep those fixtures
//! readable - a test builds `call(ident("f"), vec![num(1.0)])` instead of
//! forty lines of raw JSON. Spans default to zero; tests that care about
//! locations pin them with `at`.

use serde_json::{Value, json};
#[allow(non_upper_case_globals)]
use serde_json::Value::Null as null;

fn node(ty: &str, mut fields: serde_json::Map<String, Value>) -> Value {
    fields.insert("type".into(), Value::String(ty.into()));
    Value::Object(fields)
}

macro_rules! fields {
    ($($k:literal : $v:expr),* $(,)?) => {{
        let mut m = serde_json::Map::new();
        $(m.insert($k.to_string(), serde_json::json!($v));)*
        m
    }};
}

/// Pin a node's span: character offsets plus the start line/column.
pub fn at(value: &mut Value, start: u32, end: u32, line: u32, column: u32) {
    let obj = value.as_object_mut().expect("node must be an object");
    obj.insert("start".into(), json!(start));
    obj.insert("end".into(), json!(end));
    obj.insert(
        "loc".into(),
        json!({
            "start": {"line": line, "column": column},
            "end": {"line": line, "column": column + (end - start)},
        }),
    );
}

/// Same as `at`, returning the node for chaining in expression position.
pub fn spanned(mut value: Value, start: u32, end: u32, line: u32, column: u32) -> Value {
    at(&mut value, start, end, line, column);
    value
}

pub fn program(body: Vec<Value>) -> Value {
    node("Program", fields! {"body": body})
}

pub fn ident(name: &str) -> Value {
    node("Identifier", fields! {"name": name, "typeAnnotation": null})
}

pub fn ident_typed(name: &str, annotation: Value) -> Value {
    node(
        "Identifier",
        fields! {"name": name, "typeAnnotation": ty_ann(annotation)},
    )
}

pub fn num(value: f64) -> Value {
    node("NumericLiteral", fields! {"value": value})
}

pub fn str_lit(value: &str) -> Value {
    node("StringLiteral", fields! {"value": value})
}

pub fn bool_lit(value: bool) -> Value {
    node("BooleanLiteral", fields! {"value": value})
}

pub fn null_lit() -> Value {
    node("NullLiteral", fields! {})
}

pub fn expr_stmt(expression: Value) -> Value {
    node("ExpressionStatement", fields! {"expression": expression})
}

pub fn block(body: Vec<Value>) -> Value {
    node("BlockStatement", fields! {"body": body})
}

pub fn empty_stmt() -> Value {
    node("EmptyStatement", fields! {})
}

pub fn ret(argument: Option<Value>) -> Value {
    node("ReturnStatement", fields! {"argument": argument})
}

pub fn throw_stmt(argument: Value) -> Value {
    node("ThrowStatement", fields! {"argument": argument})
}

pub fn break_stmt() -> Value {
    node("BreakStatement", fields! {"label": null})
}

pub fn continue_stmt() -> Value {
    node("ContinueStatement", fields! {"label": null})
}

pub fn var_decl(kind: &str, declarations: Vec<Value>) -> Value {
    node(
        "VariableDeclaration",
        fields! {"kind": kind, "declarations": declarations},
    )
}

pub fn declarator(id: Value, init: Option<Value>) -> Value {
    node("VariableDeclarator", fields! {"id": id, "init": init})
}

pub fn if_stmt(test: Value, consequent: Value, alternate: Option<Value>) -> Value {
    node(
        "IfStatement",
        fields! {"test": test, "consequent": consequent, "alternate": alternate},
    )
}

pub fn while_stmt(test: Value, body: Value) -> Value {
    node("WhileStatement", fields! {"test": test, "body": body})
}

pub fn do_while_stmt(test: Value, body: Value) -> Value {
    node("DoWhileStatement", fields! {"test": test, "body": body})
}

pub fn for_stmt(
    init: Option<Value>,
    test: Option<Value>,
    update: Option<Value>,
    body: Value,
) -> Value {
    node(
        "ForStatement",
        fields! {"init": init, "test": test, "update": update, "body": body},
    )
}

pub fn for_of_stmt(left: Value, right: Value, body: Value) -> Value {
    node(
        "ForOfStatement",
        fields! {"left": left, "right": right, "body": body, "await": false},
    )
}

pub fn for_in_stmt(left: Value, right: Value, body: Value) -> Value {
    node(
        "ForInStatement",
        fields! {"left": left, "right": right, "body": body},
    )
}

pub fn switch_stmt(discriminant: Value, cases: Vec<Value>) -> Value {
    node(
        "SwitchStatement",
        fields! {"discriminant": discriminant, "cases": cases},
    )
}

pub fn switch_case(test: Option<Value>, consequent: Vec<Value>) -> Value {
    node(
        "SwitchCase",
        fields! {"test": test, "consequent": consequent},
    )
}

pub fn try_stmt(block_stmts: Vec<Value>, param: Value, handler_stmts: Vec<Value>) -> Value {
    node(
        "TryStatement",
        fields! {
            "block": block(block_stmts),
            "handler": node("CatchClause", fields! {"param": param, "body": block(handler_stmts)}),
            "finalizer": null,
        },
    )
}

pub fn call(callee: Value, arguments: Vec<Value>) -> Value {
    node(
        "CallExpression",
        fields! {"callee": callee, "arguments": arguments},
    )
}

pub fn new_expr(callee: Value, arguments: Vec<Value>) -> Value {
    node(
        "NewExpression",
        fields! {"callee": callee, "arguments": arguments},
    )
}

pub fn member(object: Value, property: Value, computed: bool) -> Value {
    node(
        "MemberExpression",
        fields! {"object": object, "property": property, "computed": computed},
    )
}

pub fn binary(op: &str, left: Value, right: Value) -> Value {
    node(
        "BinaryExpression",
        fields! {"operator": op, "left": left, "right": right},
    )
}

pub fn logical(op: &str, left: Value, right: Value) -> Value {
    node(
        "LogicalExpression",
        fields! {"operator": op, "left": left, "right": right},
    )
}

pub fn unary(op: &str, argument: Value) -> Value {
    node(
        "UnaryExpression",
        fields! {"operator": op, "argument": argument, "prefix": true},
    )
}

pub fn update(op: &str, argument: Value, prefix: bool) -> Value {
    node(
        "UpdateExpression",
        fields! {"operator": op, "argument": argument, "prefix": prefix},
    )
}

pub fn assign(op: &str, left: Value, right: Value) -> Value {
    node(
        "AssignmentExpression",
        fields! {"operator": op, "left": left, "right": right},
    )
}

pub fn cond_expr(test: Value, consequent: Value, alternate: Value) -> Value {
    node(
        "ConditionalExpression",
        fields! {"test": test, "consequent": consequent, "alternate": alternate},
    )
}

pub fn await_expr(argument: Value) -> Value {
    node("AwaitExpression", fields! {"argument": argument})
}

pub fn obj(properties: Vec<Value>) -> Value {
    node("ObjectExpression", fields! {"properties": properties})
}

pub fn prop(key: Value, value: Value) -> Value {
    node(
        "ObjectProperty",
        fields! {"key": key, "value": value, "shorthand": false, "computed": false},
    )
}

pub fn computed_prop(key: Value, value: Value) -> Value {
    node(
        "ObjectProperty",
        fields! {"key": key, "value": value, "shorthand": false, "computed": true},
    )
}

pub fn spread(argument: Value) -> Value {
    node("SpreadElement", fields! {"argument": argument})
}

pub fn arr(elements: Vec<Value>) -> Value {
    node("ArrayExpression", fields! {"elements": elements})
}

pub fn fn_decl(name: &str, params: Vec<Value>, body: Vec<Value>, is_async: bool) -> Value {
    node(
        "FunctionDeclaration",
        fields! {
            "id": ident(name),
            "params": params,
            "body": block(body),
            "async": is_async,
            "generator": false,
        },
    )
}

pub fn fn_expr(name: Option<&str>, params: Vec<Value>, body: Vec<Value>) -> Value {
    node(
        "FunctionExpression",
        fields! {
            "id": name.map(ident),
            "params": params,
            "body": block(body),
            "async": false,
            "generator": false,
        },
    )
}

/// Arrow function with an expression body.
pub fn arrow_expr(params: Vec<Value>, body: Value) -> Value {
    node(
        "ArrowFunctionExpression",
        fields! {
            "id": null,
            "params": params,
            "body": body,
            "async": false,
            "generator": false,
        },
    )
}

/// Arrow function with a block body.
pub fn arrow_block(params: Vec<Value>, body: Vec<Value>) -> Value {
    node(
        "ArrowFunctionExpression",
        fields! {
            "id": null,
            "params": params,
            "body": block(body),
            "async": false,
            "generator": false,
        },
    )
}

pub fn class_decl(name: &str, members: Vec<Value>) -> Value {
    node(
        "ClassDeclaration",
        fields! {
            "id": ident(name),
            "superClass": null,
            "body": node("ClassBody", fields! {"body": members}),
        },
    )
}

pub fn class_method(kind: &str, name: &str, params: Vec<Value>, body: Vec<Value>) -> Value {
    node(
        "ClassMethod",
        fields! {
            "kind": kind,
            "key": ident(name),
            "id": null,
            "params": params,
            "body": block(body),
            "async": false,
            "generator": false,
            "static": false,
            "computed": false,
        },
    )
}

pub fn import_decl(specifiers: Vec<Value>, source: &str) -> Value {
    node(
        "ImportDeclaration",
        fields! {"specifiers": specifiers, "source": str_lit(source)},
    )
}

pub fn import_spec(local: &str, imported: &str) -> Value {
    node(
        "ImportSpecifier",
        fields! {"local": ident(local), "imported": ident(imported)},
    )
}

pub fn import_default_spec(local: &str) -> Value {
    node("ImportDefaultSpecifier", fields! {"local": ident(local)})
}

pub fn export_named_decl(declaration: Value) -> Value {
    node(
        "ExportNamedDeclaration",
        fields! {"declaration": declaration, "specifiers": Vec::<Value>::new(), "source": null},
    )
}

pub fn export_specs(specifiers: Vec<Value>, source: Option<&str>) -> Value {
    node(
        "ExportNamedDeclaration",
        fields! {
            "declaration": null,
            "specifiers": specifiers,
            "source": source.map(str_lit),
        },
    )
}

pub fn export_spec(local: &str, exported: &str) -> Value {
    node(
        "ExportSpecifier",
        fields! {"local": ident(local), "exported": ident(exported)},
    )
}

pub fn export_default_decl(declaration: Value) -> Value {
    node(
        "ExportDefaultDeclaration",
        fields! {"declaration": declaration},
    )
}

// Type annotation builders

pub fn ty_ann(annotation: Value) -> Value {
    node("TypeAnnotation", fields! {"typeAnnotation": annotation})
}

pub fn number_ty() -> Value {
    node("NumberTypeAnnotation", fields! {})
}

pub fn string_ty() -> Value {
    node("StringTypeAnnotation", fields! {})
}

pub fn boolean_ty() -> Value {
    node("BooleanTypeAnnotation", fields! {})
}

pub fn nullable_ty(annotation: Value) -> Value {
    node(
        "NullableTypeAnnotation",
        fields! {"typeAnnotation": annotation},
    )
}

pub fn union_ty(types: Vec<Value>) -> Value {
    node("UnionTypeAnnotation", fields! {"types": types})
}

pub fn generic_ty(name: &str) -> Value {
    node(
        "GenericTypeAnnotation",
        fields! {"id": ident(name), "typeParameters": null},
    )
}

/// Function with a return type annotation.
pub fn fn_decl_with_return_type(
    name: &str,
    params: Vec<Value>,
    body: Vec<Value>,
    is_async: bool,
    return_type: Value,
) -> Value {
    node(
        "FunctionDeclaration",
        fields! {
            "id": ident(name),
            "params": params,
            "body": block(body),
            "async": is_async,
            "generator": false,
            "returnType": ty_ann(return_type),
        },
    )
}
