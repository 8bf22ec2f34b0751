//! Babel AST JSON → arena import.
//!
//! The parser front-end is external to the analyzer and hands back the
//! Babel/ESTree JSON for a whole module. This module turns that value into
//! an `AstArena`, checks that every node kind is one we model, and fixes up
//! parent links in a single pass at the end.

use crate::node::{
    AssignmentOp, AstArena, AstKind, BinaryOp, ClassData, FunctionData, FunctionFlags, LogicalOp,
    MethodKind, NodeId, UnaryOp, UpdateOp, VariableKind,
};
use crate::span::{SourcePosition, SourceSpan};
use serde_json::Value;

/// Failure to ingest parser output. This means the parser produced a shape
/// the analyzer does not model, which is an input fault, not a user error.
#[derive(Debug)]
pub struct ImportError {
    pub message: String,
}

impl ImportError {
    fn new(message: impl Into<String>) -> Self {
        ImportError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AST import failed: {}", self.message)
    }
}

impl std::error::Error for ImportError {}

type Result<T> = std::result::Result<T, ImportError>;

/// Import a Babel parse result (either the `File` wrapper or a bare
/// `Program`) into a fresh arena. Returns the arena and the `Root` node.
pub fn import_babel_ast(json: &Value) -> Result<(AstArena, NodeId)> {
    let program = match json.get("type").and_then(Value::as_str) {
        Some("File") => json
            .get("program")
            .ok_or_else(|| ImportError::new("File node without a program"))?,
        Some("Program") => json,
        other => {
            return Err(ImportError::new(format!(
                "expected File or Program at the top level, got {other:?}"
            )));
        }
    };

    let mut arena = AstArena::new();
    let body = import_node_list(&mut arena, program, "body")?;
    let root = arena.push(AstKind::Root { body }, span_of(program));
    arena.fixup_parents(root);
    Ok((arena, root))
}

fn span_of(node: &Value) -> SourceSpan {
    let offset = |field: &str| node.get(field).and_then(Value::as_u64).unwrap_or(0) as u32;
    let loc = |which: &str, field: &str| {
        node.get("loc")
            .and_then(|l| l.get(which))
            .and_then(|p| p.get(field))
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32
    };
    SourceSpan::new(
        SourcePosition::new(offset("start"), loc("start", "line"), loc("start", "column")),
        SourcePosition::new(offset("end"), loc("end", "line"), loc("end", "column")),
    )
}

fn str_field<'a>(node: &'a Value, field: &str) -> Result<&'a str> {
    node.get(field).and_then(Value::as_str).ok_or_else(|| {
        ImportError::new(format!(
            "missing string field \"{field}\" on {} node",
            node.get("type").and_then(Value::as_str).unwrap_or("?")
        ))
    })
}

fn bool_field(node: &Value, field: &str) -> bool {
    node.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn num_field(node: &Value, field: &str) -> f64 {
    node.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

fn import_child(arena: &mut AstArena, node: &Value, field: &str) -> Result<NodeId> {
    let child = node.get(field).filter(|v| !v.is_null()).ok_or_else(|| {
        ImportError::new(format!(
            "missing child \"{field}\" on {} node",
            node.get("type").and_then(Value::as_str).unwrap_or("?")
        ))
    })?;
    import_node(arena, child)
}

fn import_child_opt(arena: &mut AstArena, node: &Value, field: &str) -> Result<Option<NodeId>> {
    match node.get(field) {
        Some(v) if !v.is_null() => Ok(Some(import_node(arena, v)?)),
        _ => Ok(None),
    }
}

fn import_node_list(arena: &mut AstArena, node: &Value, field: &str) -> Result<Vec<NodeId>> {
    let Some(list) = node.get(field).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    list.iter().map(|v| import_node(arena, v)).collect()
}

/// Element lists that may contain holes (`[a, , b]`).
fn import_node_list_holes(
    arena: &mut AstArena,
    node: &Value,
    field: &str,
) -> Result<Vec<Option<NodeId>>> {
    let Some(list) = node.get(field).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    list.iter()
        .map(|v| {
            if v.is_null() {
                Ok(None)
            } else {
                import_node(arena, v).map(Some)
            }
        })
        .collect()
}

fn import_function(arena: &mut AstArena, node: &Value, is_method: bool) -> Result<FunctionData> {
    let mut flags = FunctionFlags::empty();
    if bool_field(node, "generator") {
        flags |= FunctionFlags::GENERATOR;
    }
    if bool_field(node, "async") {
        flags |= FunctionFlags::ASYNC;
    }
    if bool_field(node, "static") {
        flags |= FunctionFlags::STATIC;
    }
    if bool_field(node, "computed") {
        flags |= FunctionFlags::COMPUTED_KEY;
    }
    let body_is_expression = node
        .get("body")
        .and_then(|b| b.get("type"))
        .and_then(Value::as_str)
        .is_some_and(|t| t != "BlockStatement");
    if body_is_expression {
        flags |= FunctionFlags::EXPRESSION_BODY;
    }

    let method_kind = if is_method {
        match node.get("kind").and_then(Value::as_str) {
            Some("constructor") => MethodKind::Constructor,
            Some("get") => MethodKind::Get,
            Some("set") => MethodKind::Set,
            _ => MethodKind::Method,
        }
    } else {
        MethodKind::Method
    };

    Ok(FunctionData {
        id: import_child_opt(arena, node, "id")?,
        params: import_node_list(arena, node, "params")?,
        body: import_child(arena, node, "body")?,
        flags,
        return_type: import_child_opt(arena, node, "returnType")?,
        type_parameters: import_child_opt(arena, node, "typeParameters")?,
        key: if is_method {
            import_child_opt(arena, node, "key")?
        } else {
            None
        },
        method_kind,
    })
}

fn import_class(arena: &mut AstArena, node: &Value) -> Result<ClassData> {
    Ok(ClassData {
        id: import_child_opt(arena, node, "id")?,
        super_class: import_child_opt(arena, node, "superClass")?,
        body: import_child(arena, node, "body")?,
        type_parameters: import_child_opt(arena, node, "typeParameters")?,
    })
}

fn binary_op(op: &str) -> Result<BinaryOp> {
    Ok(match op {
        "==" => BinaryOp::Equal,
        "!=" => BinaryOp::NotEqual,
        "===" => BinaryOp::StrictEqual,
        "!==" => BinaryOp::StrictNotEqual,
        "<" => BinaryOp::Lesser,
        "<=" => BinaryOp::LesserOrEqual,
        ">" => BinaryOp::Greater,
        ">=" => BinaryOp::GreaterOrEqual,
        "<<" => BinaryOp::ShiftLeft,
        ">>" => BinaryOp::SignShiftRight,
        ">>>" => BinaryOp::ZeroingShiftRight,
        "+" => BinaryOp::Plus,
        "-" => BinaryOp::Minus,
        "*" => BinaryOp::Times,
        "/" => BinaryOp::Division,
        "%" => BinaryOp::Modulo,
        "|" => BinaryOp::BitwiseOr,
        "^" => BinaryOp::BitwiseXor,
        "&" => BinaryOp::BitwiseAnd,
        "in" => BinaryOp::In,
        "instanceof" => BinaryOp::Instanceof,
        other => return Err(ImportError::new(format!("unknown binary operator {other}"))),
    })
}

fn unary_op(op: &str) -> Result<UnaryOp> {
    Ok(match op {
        "-" => UnaryOp::Minus,
        "+" => UnaryOp::Plus,
        "!" => UnaryOp::LogicalNot,
        "~" => UnaryOp::BitwiseNot,
        "typeof" => UnaryOp::Typeof,
        "void" => UnaryOp::Void,
        "delete" => UnaryOp::Delete,
        "throw" => UnaryOp::Throw,
        other => return Err(ImportError::new(format!("unknown unary operator {other}"))),
    })
}

fn assignment_op(op: &str) -> Result<AssignmentOp> {
    Ok(match op {
        "=" => AssignmentOp::Equal,
        "+=" => AssignmentOp::PlusEqual,
        "-=" => AssignmentOp::MinusEqual,
        "*=" => AssignmentOp::TimesEqual,
        "/=" => AssignmentOp::SlashEqual,
        "%=" => AssignmentOp::ModuloEqual,
        "<<=" => AssignmentOp::LeftShiftEqual,
        ">>=" => AssignmentOp::SignRightShiftEqual,
        ">>>=" => AssignmentOp::ZeroingRightShiftEqual,
        "|=" => AssignmentOp::OrEqual,
        "^=" => AssignmentOp::XorEqual,
        "&=" => AssignmentOp::AndEqual,
        other => {
            return Err(ImportError::new(format!(
                "unknown assignment operator {other}"
            )));
        }
    })
}

fn logical_op(op: &str) -> Result<LogicalOp> {
    Ok(match op {
        "||" => LogicalOp::Or,
        "&&" => LogicalOp::And,
        "??" => LogicalOp::NullishCoalesce,
        other => {
            return Err(ImportError::new(format!(
                "unknown logical operator {other}"
            )));
        }
    })
}

fn import_node(arena: &mut AstArena, node: &Value) -> Result<NodeId> {
    let ty = node
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ImportError::new("AST node without a type tag"))?;
    let span = span_of(node);

    let kind = match ty {
        "Identifier" => AstKind::Identifier {
            name: str_field(node, "name")?.to_string(),
            type_annotation: import_child_opt(arena, node, "typeAnnotation")?,
        },
        "PrivateName" => {
            // Private names wrap an identifier; flatten to the identifier so
            // key lookups behave like public ones.
            return import_child(arena, node, "id");
        }
        "RegExpLiteral" => AstKind::RegExpLiteral {
            pattern: str_field(node, "pattern")?.to_string(),
            flags: node
                .get("flags")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        "NullLiteral" => AstKind::NullLiteral,
        "StringLiteral" => AstKind::StringLiteral {
            value: str_field(node, "value")?.to_string(),
        },
        "BooleanLiteral" => AstKind::BooleanLiteral {
            value: bool_field(node, "value"),
        },
        "NumericLiteral" => AstKind::NumericLiteral {
            value: num_field(node, "value"),
        },
        "TemplateLiteral" => AstKind::TemplateLiteral {
            quasis: import_node_list(arena, node, "quasis")?,
            expressions: import_node_list(arena, node, "expressions")?,
        },
        "TemplateElement" => AstKind::TemplateElement {
            raw: node
                .get("value")
                .and_then(|v| v.get("raw"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            tail: bool_field(node, "tail"),
        },
        "TaggedTemplateExpression" => AstKind::TaggedTemplateExpression {
            tag: import_child(arena, node, "tag")?,
            quasi: import_child(arena, node, "quasi")?,
        },
        "ObjectProperty" | "Property" => AstKind::ObjectProperty {
            key: import_child(arena, node, "key")?,
            value: import_child(arena, node, "value")?,
            shorthand: bool_field(node, "shorthand"),
            computed: bool_field(node, "computed"),
        },
        "ObjectMethod" => AstKind::ObjectMethod(import_function(arena, node, true)?),
        "ExpressionStatement" => AstKind::ExpressionStatement {
            expression: import_child(arena, node, "expression")?,
        },
        "BlockStatement" => AstKind::BlockStatement {
            body: import_node_list(arena, node, "body")?,
        },
        "EmptyStatement" => AstKind::EmptyStatement,
        "WithStatement" => AstKind::WithStatement {
            object: import_child(arena, node, "object")?,
            body: import_child(arena, node, "body")?,
        },
        "DebuggerStatement" => AstKind::DebuggerStatement,
        "ReturnStatement" => AstKind::ReturnStatement {
            argument: import_child_opt(arena, node, "argument")?,
        },
        "LabeledStatement" => AstKind::LabeledStatement {
            label: import_child(arena, node, "label")?,
            body: import_child(arena, node, "body")?,
        },
        "BreakStatement" => AstKind::BreakStatement {
            label: import_child_opt(arena, node, "label")?,
        },
        "ContinueStatement" => AstKind::ContinueStatement {
            label: import_child_opt(arena, node, "label")?,
        },
        "IfStatement" => AstKind::IfStatement {
            test: import_child(arena, node, "test")?,
            consequent: import_child(arena, node, "consequent")?,
            alternate: import_child_opt(arena, node, "alternate")?,
        },
        "SwitchStatement" => AstKind::SwitchStatement {
            discriminant: import_child(arena, node, "discriminant")?,
            cases: import_node_list(arena, node, "cases")?,
        },
        "SwitchCase" => AstKind::SwitchCase {
            test: import_child_opt(arena, node, "test")?,
            consequent: import_node_list(arena, node, "consequent")?,
        },
        "ThrowStatement" => AstKind::ThrowStatement {
            argument: import_child(arena, node, "argument")?,
        },
        "TryStatement" => AstKind::TryStatement {
            block: import_child(arena, node, "block")?,
            handler: import_child_opt(arena, node, "handler")?,
            finalizer: import_child_opt(arena, node, "finalizer")?,
        },
        "CatchClause" => AstKind::CatchClause {
            param: import_child_opt(arena, node, "param")?,
            body: import_child(arena, node, "body")?,
        },
        "WhileStatement" => AstKind::WhileStatement {
            test: import_child(arena, node, "test")?,
            body: import_child(arena, node, "body")?,
        },
        "DoWhileStatement" => AstKind::DoWhileStatement {
            test: import_child(arena, node, "test")?,
            body: import_child(arena, node, "body")?,
        },
        "ForStatement" => AstKind::ForStatement {
            init: import_child_opt(arena, node, "init")?,
            test: import_child_opt(arena, node, "test")?,
            update: import_child_opt(arena, node, "update")?,
            body: import_child(arena, node, "body")?,
        },
        "ForInStatement" => AstKind::ForInStatement {
            left: import_child(arena, node, "left")?,
            right: import_child(arena, node, "right")?,
            body: import_child(arena, node, "body")?,
        },
        "ForOfStatement" => AstKind::ForOfStatement {
            left: import_child(arena, node, "left")?,
            right: import_child(arena, node, "right")?,
            body: import_child(arena, node, "body")?,
            is_await: bool_field(node, "await"),
        },
        "Super" => AstKind::Super,
        "Import" => AstKind::Import,
        "ThisExpression" => AstKind::ThisExpression,
        "ArrowFunctionExpression" => {
            AstKind::ArrowFunctionExpression(import_function(arena, node, false)?)
        }
        "YieldExpression" => AstKind::YieldExpression {
            argument: import_child_opt(arena, node, "argument")?,
            delegate: bool_field(node, "delegate"),
        },
        "AwaitExpression" => AstKind::AwaitExpression {
            argument: import_child(arena, node, "argument")?,
        },
        "ArrayExpression" => AstKind::ArrayExpression {
            elements: import_node_list_holes(arena, node, "elements")?,
        },
        "ObjectExpression" => AstKind::ObjectExpression {
            properties: import_node_list(arena, node, "properties")?,
        },
        "ConditionalExpression" => AstKind::ConditionalExpression {
            test: import_child(arena, node, "test")?,
            consequent: import_child(arena, node, "consequent")?,
            alternate: import_child(arena, node, "alternate")?,
        },
        "FunctionExpression" => AstKind::FunctionExpression(import_function(arena, node, false)?),
        "UnaryExpression" => AstKind::UnaryExpression {
            argument: import_child(arena, node, "argument")?,
            op: unary_op(str_field(node, "operator")?)?,
            prefix: bool_field(node, "prefix"),
        },
        "UpdateExpression" => AstKind::UpdateExpression {
            argument: import_child(arena, node, "argument")?,
            op: match str_field(node, "operator")? {
                "++" => UpdateOp::Increment,
                "--" => UpdateOp::Decrement,
                other => {
                    return Err(ImportError::new(format!(
                        "unknown update operator {other}"
                    )));
                }
            },
            prefix: bool_field(node, "prefix"),
        },
        "BinaryExpression" => AstKind::BinaryExpression {
            left: import_child(arena, node, "left")?,
            right: import_child(arena, node, "right")?,
            op: binary_op(str_field(node, "operator")?)?,
        },
        "AssignmentExpression" => AstKind::AssignmentExpression {
            left: import_child(arena, node, "left")?,
            right: import_child(arena, node, "right")?,
            op: assignment_op(str_field(node, "operator")?)?,
        },
        "LogicalExpression" => AstKind::LogicalExpression {
            left: import_child(arena, node, "left")?,
            right: import_child(arena, node, "right")?,
            op: logical_op(str_field(node, "operator")?)?,
        },
        "MemberExpression" => AstKind::MemberExpression {
            object: import_child(arena, node, "object")?,
            property: import_child(arena, node, "property")?,
            computed: bool_field(node, "computed"),
        },
        "BindExpression" => AstKind::BindExpression {
            object: import_child_opt(arena, node, "object")?,
            callee: import_child(arena, node, "callee")?,
        },
        "CallExpression" => AstKind::CallExpression {
            callee: import_child(arena, node, "callee")?,
            arguments: import_node_list(arena, node, "arguments")?,
        },
        "NewExpression" => AstKind::NewExpression {
            callee: import_child(arena, node, "callee")?,
            arguments: import_node_list(arena, node, "arguments")?,
        },
        "SequenceExpression" => AstKind::SequenceExpression {
            expressions: import_node_list(arena, node, "expressions")?,
        },
        "DoExpression" => AstKind::DoExpression {
            body: import_child(arena, node, "body")?,
        },
        "ClassExpression" => AstKind::ClassExpression(import_class(arena, node)?),
        "ClassDeclaration" => AstKind::ClassDeclaration(import_class(arena, node)?),
        "ClassBody" => AstKind::ClassBody {
            body: import_node_list(arena, node, "body")?,
        },
        "ClassMethod" => AstKind::ClassMethod(import_function(arena, node, true)?),
        "ClassPrivateMethod" => AstKind::ClassPrivateMethod(import_function(arena, node, true)?),
        "ClassProperty" => AstKind::ClassProperty {
            key: import_child(arena, node, "key")?,
            value: import_child_opt(arena, node, "value")?,
            type_annotation: import_child_opt(arena, node, "typeAnnotation")?,
            is_static: bool_field(node, "static"),
            computed: bool_field(node, "computed"),
        },
        "ClassPrivateProperty" => AstKind::ClassPrivateProperty {
            key: import_child(arena, node, "key")?,
            value: import_child_opt(arena, node, "value")?,
            is_static: bool_field(node, "static"),
        },
        "FunctionDeclaration" => {
            AstKind::FunctionDeclaration(import_function(arena, node, false)?)
        }
        "VariableDeclaration" => AstKind::VariableDeclaration {
            declarations: import_node_list(arena, node, "declarations")?,
            kind: match str_field(node, "kind")? {
                "var" => VariableKind::Var,
                "let" => VariableKind::Let,
                "const" => VariableKind::Const,
                other => {
                    return Err(ImportError::new(format!(
                        "unknown variable declaration kind {other}"
                    )));
                }
            },
        },
        "VariableDeclarator" => AstKind::VariableDeclarator {
            id: import_child(arena, node, "id")?,
            init: import_child_opt(arena, node, "init")?,
        },
        "SpreadElement" | "SpreadProperty" => AstKind::SpreadElement {
            argument: import_child(arena, node, "argument")?,
        },
        "ObjectPattern" => AstKind::ObjectPattern {
            properties: import_node_list(arena, node, "properties")?,
        },
        "ArrayPattern" => AstKind::ArrayPattern {
            elements: import_node_list_holes(arena, node, "elements")?,
        },
        "AssignmentPattern" => AstKind::AssignmentPattern {
            left: import_child(arena, node, "left")?,
            right: import_child(arena, node, "right")?,
        },
        "RestElement" | "RestProperty" => AstKind::RestElement {
            argument: import_child(arena, node, "argument")?,
        },
        "MetaProperty" => AstKind::MetaProperty {
            meta: import_child(arena, node, "meta")?,
            property: import_child(arena, node, "property")?,
        },
        "ImportDeclaration" => AstKind::ImportDeclaration {
            specifiers: import_node_list(arena, node, "specifiers")?,
            source: import_child(arena, node, "source")?,
        },
        "ImportSpecifier" => AstKind::ImportSpecifier {
            local: import_child(arena, node, "local")?,
            imported: import_child(arena, node, "imported")?,
        },
        "ImportDefaultSpecifier" => AstKind::ImportDefaultSpecifier {
            local: import_child(arena, node, "local")?,
        },
        "ImportNamespaceSpecifier" => AstKind::ImportNamespaceSpecifier {
            local: import_child(arena, node, "local")?,
        },
        "ExportNamedDeclaration" => AstKind::ExportNamedDeclaration {
            declaration: import_child_opt(arena, node, "declaration")?,
            source: import_child_opt(arena, node, "source")?,
            specifiers: import_node_list(arena, node, "specifiers")?,
        },
        "ExportDefaultDeclaration" => AstKind::ExportDefaultDeclaration {
            declaration: import_child(arena, node, "declaration")?,
        },
        "ExportAllDeclaration" => AstKind::ExportAllDeclaration {
            source: import_child(arena, node, "source")?,
        },
        "ExportSpecifier" => AstKind::ExportSpecifier {
            local: import_child(arena, node, "local")?,
            exported: import_child(arena, node, "exported")?,
        },
        "ExportDefaultSpecifier" => AstKind::ExportDefaultSpecifier {
            exported: import_child(arena, node, "exported")?,
        },
        "TypeAnnotation" => AstKind::TypeAnnotation {
            annotation: import_child(arena, node, "typeAnnotation")?,
        },
        "TypeAlias" => AstKind::TypeAlias {
            id: import_child(arena, node, "id")?,
            type_parameters: import_child_opt(arena, node, "typeParameters")?,
            right: import_child(arena, node, "right")?,
        },
        "InterfaceDeclaration" => AstKind::InterfaceDeclaration {
            id: import_child(arena, node, "id")?,
            type_parameters: import_child_opt(arena, node, "typeParameters")?,
            extends: import_node_list(arena, node, "extends")?,
            mixins: import_node_list(arena, node, "mixins")?,
            body: import_child(arena, node, "body")?,
        },
        "TypeParameterDeclaration" => AstKind::TypeParameterDeclaration {
            params: import_node_list(arena, node, "params")?,
        },
        "TypeParameter" => {
            // The parameter's name arrives as a bare string; synthesize an
            // identifier node so scoping can bind uses to it.
            let name = str_field(node, "name")?.to_string();
            let name_id = arena.push(
                AstKind::Identifier {
                    name,
                    type_annotation: None,
                },
                span,
            );
            AstKind::TypeParameter { name: name_id }
        }
        "FunctionTypeAnnotation" => AstKind::FunctionTypeAnnotation {
            params: import_node_list(arena, node, "params")?,
            rest: import_child_opt(arena, node, "rest")?,
            return_type: import_child(arena, node, "returnType")?,
            type_parameters: import_child_opt(arena, node, "typeParameters")?,
        },
        "FunctionTypeParam" => AstKind::FunctionTypeParam {
            name: import_child_opt(arena, node, "name")?,
            type_annotation: import_child(arena, node, "typeAnnotation")?,
            optional: bool_field(node, "optional"),
        },
        "ObjectTypeAnnotation" => AstKind::ObjectTypeAnnotation {
            properties: import_node_list(arena, node, "properties")?,
            exact: bool_field(node, "exact"),
        },
        "ObjectTypeProperty" => AstKind::ObjectTypeProperty {
            key: import_child(arena, node, "key")?,
            value: import_child(arena, node, "value")?,
            optional: bool_field(node, "optional"),
        },
        "ObjectTypeSpreadProperty" => AstKind::ObjectTypeSpreadProperty {
            argument: import_child(arena, node, "argument")?,
        },
        "ObjectTypeIndexer" => AstKind::ObjectTypeIndexer {
            id: import_child_opt(arena, node, "id")?,
            key: import_child(arena, node, "key")?,
            value: import_child(arena, node, "value")?,
        },
        "GenericTypeAnnotation" => AstKind::GenericTypeAnnotation {
            id: import_child(arena, node, "id")?,
            type_parameters: import_child_opt(arena, node, "typeParameters")?,
        },
        "QualifiedTypeIdentifier" => AstKind::QualifiedTypeIdentifier {
            qualification: import_child(arena, node, "qualification")?,
            id: import_child(arena, node, "id")?,
        },
        "NullableTypeAnnotation" => AstKind::NullableTypeAnnotation {
            annotation: import_child(arena, node, "typeAnnotation")?,
        },
        "UnionTypeAnnotation" => AstKind::UnionTypeAnnotation {
            types: import_node_list(arena, node, "types")?,
        },
        "AnyTypeAnnotation" | "MixedTypeAnnotation" | "ExistsTypeAnnotation" => {
            AstKind::AnyTypeAnnotation
        }
        "VoidTypeAnnotation" => AstKind::VoidTypeAnnotation,
        "NumberTypeAnnotation" => AstKind::NumberTypeAnnotation,
        "StringTypeAnnotation" => AstKind::StringTypeAnnotation,
        "BooleanTypeAnnotation" => AstKind::BooleanTypeAnnotation,
        "NullLiteralTypeAnnotation" => AstKind::NullLiteralTypeAnnotation,
        "NumberLiteralTypeAnnotation" => AstKind::NumberLiteralTypeAnnotation {
            value: num_field(node, "value"),
        },
        "StringLiteralTypeAnnotation" => AstKind::StringLiteralTypeAnnotation {
            value: str_field(node, "value")?.to_string(),
        },
        "BooleanLiteralTypeAnnotation" => AstKind::BooleanLiteralTypeAnnotation {
            value: bool_field(node, "value"),
        },
        "TypeCastExpression" => AstKind::TypeCastExpression {
            expression: import_child(arena, node, "expression")?,
            type_annotation: import_child(arena, node, "typeAnnotation")?,
        },
        other => {
            return Err(ImportError::new(format!("unhandled AST node kind {other}")));
        }
    };

    Ok(arena.push(kind, span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::walk::walk;

    #[test]
    fn parents_point_back_at_their_referrers() {
        let program = testing::program(vec![testing::fn_decl(
            "f",
            vec![testing::ident("x")],
            vec![testing::ret(Some(testing::binary(
                "+",
                testing::ident("x"),
                testing::num(1.0),
            )))],
            false,
        )]);
        let (arena, root) = import_babel_ast(&program).unwrap();

        assert!(arena.parent(root).is_none());
        let mut checked = 0;
        walk(&arena, root, |id| {
            let mut children = Vec::new();
            arena.for_each_child(id, |c| children.push(c));
            for child in children {
                assert_eq!(arena.parent(child), Some(id));
                checked += 1;
            }
        });
        assert!(checked > 5);
    }

    #[test]
    fn unknown_node_kinds_are_an_import_error() {
        let program = testing::program(vec![serde_json::json!({"type": "JSXElement"})]);
        let err = import_babel_ast(&program).unwrap_err();
        assert!(err.message.contains("JSXElement"));
    }

    #[test]
    fn spans_carry_offsets_and_line_info() {
        let mut id = testing::ident("x");
        testing::at(&mut id, 4, 5, 2, 0);
        let program = testing::program(vec![testing::expr_stmt(id)]);
        let (arena, root) = import_babel_ast(&program).unwrap();

        let mut span = None;
        walk(&arena, root, |n| {
            if arena.identifier_name(n) == Some("x") {
                span = Some(arena.span(n));
            }
        });
        let span = span.unwrap();
        assert_eq!(span.start.offset, 4);
        assert_eq!(span.end.offset, 5);
        assert_eq!(span.start.line, 2);
    }
}
