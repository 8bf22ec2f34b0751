//! Lazy type resolution over graphs and annotations.
//!
//! `resolve_node_type` walks a graph node's inputs on demand and memoizes
//! the answer per node in the module's write-once table. Annotation ASTs
//! resolve to lattice values through cross-module declaration resolution,
//! and function return types synthesize from every `Return` feeding the
//! graph's `End`.

use indexmap::IndexMap;
use nodelint_ast::{AstKind, MethodKind, NodeId, queries};
use nodelint_common::reporting;
use nodelint_graph::{Graph, GraphNodeId, GraphNodeKind};
use nodelint_module::{Module, ModuleHost};
use nodelint_resolver::resolve_this_expression;
use nodelint_types::{ClassShape, FunctionShape, FunctionTypeData, TypeInfo};
use std::path::Path;

pub struct TypeResolver<'a> {
    host: &'a ModuleHost,
}

impl<'a> TypeResolver<'a> {
    pub fn new(host: &'a ModuleHost) -> Self {
        TypeResolver { host }
    }

    /// The type of one graph node, memoized per node.
    pub fn resolve_node_type(&self, module: &Module, graph: &Graph, node: GraphNodeId) -> TypeInfo {
        if let Some(cached) = module.cached_node_type(graph.fun, node) {
            return cached;
        }
        let ty = self.resolve_node_type_uncached(module, graph, node);
        module.cache_node_type(graph.fun, node, ty)
    }

    fn resolve_node_type_uncached(
        &self,
        module: &Module,
        graph: &Graph,
        node_id: GraphNodeId,
    ) -> TypeInfo {
        let node = graph.node(node_id);
        match node.kind {
            GraphNodeKind::Literal => node
                .ast
                .map_or_else(TypeInfo::make_unknown, |ast| {
                    self.resolve_ast_node_type(module, ast)
                }),
            GraphNodeKind::LoadValue => self.resolve_load_value(module, graph, node_id),
            GraphNodeKind::Call => {
                let callee = self.resolve_node_type(module, graph, node.input(0));
                match callee.as_function().and_then(|f| self.function_shape(f)) {
                    Some(shape) => shape.return_type.clone(),
                    None => TypeInfo::make_unknown(),
                }
            }
            GraphNodeKind::NewCall => {
                let callee = self.resolve_node_type(module, graph, node.input(0));
                if let Some(class) = callee.as_class() {
                    // The instance exposes the class's merged property map.
                    // Not strict until constructor analysis exists.
                    let shape = self.class_shape_of(class, module);
                    return TypeInfo::make_object(shape.properties, false);
                }
                // Calling new on a plain function builds some object; which
                // fields the constructor defines is not tracked.
                TypeInfo::make_object(IndexMap::new(), false)
            }
            GraphNodeKind::Function => node
                .ast
                .map_or_else(TypeInfo::make_unknown, |ast| {
                    TypeInfo::make_function_def(module.def_site(ast))
                }),
            GraphNodeKind::ObjectLiteral => self.resolve_object_literal(module, graph, node_id),
            GraphNodeKind::LoadNamedProperty => {
                let object = self.resolve_node_type(module, graph, node.input(0));
                let Some(object) = object.as_object() else {
                    return TypeInfo::make_unknown();
                };
                let Some(name) = node.ast.and_then(|ast| module.arena().identifier_name(ast))
                else {
                    return TypeInfo::make_unknown();
                };
                match object.properties.get(name) {
                    Some(ty) => ty.clone(),
                    None if object.strict => TypeInfo::make_undefined(),
                    None => TypeInfo::make_unknown(),
                }
            }
            GraphNodeKind::StoreNamedProperty => {
                let object = self.resolve_node_type(module, graph, node.input(0));
                let Some(object) = object.as_object() else {
                    return TypeInfo::make_unknown();
                };
                let Some(name) = node.ast.and_then(|ast| module.arena().identifier_name(ast))
                else {
                    return TypeInfo::make_unknown();
                };
                let mut properties = object.properties.clone();
                let strict = object.strict;
                let value = self.resolve_node_type(module, graph, node.input(1));
                properties.insert(name.to_string(), value);
                TypeInfo::make_object(properties, strict)
            }
            GraphNodeKind::Return => {
                let mut ty = if node.input_count() > 0 {
                    self.resolve_node_type(module, graph, node.input(0))
                } else {
                    TypeInfo::make_undefined()
                };
                if graph.is_async && ty.as_promise().is_none() {
                    ty = TypeInfo::make_promise(ty);
                }
                ty
            }
            GraphNodeKind::Await => {
                let input = self.resolve_node_type(module, graph, node.input(0));
                match input.as_promise() {
                    Some(promise) => promise.nested.clone(),
                    None => input,
                }
            }
            GraphNodeKind::PrepareException => {
                self.resolve_node_type(module, graph, node.input(0))
            }
            GraphNodeKind::CatchException => self.resolve_catch_type(module, graph, node_id),
            GraphNodeKind::This => self.resolve_this_type(module, node_id, graph),
            _ => TypeInfo::make_unknown(),
        }
    }

    fn resolve_load_value(&self, module: &Module, graph: &Graph, node_id: GraphNodeId) -> TypeInfo {
        let Some(ast) = graph.node(node_id).ast else {
            return TypeInfo::make_unknown();
        };
        let Some((decl_module, decl)) = self.host.resolve_declaration(module, ast) else {
            return TypeInfo::make_unknown();
        };
        let arena = decl_module.arena();
        if queries::is_function_node(arena, decl) {
            return TypeInfo::make_function_def(decl_module.def_site(decl));
        }
        if matches!(
            arena.kind(decl),
            AstKind::ClassDeclaration(_) | AstKind::ClassExpression(_)
        ) {
            return TypeInfo::make_class(decl_module.class_type_data(decl));
        }
        // A parameter of the function under analysis carries its
        // annotation. Node ids are only comparable within one arena, so
        // this applies to same-module declarations only.
        if std::ptr::eq(decl_module, module) {
            if let AstKind::Identifier {
                type_annotation: Some(annotation),
                ..
            } = arena.kind(decl)
            {
                if arena.parent(decl) == Some(graph.fun) {
                    if let AstKind::TypeAnnotation { annotation } = arena.kind(*annotation) {
                        return self.resolve_annotation_type(decl_module, *annotation);
                    }
                }
            }
        }
        TypeInfo::make_unknown()
    }

    fn resolve_object_literal(
        &self,
        module: &Module,
        graph: &Graph,
        node_id: GraphNodeId,
    ) -> TypeInfo {
        let arena = module.arena();
        let mut properties: IndexMap<String, TypeInfo> = IndexMap::new();
        let mut strict = true;

        for n in 0..graph.node(node_id).input_count() {
            let input_id = graph.node(node_id).input(n);
            let input = graph.node(input_id);
            let mut prop_keys_known = true;

            match input.kind {
                GraphNodeKind::ObjectProperty => {
                    let value = self.resolve_node_type(module, graph, input.input(0));
                    if input.input_count() == 1 {
                        // Static key, readable straight off the AST.
                        let key = input.ast.and_then(|ast| match arena.kind(ast) {
                            AstKind::ObjectProperty { key, .. } => Some(*key),
                            _ => None,
                        });
                        let key_str = key.and_then(|key| match arena.kind(key) {
                            AstKind::Identifier { name, .. } => Some(name.clone()),
                            AstKind::StringLiteral { value } => Some(value.clone()),
                            AstKind::NumericLiteral { value } => Some(format_numeric_key(*value)),
                            _ => None,
                        });
                        match key_str {
                            Some(key_str) => {
                                properties.insert(key_str, value);
                            }
                            None => prop_keys_known = false,
                        }
                    } else {
                        // Computed key: usable when it resolves to a string
                        // literal.
                        let key_type = self.resolve_node_type(module, graph, input.input(1));
                        match key_type.as_string_literal() {
                            Some(key_str) => {
                                properties.insert(key_str.to_string(), value);
                            }
                            None => prop_keys_known = false,
                        }
                    }
                }
                GraphNodeKind::Spread => {
                    let spread = self.resolve_node_type(module, graph, input.input(0));
                    match spread.as_object() {
                        Some(object) => {
                            strict &= object.strict;
                            for (key, value) in &object.properties {
                                properties.insert(key.clone(), value.clone());
                            }
                        }
                        None => prop_keys_known = false,
                    }
                }
                other => {
                    reporting::trace(
                        graph.node(node_id).ast.map(|a| module.location_of(a)).as_ref(),
                        &format!("Cannot resolve type of {} in object literal", other.name()),
                    );
                    prop_keys_known = false;
                }
            }

            if !prop_keys_known {
                // An unresolvable key may overwrite anything already
                // assembled; every earlier property type is now suspect.
                for (_, value) in properties.iter_mut() {
                    *value = TypeInfo::make_unknown();
                }
            }
            strict &= prop_keys_known;
        }

        TypeInfo::make_object(properties, strict)
    }

    /// The union of everything thrown into this catch.
    fn resolve_catch_type(&self, module: &Module, graph: &Graph, node_id: GraphNodeId) -> TypeInfo {
        let mut types: Vec<TypeInfo> = Vec::new();
        for n in 0..graph.node(node_id).prev_count() {
            let prev = graph.node(node_id).prev(n);
            if graph.node(prev).kind != GraphNodeKind::PrepareException {
                continue;
            }
            let ty = self.resolve_node_type(module, graph, prev);
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        match types.len() {
            0 => TypeInfo::make_unknown(),
            1 => types.swap_remove(0),
            _ => TypeInfo::make_sum(types),
        }
    }

    fn resolve_this_type(&self, module: &Module, node_id: GraphNodeId, graph: &Graph) -> TypeInfo {
        let Some(ast) = graph.node(node_id).ast else {
            return TypeInfo::make_unknown();
        };
        let Some(class) = resolve_this_expression(module.arena(), ast) else {
            return TypeInfo::make_unknown();
        };
        let class_data = module.class_type_data(class);
        let shape = self.class_shape_of(&class_data, module);
        TypeInfo::make_object(shape.properties, false)
    }

    /// The lattice value of a literal or function AST node.
    pub fn resolve_ast_node_type(&self, module: &Module, node: NodeId) -> TypeInfo {
        let arena = module.arena();
        match arena.kind(node) {
            AstKind::TypeAnnotation { annotation } => {
                self.resolve_annotation_type(module, *annotation)
            }
            AstKind::NullLiteral => TypeInfo::make_null(),
            AstKind::NumericLiteral { .. } => TypeInfo::make_number(),
            AstKind::StringLiteral { value } => TypeInfo::make_string_literal(value.clone()),
            AstKind::BooleanLiteral { .. } => TypeInfo::make_boolean(),
            _ if queries::is_function_node(arena, node) => {
                TypeInfo::make_function_def(module.def_site(node))
            }
            other => {
                reporting::trace(
                    Some(&module.location_of(node)),
                    &format!("Failed to resolve AST literal type: {}", other.name()),
                );
                TypeInfo::make_unknown()
            }
        }
    }

    /// Resolve a type-annotation AST to a lattice value.
    pub fn resolve_annotation_type(&self, module: &Module, node: NodeId) -> TypeInfo {
        let arena = module.arena();
        match arena.kind(node) {
            AstKind::AnyTypeAnnotation => TypeInfo::make_unknown(),
            AstKind::VoidTypeAnnotation => TypeInfo::make_undefined(),
            AstKind::NullLiteralTypeAnnotation => TypeInfo::make_null(),
            AstKind::NumberLiteralTypeAnnotation { .. } | AstKind::NumberTypeAnnotation => {
                TypeInfo::make_number()
            }
            AstKind::StringLiteralTypeAnnotation { .. } | AstKind::StringTypeAnnotation => {
                TypeInfo::make_string()
            }
            AstKind::BooleanLiteralTypeAnnotation { .. } | AstKind::BooleanTypeAnnotation => {
                TypeInfo::make_boolean()
            }
            AstKind::NullableTypeAnnotation { annotation } => TypeInfo::make_sum(vec![
                TypeInfo::make_null(),
                self.resolve_annotation_type(module, *annotation),
            ]),
            AstKind::UnionTypeAnnotation { types } => {
                let elements = types
                    .clone()
                    .into_iter()
                    .map(|t| self.resolve_annotation_type(module, t))
                    .collect();
                TypeInfo::make_sum(elements)
            }
            AstKind::GenericTypeAnnotation { id, .. } => {
                self.resolve_generic_annotation(module, node, *id)
            }
            AstKind::ObjectTypeAnnotation { .. } => {
                self.resolve_object_annotation(module, node)
            }
            AstKind::FunctionTypeAnnotation { .. } => {
                self.resolve_function_annotation(module, node)
            }
            other => {
                reporting::trace(
                    Some(&module.location_of(node)),
                    &format!("Failed to resolve AST annotation type: {}", other.name()),
                );
                TypeInfo::make_unknown()
            }
        }
    }

    fn resolve_generic_annotation(
        &self,
        module: &Module,
        node: NodeId,
        id: NodeId,
    ) -> TypeInfo {
        if module.arena().identifier_name(id).is_none() {
            reporting::trace(
                Some(&module.location_of(node)),
                "Cannot resolve a qualified generic annotation",
            );
            return TypeInfo::make_unknown();
        }
        let Some((decl_module, decl)) = self.host.resolve_declaration(module, id) else {
            return TypeInfo::make_unknown();
        };
        let arena = decl_module.arena();
        match arena.kind(decl) {
            AstKind::ClassDeclaration(_) | AstKind::ClassExpression(_) => {
                let data = decl_module.class_type_data(decl);
                let shape = self.class_shape_of(&data, decl_module);
                TypeInfo::make_object(shape.properties, shape.strict)
            }
            AstKind::InterfaceDeclaration {
                type_parameters,
                extends,
                mixins,
                body,
                ..
            } => {
                if type_parameters.is_some() {
                    reporting::trace(
                        Some(&module.location_of(node)),
                        "Unsupported type parameters in interface type annotation",
                    );
                    return TypeInfo::make_unknown();
                }
                if !extends.is_empty() || !mixins.is_empty() {
                    reporting::trace(
                        Some(&module.location_of(node)),
                        "Unsupported extends or mixins in interface type annotation",
                    );
                    return TypeInfo::make_unknown();
                }
                self.resolve_object_annotation(decl_module, *body)
            }
            AstKind::TypeAlias { right, .. } => self.resolve_annotation_type(decl_module, *right),
            other => {
                reporting::trace(
                    Some(&module.location_of(node)),
                    &format!("Failed to resolve AST generic annotation type: {}", other.name()),
                );
                TypeInfo::make_unknown()
            }
        }
    }

    fn resolve_object_annotation(&self, module: &Module, node: NodeId) -> TypeInfo {
        let arena = module.arena();
        let AstKind::ObjectTypeAnnotation { properties, exact } = arena.kind(node) else {
            return TypeInfo::make_unknown();
        };
        let mut strict = *exact;
        let mut props: IndexMap<String, TypeInfo> = IndexMap::new();
        for prop in properties.clone() {
            match arena.kind(prop) {
                AstKind::ObjectTypeSpreadProperty { .. } => {
                    reporting::trace(
                        Some(&module.location_of(node)),
                        "Unsupported spread in object type annotation",
                    );
                    return TypeInfo::make_unknown();
                }
                AstKind::ObjectTypeProperty {
                    key,
                    value,
                    optional,
                } => {
                    if *optional {
                        // An optional field may be absent entirely; the
                        // closed-set claim no longer holds.
                        reporting::trace(
                            Some(&module.location_of(prop)),
                            "Ignoring optional object type annotation field",
                        );
                        strict = false;
                        continue;
                    }
                    let Some(name) = arena.identifier_name(*key) else {
                        strict = false;
                        continue;
                    };
                    let value = self.resolve_annotation_type(module, *value);
                    props.insert(name.to_string(), value);
                }
                other => {
                    reporting::trace(
                        Some(&module.location_of(prop)),
                        &format!("Unhandled {} in object type annotation", other.name()),
                    );
                    strict = false;
                }
            }
        }
        TypeInfo::make_object(props, strict)
    }

    fn resolve_function_annotation(&self, module: &Module, node: NodeId) -> TypeInfo {
        let arena = module.arena();
        let AstKind::FunctionTypeAnnotation {
            params,
            rest,
            return_type,
            ..
        } = arena.kind(node)
        else {
            return TypeInfo::make_unknown();
        };
        if rest.is_some() {
            // Rest parameter annotations are not modeled.
            return TypeInfo::make_unknown();
        }
        let mut argument_types = Vec::with_capacity(params.len());
        for param in params.clone() {
            let AstKind::FunctionTypeParam {
                type_annotation, ..
            } = arena.kind(param)
            else {
                argument_types.push(TypeInfo::make_unknown());
                continue;
            };
            argument_types.push(self.resolve_annotation_type(module, *type_annotation));
        }
        let return_type = self.resolve_annotation_type(module, *return_type);
        TypeInfo::make_function(argument_types, return_type, false)
    }

    /// Force a function payload's shape, computing it from the definition
    /// if needed. `None` when the shape is already being computed (a
    /// self-recursive return type).
    pub fn function_shape<'b>(&self, data: &'b FunctionTypeData) -> Option<&'b FunctionShape> {
        if let Some(shape) = data.shape() {
            return Some(shape);
        }
        let def = data.def.clone()?;
        data.force(|| {
            let Some(module) = self.host.module(Path::new(def.module.as_ref())) else {
                return FunctionShape::default();
            };
            self.compute_function_shape(module, def.node)
        })
    }

    fn compute_function_shape(&self, module: &Module, fun: NodeId) -> FunctionShape {
        let arena = module.arena();
        let Some(data) = arena.function_data(fun) else {
            return FunctionShape::default();
        };

        let mut argument_types = Vec::with_capacity(data.params.len());
        for &param in &data.params {
            let ty = match arena.kind(param) {
                AstKind::Identifier {
                    type_annotation: Some(annotation),
                    ..
                } => match arena.kind(*annotation) {
                    AstKind::TypeAnnotation { annotation } => {
                        self.resolve_annotation_type(module, *annotation)
                    }
                    _ => TypeInfo::make_unknown(),
                },
                AstKind::Identifier { .. } => TypeInfo::make_unknown(),
                _ => {
                    reporting::trace(None, "Cannot handle non-identifier parameter type");
                    TypeInfo::make_unknown()
                }
            };
            argument_types.push(ty);
        }

        let variadic = data
            .params
            .last()
            .is_some_and(|&p| matches!(arena.kind(p), AstKind::RestElement { .. }));

        let return_type = match data.return_type {
            Some(annotation) => {
                let mut ty = match arena.kind(annotation) {
                    AstKind::TypeAnnotation { annotation } => {
                        self.resolve_annotation_type(module, *annotation)
                    }
                    _ => self.resolve_annotation_type(module, annotation),
                };
                if data.is_async() {
                    ty = TypeInfo::make_promise(ty);
                }
                ty
            }
            None => self.resolve_return_type(module, fun),
        };

        FunctionShape {
            argument_types,
            return_type,
            variadic,
        }
    }

    /// Synthesize a function's return type from the `Return` nodes feeding
    /// its graph's `End`.
    pub fn resolve_return_type(&self, module: &Module, fun: NodeId) -> TypeInfo {
        let is_async = module
            .arena()
            .function_data(fun)
            .is_some_and(nodelint_ast::FunctionData::is_async);
        let Some(graph) = module.function_graph(fun) else {
            return if is_async {
                TypeInfo::make_promise(TypeInfo::make_unknown())
            } else {
                TypeInfo::make_unknown()
            };
        };
        // A graph without an End at all never returns.
        let Some(end) = graph.end_node() else {
            return TypeInfo::make_unknown();
        };

        let mut types: Vec<TypeInfo> = Vec::new();
        for n in 0..graph.node(end).prev_count() {
            let exit = graph.node(end).prev(n);
            let ty = match graph.node(exit).kind {
                GraphNodeKind::Return => self.resolve_node_type(module, &graph, exit),
                // Exiting by throwing is not a return type.
                GraphNodeKind::Throw => continue,
                _ => {
                    // A fall-through exit conceptually returns undefined.
                    let undefined = TypeInfo::make_undefined();
                    if is_async {
                        TypeInfo::make_promise(undefined)
                    } else {
                        undefined
                    }
                }
            };
            if !types.contains(&ty) {
                types.push(ty);
            }
        }

        match types.len() {
            // The function may never return; that is not "returns undefined".
            0 => TypeInfo::make_unknown(),
            1 => types.swap_remove(0),
            _ => TypeInfo::make_sum(types),
        }
    }

    /// Force a class payload's shape: methods become function types,
    /// getters contribute their return type, setters their single argument
    /// type, and plain fields their annotation or initializer type.
    pub fn class_shape_of(
        &self,
        data: &nodelint_types::ClassTypeData,
        fallback_module: &Module,
    ) -> ClassShape {
        if let Some(shape) = data.shape() {
            return shape.clone();
        }
        let Some(def) = data.def.clone() else {
            return ClassShape::default();
        };
        let module = self
            .host
            .module(Path::new(def.module.as_ref()))
            .unwrap_or(fallback_module);
        data.force(|| self.compute_class_shape(module, def.node))
            .cloned()
            .unwrap_or_default()
    }

    fn compute_class_shape(&self, module: &Module, class_node: NodeId) -> ClassShape {
        let arena = module.arena();
        let Some(class) = arena.class_data(class_node) else {
            return ClassShape::default();
        };
        let AstKind::ClassBody { body } = arena.kind(class.body) else {
            return ClassShape::default();
        };

        let mut properties: IndexMap<String, TypeInfo> = IndexMap::new();
        for &member in body {
            match arena.kind(member) {
                AstKind::ClassMethod(m) | AstKind::ClassPrivateMethod(m) => {
                    let Some(name) = m
                        .key
                        .and_then(|k| arena.identifier_name(k))
                        .map(str::to_string)
                    else {
                        continue;
                    };
                    let method_type = TypeInfo::make_function_def(module.def_site(member));
                    let ty = match m.method_kind {
                        MethodKind::Method | MethodKind::Constructor => method_type,
                        MethodKind::Get => {
                            let shape = method_type
                                .as_function()
                                .and_then(|f| self.function_shape(f));
                            shape.map_or_else(TypeInfo::make_unknown, |s| s.return_type.clone())
                        }
                        MethodKind::Set => {
                            let shape = method_type
                                .as_function()
                                .and_then(|f| self.function_shape(f));
                            shape
                                .and_then(|s| s.argument_types.first().cloned())
                                .unwrap_or_else(TypeInfo::make_unknown)
                        }
                    };
                    properties.insert(name, ty);
                }
                AstKind::ClassProperty {
                    key,
                    value,
                    type_annotation,
                    ..
                } => {
                    let Some(name) = arena.identifier_name(*key).map(str::to_string) else {
                        continue;
                    };
                    let ty = if let Some(annotation) = type_annotation {
                        self.resolve_ast_node_type(module, *annotation)
                    } else if let Some(value) = value {
                        self.resolve_ast_node_type(module, *value)
                    } else {
                        TypeInfo::make_unknown()
                    };
                    properties.insert(name, ty);
                }
                AstKind::ClassPrivateProperty { key, value, .. } => {
                    let Some(name) = arena.identifier_name(*key).map(str::to_string) else {
                        continue;
                    };
                    let ty = value.map_or_else(TypeInfo::make_unknown, |v| {
                        self.resolve_ast_node_type(module, v)
                    });
                    properties.insert(name, ty);
                }
                _ => {}
            }
        }

        // Constructors and inherited members can add fields this walk does
        // not see; the property set is never claimed complete.
        ClassShape {
            properties,
            strict: false,
        }
    }
}

fn format_numeric_key(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
