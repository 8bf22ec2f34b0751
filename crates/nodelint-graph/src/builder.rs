//! AST → graph lowering.
//!
//! One `GraphBuilder` per function body. Statement handlers take the
//! current block and return the block where lowering continues; a handler
//! that diverges (return/throw/break/continue) marks its block filled and
//! later statements land in fresh successor blocks. Loops and switches
//! collect the blocks ended by `break`/`continue` in per-construct frames
//! and wire them up when the construct closes; `throw` connects to the
//! innermost `CatchException` through the catch stack.

use crate::graph::{Graph, GraphNode, GraphNodeId, GraphNodeKind};
use nodelint_ast::{AssignmentOp, AstArena, AstKind, NodeId};
use rustc_hash::FxHashMap;
use tracing::debug;

/// A construct the builder cannot lower. The function's graph is simply
/// absent; analysis continues with the passes that do not need it.
#[derive(Debug, Clone)]
pub struct GraphBuildError {
    pub message: String,
    pub node: Option<NodeId>,
}

impl GraphBuildError {
    fn new(message: impl Into<String>, node: Option<NodeId>) -> Self {
        GraphBuildError {
            message: message.into(),
            node,
        }
    }
}

impl std::fmt::Display for GraphBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GraphBuildError {}

/// A `break`/`continue` with no enclosing construct. Reported by the
/// caller as an error diagnostic on the analyzed code.
#[derive(Debug, Clone)]
pub struct OrphanJump {
    pub node: NodeId,
    pub message: &'static str,
}

type BuildResult<T> = Result<T, GraphBuildError>;

pub struct GraphBuilder<'a> {
    arena: &'a AstArena,
    /// Identifier use → declaration, from lexical resolution.
    resolved: &'a FxHashMap<NodeId, NodeId>,
    body: NodeId,
    graph: Graph,
    /// `CatchException` nodes able to catch a throw here, innermost last.
    catch_stack: Vec<GraphNodeId>,
    /// Blocks ended by `break`, one frame per enclosing loop/switch.
    pending_break_blocks: Vec<Vec<u16>>,
    /// Blocks ended by `continue`, one frame per enclosing loop.
    pending_continue_blocks: Vec<Vec<u16>>,
    undefined_node: GraphNodeId,
    orphan_jumps: Vec<OrphanJump>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        arena: &'a AstArena,
        resolved: &'a FxHashMap<NodeId, NodeId>,
        fun: NodeId,
    ) -> BuildResult<Self> {
        let data = arena
            .function_data(fun)
            .ok_or_else(|| GraphBuildError::new("graph builder needs a function node", Some(fun)))?;
        Ok(GraphBuilder {
            arena,
            resolved,
            body: data.body,
            graph: Graph::new(fun, data.is_async()),
            catch_stack: Vec::new(),
            pending_break_blocks: Vec::new(),
            pending_continue_blocks: Vec::new(),
            undefined_node: 0,
            orphan_jumps: Vec::new(),
        })
    }

    /// Lower the whole function body and validate the result.
    pub fn build(mut self) -> BuildResult<(Graph, Vec<OrphanJump>)> {
        // TODO: predeclare parameters as Argument nodes in the start block
        // instead of lowering every read to LoadValue.
        let body = self.body;
        let block = self.process_ast_node(0, body)?;
        if !matches!(self.arena.kind(body), AstKind::BlockStatement { .. }) {
            // Arrow expression bodies return their value implicitly.
            let newest = self.graph.block(block).newest();
            let next = self.graph.block(block).next();
            self.graph.block_add_node_with_prev(
                block,
                GraphNode::with_input(GraphNodeKind::Return, newest, None),
                next,
            );
        }

        let mut leaves: Vec<GraphNodeId> = Vec::new();
        for i in 0..self.graph.len() {
            let node = self.graph.node(i);
            if node.prev_count() > 0 && node.next_count() == 0 {
                // Stray jumps mean a construct forgot to tie up its frame.
                assert!(
                    !matches!(
                        node.kind,
                        GraphNodeKind::Break
                            | GraphNodeKind::Continue
                            | GraphNodeKind::PrepareException
                    ),
                    "untied {} node at end of graph build",
                    node.kind.name()
                );
                leaves.push(i);
            }
            if node.kind == GraphNodeKind::Phi && node.input_count() == 0 {
                return Err(GraphBuildError::new(
                    "phi without operands after sealing",
                    node.ast,
                ));
            }
            for n in 0..node.input_count() {
                if node.input(n) == 0 {
                    // Reached through a use of a binding before any write
                    // on some path; give up on this function.
                    return Err(GraphBuildError::new(
                        "value flows from a binding with no reaching write",
                        node.ast,
                    ));
                }
            }
        }
        if leaves.is_empty() && self.graph.len() == 1 {
            leaves.push(0);
        }
        // A function can have no exit control flow at all,
        // e.g. "do { continue; } while (0)".
        if !leaves.is_empty() {
            self.graph
                .add_node_with_prevs(GraphNode::new(GraphNodeKind::End, None), &leaves);
        }

        for i in 0..self.graph.block_count() {
            assert!(
                self.graph.block(i).is_sealed(),
                "graph built but block {i} is not sealed"
            );
        }
        assert!(self.pending_break_blocks.is_empty());
        assert!(self.pending_continue_blocks.is_empty());

        Ok((self.graph, self.orphan_jumps))
    }

    fn unsupported(&self, node: NodeId, what: &str) -> GraphBuildError {
        debug!(kind = what, "graph builder cannot lower this construct");
        GraphBuildError::new(format!("graph builder cannot handle {what}"), Some(node))
    }

    fn undefined_node(&mut self) -> GraphNodeId {
        if self.undefined_node == 0 {
            self.undefined_node = self
                .graph
                .block_add_node(0, GraphNode::new(GraphNodeKind::Undefined, None), false);
        }
        self.undefined_node
    }

    fn resolved_decl(&self, id: NodeId) -> Option<NodeId> {
        self.resolved.get(&id).copied()
    }

    /// True iff `decl` is declared inside this function's body (and is thus
    /// tracked as an SSA variable rather than a LoadValue/StoreValue).
    fn is_local_decl(&self, decl: Option<NodeId>) -> bool {
        decl.is_some_and(|d| self.arena.is_self_or_ancestor(d, self.body))
    }

    fn newest(&self, block: u16) -> GraphNodeId {
        self.graph.block(block).newest()
    }

    fn next(&self, block: u16) -> GraphNodeId {
        self.graph.block(block).next()
    }

    fn add_control(&mut self, block: u16, node: GraphNode) -> GraphNodeId {
        let next = self.next(block);
        self.graph.block_add_node_with_prev(block, node, next)
    }

    /// Lower one AST node; returns the block where lowering continues.
    fn process_ast_node(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        match self.arena.kind(node) {
            AstKind::EmptyStatement => Ok(block),
            AstKind::BlockStatement { body } => self.process_block_statement(block, &body.clone()),
            AstKind::FunctionDeclaration(_)
            | AstKind::FunctionExpression(_)
            | AstKind::ArrowFunctionExpression(_)
            | AstKind::ClassMethod(_)
            | AstKind::ClassPrivateMethod(_)
            | AstKind::ObjectMethod(_) => self.process_function_node(block, node),
            AstKind::ReturnStatement { argument } => {
                let argument = *argument;
                let block = if let Some(arg) = argument {
                    let b = self.process_ast_node(block, arg)?;
                    let newest = self.newest(b);
                    self.add_control(b, GraphNode::with_input(GraphNodeKind::Return, newest, None));
                    b
                } else {
                    self.add_control(block, GraphNode::new(GraphNodeKind::Return, None));
                    block
                };
                self.graph.block_set_filled(block);
                Ok(block)
            }
            AstKind::BreakStatement { label } => {
                self.process_break_statement(block, node, label.is_some())
            }
            AstKind::ContinueStatement { label } => {
                self.process_continue_statement(block, node, label.is_some())
            }
            AstKind::AwaitExpression { argument } => {
                let block = self.process_ast_node(block, *argument)?;
                let newest = self.newest(block);
                self.add_control(
                    block,
                    GraphNode::with_input(GraphNodeKind::Await, newest, Some(node)),
                );
                Ok(block)
            }
            AstKind::ExpressionStatement { expression } => {
                self.process_ast_node(block, *expression)
            }
            AstKind::UnaryExpression { argument, .. } => {
                let block = self.process_ast_node(block, *argument)?;
                let newest = self.newest(block);
                self.graph.block_add_node(
                    block,
                    GraphNode::with_input(GraphNodeKind::UnaryOperator, newest, Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::BinaryExpression { left, right, .. }
            | AstKind::LogicalExpression { left, right, .. } => {
                let (left, right) = (*left, *right);
                let block = self.process_ast_node(block, left)?;
                let l = self.newest(block);
                let block = self.process_ast_node(block, right)?;
                let r = self.newest(block);
                self.graph.block_add_node(
                    block,
                    GraphNode::with_inputs(GraphNodeKind::BinaryOperator, [l, r], Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::UpdateExpression { argument, .. } => {
                self.process_update_expression(block, node, *argument)
            }
            AstKind::MemberExpression { .. } => self.process_member_expression(block, node),
            AstKind::AssignmentExpression { .. } => self.process_assignment_expression(block, node),
            AstKind::CallExpression { .. } | AstKind::NewExpression { .. } => {
                self.process_call_expression(block, node)
            }
            AstKind::ArrayExpression { elements } => {
                let elements = elements.clone();
                let mut block = block;
                let mut elem_nodes = Vec::with_capacity(elements.len());
                for elem in elements {
                    match elem {
                        Some(elem) => block = self.process_ast_node(block, elem)?,
                        None => {
                            let undef = self.undefined_node();
                            self.graph.block_set_newest(block, undef);
                        }
                    }
                    elem_nodes.push(self.newest(block));
                }
                self.graph.block_add_node(
                    block,
                    GraphNode::with_inputs(GraphNodeKind::ArrayLiteral, elem_nodes, Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::ObjectExpression { properties } => {
                let properties = properties.clone();
                let mut block = block;
                let mut prop_nodes = Vec::with_capacity(properties.len());
                for prop in properties {
                    block = self.process_ast_node(block, prop)?;
                    prop_nodes.push(self.newest(block));
                }
                self.graph.block_add_node(
                    block,
                    GraphNode::with_inputs(GraphNodeKind::ObjectLiteral, prop_nodes, Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::ObjectProperty { .. } => self.process_object_property(block, node),
            AstKind::SpreadElement { argument } => {
                let block = self.process_ast_node(block, *argument)?;
                let newest = self.newest(block);
                self.graph.block_add_node(
                    block,
                    GraphNode::with_input(GraphNodeKind::Spread, newest, Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::NullLiteral
            | AstKind::NumericLiteral { .. }
            | AstKind::BooleanLiteral { .. }
            | AstKind::StringLiteral { .. }
            | AstKind::RegExpLiteral { .. } => {
                self.graph.block_add_node(
                    block,
                    GraphNode::new(GraphNodeKind::Literal, Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::ThisExpression => {
                self.graph.block_add_node(
                    block,
                    GraphNode::new(GraphNodeKind::This, Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::Super => {
                self.graph.block_add_node(
                    block,
                    GraphNode::new(GraphNodeKind::Super, Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::TemplateLiteral { expressions, .. } => {
                let expressions = expressions.clone();
                let mut block = block;
                let mut inputs = Vec::with_capacity(expressions.len());
                for expr in expressions {
                    block = self.process_ast_node(block, expr)?;
                    inputs.push(self.newest(block));
                }
                self.graph.block_add_node(
                    block,
                    GraphNode::with_inputs(GraphNodeKind::TemplateLiteral, inputs, Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::VariableDeclaration { .. } => {
                self.process_variable_declaration(block, node)
            }
            AstKind::Identifier { .. } => self.process_identifier_node(block, node),
            AstKind::IfStatement { .. } => self.process_if_statement(block, node),
            AstKind::WhileStatement { .. } => self.process_while_statement(block, node),
            AstKind::DoWhileStatement { .. } => self.process_do_while_statement(block, node),
            AstKind::ForStatement { .. } => self.process_for_statement(block, node),
            AstKind::ForOfStatement { .. } => self.process_for_of_statement(block, node),
            AstKind::ConditionalExpression { .. } => {
                self.process_conditional_expression(block, node)
            }
            AstKind::ThrowStatement { argument } => {
                self.process_throw_statement(block, node, *argument)
            }
            AstKind::TryStatement { .. } => self.process_try_statement(block, node),
            AstKind::TypeCastExpression { expression, .. } => {
                let block = self.process_ast_node(block, *expression)?;
                let newest = self.newest(block);
                self.graph.block_add_node(
                    block,
                    GraphNode::with_input(GraphNodeKind::TypeCast, newest, Some(node)),
                    false,
                );
                Ok(block)
            }
            AstKind::SwitchStatement { .. } => self.process_switch_statement(block, node),
            other => Err(self.unsupported(node, other.name())),
        }
    }

    fn process_block_statement(&mut self, mut block: u16, body: &[NodeId]) -> BuildResult<u16> {
        // Hoisting first: inner function declarations and var bindings are
        // visible before their textual position.
        for &child in body {
            if nodelint_ast::queries::is_function_node(self.arena, child) {
                self.hoist_function_node(block, child);
            } else if matches!(
                self.arena.kind(child),
                AstKind::VariableDeclaration { .. }
            ) {
                self.hoist_variable_declaration(block, child);
            }
        }
        for &child in body {
            block = self.process_ast_node(block, child)?;
            if matches!(
                self.arena.kind(child),
                AstKind::ReturnStatement { .. } | AstKind::ThrowStatement { .. }
            ) {
                break;
            }
            if self.graph.block(block).is_filled() {
                // Anything further is unreachable.
                break;
            }
        }
        Ok(block)
    }

    fn hoist_function_node(&mut self, block: u16, node: NodeId) {
        self.add_control(block, GraphNode::new(GraphNodeKind::Function, Some(node)));
        let data = self.arena.function_data(node).expect("checked by caller");
        if let Some(id) = data.id {
            if matches!(
                self.arena.kind(node),
                AstKind::FunctionExpression(_) | AstKind::FunctionDeclaration(_)
            ) {
                let decl = self.resolved_decl(id).unwrap_or(id);
                let newest = self.newest(block);
                self.graph.write_variable(block, decl, newest);
            }
        }
    }

    /// Predeclare `var` bindings as undefined in the start block; the value
    /// is rewritten when the declarator itself is reached.
    fn hoist_variable_declaration(&mut self, block: u16, node: NodeId) {
        let AstKind::VariableDeclaration {
            declarations,
            kind: nodelint_ast::VariableKind::Var,
        } = self.arena.kind(node)
        else {
            return;
        };
        let declarations = declarations.clone();
        let undef = self.undefined_node();
        let start_block = if block != 0 { 0 } else { block };
        for declarator in declarations {
            if let AstKind::VariableDeclarator { id, .. } = self.arena.kind(declarator) {
                let decl = self.resolved_decl(*id).unwrap_or(*id);
                self.graph.write_variable(start_block, decl, undef);
            }
        }
    }

    fn process_function_node(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let data = self.arena.function_data(node).expect("function kinds only");
        // Hoisting may have already declared this function.
        if let Some(id) = data.id {
            let decl = self.resolved_decl(id).unwrap_or(id);
            if let Some(existing) = self.graph.read_variable(block, decl) {
                self.graph.block_set_newest(block, existing);
                return Ok(block);
            }
        }
        let is_named_binding = data.id.is_some()
            && matches!(
                self.arena.kind(node),
                AstKind::FunctionExpression(_) | AstKind::FunctionDeclaration(_)
            );
        let id = data.id;
        self.add_control(block, GraphNode::new(GraphNodeKind::Function, Some(node)));
        if is_named_binding {
            let id = id.expect("checked above");
            let decl = self.resolved_decl(id).unwrap_or(id);
            let newest = self.newest(block);
            self.graph.write_variable(block, decl, newest);
        }
        Ok(block)
    }

    fn process_identifier_node(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let decl = self.resolved_decl(node);
        if let Some(decl) = decl {
            if let Some(existing) = self.graph.read_variable(block, decl) {
                self.graph.block_set_newest(block, existing);
                return Ok(block);
            }
            if self.is_local_decl(Some(decl)) {
                // Not local to this basic block; run global value numbering.
                let value = self.graph.read_nonlocal_variable(block, decl);
                if value == 0 {
                    return Err(GraphBuildError::new(
                        "read of a binding with no reaching write",
                        Some(node),
                    ));
                }
                self.graph.block_set_newest(block, value);
                return Ok(block);
            }
        }
        // Free or closure-captured: an explicit load.
        self.add_control(block, GraphNode::new(GraphNodeKind::LoadValue, Some(node)));
        Ok(block)
    }

    fn process_assignment_expression(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::AssignmentExpression { left, right, op } = self.arena.kind(node) else {
            unreachable!("caller matched the kind");
        };
        let (left, right, op) = (*left, *right, *op);

        match self.arena.kind(left) {
            AstKind::Identifier { .. } => {
                let mut block = block;
                if op == AssignmentOp::Equal {
                    block = self.process_ast_node(block, right)?;
                } else {
                    block = self.process_ast_node(block, left)?;
                    let left_value = self.newest(block);
                    block = self.process_ast_node(block, right)?;
                    let right_value = self.newest(block);
                    self.graph.block_add_node(
                        block,
                        GraphNode::with_inputs(
                            GraphNodeKind::BinaryOperator,
                            [left_value, right_value],
                            Some(node),
                        ),
                        false,
                    );
                }
                let value = self.newest(block);
                let decl = self.resolved_decl(left);
                if self.is_local_decl(decl) {
                    self.graph
                        .write_variable(block, decl.expect("local implies resolved"), value);
                } else {
                    self.add_control(
                        block,
                        GraphNode::with_input(GraphNodeKind::StoreValue, value, Some(left)),
                    );
                }
                Ok(block)
            }
            AstKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                let (object, property, computed) = (*object, *property, *computed);
                let mut block = self.process_ast_node(block, object)?;
                let object_value = self.newest(block);

                if computed {
                    block = self.process_ast_node(block, property)?;
                    let prop_value = self.newest(block);
                    block = self.process_ast_node(block, right)?;
                    let value = self.newest(block);
                    self.add_control(
                        block,
                        GraphNode::with_inputs(
                            GraphNodeKind::StoreProperty,
                            [object_value, prop_value, value],
                            Some(property),
                        ),
                    );
                } else {
                    if self.arena.identifier_name(property).is_none() {
                        return Err(self.unsupported(node, "non-identifier member store"));
                    }
                    block = self.process_ast_node(block, right)?;
                    let value = self.newest(block);
                    self.add_control(
                        block,
                        GraphNode::with_inputs(
                            GraphNodeKind::StoreNamedProperty,
                            [object_value, value],
                            Some(property),
                        ),
                    );
                }
                Ok(block)
            }
            other => Err(self.unsupported(node, &format!("assignment to {}", other.name()))),
        }
    }

    fn process_call_expression(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let (callee, arguments, is_new) = match self.arena.kind(node) {
            AstKind::CallExpression { callee, arguments } => {
                (*callee, arguments.clone(), false)
            }
            AstKind::NewExpression { callee, arguments } => (*callee, arguments.clone(), true),
            _ => unreachable!("caller matched the kind"),
        };
        let mut block = self.process_ast_node(block, callee)?;
        let mut inputs = vec![self.newest(block)];
        for arg in arguments {
            block = self.process_ast_node(block, arg)?;
            inputs.push(self.newest(block));
        }
        let kind = if is_new {
            GraphNodeKind::NewCall
        } else {
            GraphNodeKind::Call
        };
        self.add_control(block, GraphNode::with_inputs(kind, inputs, Some(node)));
        Ok(block)
    }

    fn process_object_property(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::ObjectProperty {
            key,
            value,
            computed,
            ..
        } = self.arena.kind(node)
        else {
            unreachable!("caller matched the kind");
        };
        let (key, value, computed) = (*key, *value, *computed);
        if computed {
            let block = self.process_ast_node(block, key)?;
            let key_node = self.newest(block);
            let block = self.process_ast_node(block, value)?;
            let value_node = self.newest(block);
            self.graph.block_add_node(
                block,
                GraphNode::with_inputs(
                    GraphNodeKind::ObjectProperty,
                    [value_node, key_node],
                    Some(node),
                ),
                false,
            );
            Ok(block)
        } else {
            if !matches!(
                self.arena.kind(key),
                AstKind::Identifier { .. }
                    | AstKind::StringLiteral { .. }
                    | AstKind::NumericLiteral { .. }
            ) {
                return Err(self.unsupported(node, "object property key"));
            }
            let block = self.process_ast_node(block, value)?;
            let value_node = self.newest(block);
            self.graph.block_add_node(
                block,
                GraphNode::with_input(GraphNodeKind::ObjectProperty, value_node, Some(node)),
                false,
            );
            Ok(block)
        }
    }

    fn process_variable_declaration(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::VariableDeclaration { declarations, .. } = self.arena.kind(node) else {
            unreachable!("caller matched the kind");
        };
        let declarations = declarations.clone();
        let mut block = block;
        for declarator in declarations {
            let AstKind::VariableDeclarator { id, init } = self.arena.kind(declarator) else {
                continue;
            };
            let (id, init) = (*id, *init);
            if let Some(init) = init {
                block = self.process_ast_node(block, init)?;
                match self.arena.kind(id) {
                    AstKind::Identifier { .. } => {
                        let newest = self.newest(block);
                        self.graph.write_variable(block, id, newest);
                    }
                    AstKind::ObjectPattern { .. } => {
                        let newest = self.newest(block);
                        block = self.process_object_pattern(block, id, newest)?;
                    }
                    other => {
                        return Err(self.unsupported(
                            node,
                            &format!("declaration with {} left-hand side", other.name()),
                        ));
                    }
                }
            } else {
                let undef = self.undefined_node();
                self.graph.write_variable(block, id, undef);
            }
        }
        Ok(block)
    }

    /// Destructure `object` into the bindings of an object pattern, loading
    /// each property off the object value.
    fn process_object_pattern(
        &mut self,
        mut block: u16,
        pattern: NodeId,
        object: GraphNodeId,
    ) -> BuildResult<u16> {
        let AstKind::ObjectPattern { properties } = self.arena.kind(pattern) else {
            unreachable!("caller matched the kind");
        };
        for prop in properties.clone() {
            let AstKind::ObjectProperty {
                key,
                value,
                computed,
                ..
            } = self.arena.kind(prop)
            else {
                return Err(self.unsupported(
                    pattern,
                    &format!("{} in object pattern", self.arena.kind(prop).name()),
                ));
            };
            let (key, value, computed) = (*key, *value, *computed);
            if computed {
                block = self.process_ast_node(block, key)?;
                let key_value = self.newest(block);
                self.add_control(
                    block,
                    GraphNode::with_inputs(
                        GraphNodeKind::LoadProperty,
                        [object, key_value],
                        Some(prop),
                    ),
                );
            } else {
                if self.arena.identifier_name(key).is_none() {
                    return Err(self.unsupported(prop, "object pattern key"));
                }
                self.add_control(
                    block,
                    GraphNode::with_input(GraphNodeKind::LoadNamedProperty, object, Some(key)),
                );
            }
            let loaded = self.newest(block);

            match self.arena.kind(value) {
                AstKind::Identifier { .. } => {
                    self.graph.write_variable(block, value, loaded);
                }
                AstKind::ObjectPattern { .. } => {
                    block = self.process_object_pattern(block, value, loaded)?;
                }
                other => {
                    return Err(self.unsupported(
                        prop,
                        &format!("{} as object pattern value", other.name()),
                    ));
                }
            }
        }
        Ok(block)
    }

    fn process_member_expression(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::MemberExpression {
            object,
            property,
            computed,
        } = self.arena.kind(node)
        else {
            unreachable!("caller matched the kind");
        };
        let (object, property, computed) = (*object, *property, *computed);
        let mut block = self.process_ast_node(block, object)?;
        let object_value = self.newest(block);

        if computed {
            block = self.process_ast_node(block, property)?;
            let prop_value = self.newest(block);
            self.add_control(
                block,
                GraphNode::with_inputs(
                    GraphNodeKind::LoadProperty,
                    [object_value, prop_value],
                    Some(property),
                ),
            );
        } else {
            if self.arena.identifier_name(property).is_none() {
                return Err(self.unsupported(node, "non-identifier member access"));
            }
            self.add_control(
                block,
                GraphNode::with_input(GraphNodeKind::LoadNamedProperty, object_value, Some(property)),
            );
        }
        Ok(block)
    }

    fn process_update_expression(
        &mut self,
        block: u16,
        node: NodeId,
        argument: NodeId,
    ) -> BuildResult<u16> {
        // Prefix/postfix is ignored: it does not change any type, and the
        // node result is expected to be the variable's new value.
        match self.arena.kind(argument) {
            AstKind::Identifier { .. } => {
                let block = self.process_ast_node(block, argument)?;
                let arg_value = self.newest(block);
                self.graph.block_add_node(
                    block,
                    GraphNode::with_input(GraphNodeKind::UnaryOperator, arg_value, Some(node)),
                    false,
                );
                let value = self.newest(block);

                let decl = self.resolved_decl(argument);
                if self.is_local_decl(decl) {
                    self.graph
                        .write_variable(block, decl.expect("local implies resolved"), value);
                } else {
                    self.add_control(
                        block,
                        GraphNode::with_input(GraphNodeKind::StoreValue, value, Some(argument)),
                    );
                }
                Ok(block)
            }
            AstKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                let (object, property, computed) = (*object, *property, *computed);
                let mut block = self.process_ast_node(block, object)?;
                let object_value = self.newest(block);

                if computed {
                    block = self.process_ast_node(block, property)?;
                    let arg_value = self.newest(block);
                    self.graph.block_add_node(
                        block,
                        GraphNode::with_input(GraphNodeKind::UnaryOperator, arg_value, Some(node)),
                        false,
                    );
                    let value = self.newest(block);
                    self.add_control(
                        block,
                        GraphNode::with_inputs(
                            GraphNodeKind::StoreProperty,
                            [object_value, arg_value, value],
                            Some(property),
                        ),
                    );
                } else {
                    if self.arena.identifier_name(property).is_none() {
                        return Err(self.unsupported(node, "non-identifier member update"));
                    }
                    self.add_control(
                        block,
                        GraphNode::with_input(
                            GraphNodeKind::LoadNamedProperty,
                            object_value,
                            Some(property),
                        ),
                    );
                    let arg_value = self.newest(block);
                    self.graph.block_add_node(
                        block,
                        GraphNode::with_input(GraphNodeKind::UnaryOperator, arg_value, Some(node)),
                        false,
                    );
                    let value = self.newest(block);
                    self.add_control(
                        block,
                        GraphNode::with_inputs(
                            GraphNodeKind::StoreNamedProperty,
                            [object_value, value],
                            Some(property),
                        ),
                    );
                }
                Ok(block)
            }
            _ => Err(self.unsupported(node, "complex update expression target")),
        }
    }

    fn process_if_statement(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::IfStatement {
            test,
            consequent,
            alternate,
        } = self.arena.kind(node)
        else {
            unreachable!("caller matched the kind");
        };
        let (test, consequent_ast, alternate_ast) = (*test, *consequent, *alternate);

        let block = self.process_ast_node(block, test)?;
        let test_value = self.newest(block);
        self.add_control(block, GraphNode::with_input(GraphNodeKind::If, test_value, None));
        let prev_node = self.next(block);
        let prev_block = block;
        let mut merge_prevs = Vec::new();
        let mut merge_prev_blocks = Vec::new();

        let consequent = self.graph.add_basic_block(vec![prev_block]);
        self.graph.seal_block(consequent);
        self.graph.block_add_node_with_prev(
            consequent,
            GraphNode::new(GraphNodeKind::IfTrue, None),
            prev_node,
        );
        let consequent = self.process_ast_node(consequent, consequent_ast)?;
        if !self.graph.block(consequent).is_filled() {
            merge_prevs.push(self.next(consequent));
            merge_prev_blocks.push(consequent);
        }

        let mut alternate = self.graph.add_basic_block(vec![prev_block]);
        self.graph.seal_block(alternate);
        self.graph.block_add_node_with_prev(
            alternate,
            GraphNode::new(GraphNodeKind::IfFalse, None),
            prev_node,
        );
        if let Some(alternate_ast) = alternate_ast {
            alternate = self.process_ast_node(alternate, alternate_ast)?;
        }
        if !self.graph.block(alternate).is_filled() {
            merge_prevs.push(self.next(alternate));
            merge_prev_blocks.push(alternate);
        }

        let merge_block = self.graph.add_basic_block(merge_prev_blocks);
        if !merge_prevs.is_empty() {
            self.graph.block_add_node_with_prevs(
                merge_block,
                GraphNode::new(GraphNodeKind::Merge, None),
                &merge_prevs,
            );
            self.graph.seal_block(merge_block);
        } else {
            // Both sides diverged; the fall-through is unreachable.
            self.graph.seal_block(merge_block);
            self.graph.block_set_filled(merge_block);
        }
        Ok(merge_block)
    }

    /// Wire every pending continue block of the innermost frame into the
    /// loop header's merge, then seal the header.
    fn tie_continues_and_seal_header(&mut self, header_block: u16, header_merge: GraphNodeId) {
        let frame = self
            .pending_continue_blocks
            .pop()
            .expect("loop pushed a continue frame");
        for continue_block in frame {
            let jump = self.next(continue_block);
            self.graph.node_mut(jump).add_next(header_merge);
            self.graph.node_mut(header_merge).add_prev(jump);
            self.graph.block_add_prev(header_block, continue_block);
        }
        self.graph.seal_block(header_block);
    }

    /// Collect the innermost break frame into merge predecessor lists.
    fn collect_breaks(
        &mut self,
        merge_prevs: &mut Vec<GraphNodeId>,
        merge_prev_blocks: &mut Vec<u16>,
    ) {
        let frame = self
            .pending_break_blocks
            .pop()
            .expect("construct pushed a break frame");
        for break_block in frame {
            merge_prev_blocks.push(break_block);
            merge_prevs.push(self.next(break_block));
        }
    }

    fn process_while_statement(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::WhileStatement { test, body } = self.arena.kind(node) else {
            unreachable!("caller matched the kind");
        };
        let (test, body_ast) = (*test, *body);

        // Loop header: a merge fed by the entry edge and the back edges.
        let prev_node = self.next(block);
        let header_start = self.graph.add_basic_block(vec![block]);
        let header_merge = self.graph.block_add_node_with_prev(
            header_start,
            GraphNode::new(GraphNodeKind::Merge, None),
            prev_node,
        );
        let header_end = self.process_ast_node(header_start, test)?;
        let test_value = self.newest(header_end);
        let header_loop = self.add_control(
            header_end,
            GraphNode::with_input(GraphNodeKind::Loop, test_value, None),
        );

        self.pending_break_blocks.push(Vec::new());
        self.pending_continue_blocks.push(Vec::new());
        let body = self.graph.add_basic_block(vec![header_end]);
        self.graph.seal_block(body);
        self.graph
            .block_add_node_with_prev(body, GraphNode::new(GraphNodeKind::IfTrue, None), header_loop);
        let body = self.process_ast_node(body, body_ast)?;
        if !self.graph.block(body).is_filled() {
            // Body jumps back to the loop header (unless it diverged).
            let tail = self.next(body);
            self.graph.node_mut(tail).add_next(header_merge);
            self.graph.node_mut(header_merge).add_prev(tail);
            self.graph.block_add_prev(header_start, body);
        }

        self.tie_continues_and_seal_header(header_start, header_merge);

        let exit_block = self.graph.add_basic_block(vec![header_end]);
        self.graph.block_add_node_with_prev(
            exit_block,
            GraphNode::new(GraphNodeKind::IfFalse, None),
            header_loop,
        );
        self.graph.seal_block(exit_block);

        let mut merge_prevs = Vec::new();
        let mut merge_prev_blocks = Vec::new();
        self.collect_breaks(&mut merge_prevs, &mut merge_prev_blocks);

        if merge_prevs.is_empty() {
            Ok(exit_block)
        } else {
            merge_prevs.push(self.next(exit_block));
            merge_prev_blocks.push(exit_block);
            let merge_block = self.graph.add_basic_block(merge_prev_blocks);
            self.graph.block_add_node_with_prevs(
                merge_block,
                GraphNode::new(GraphNodeKind::Merge, None),
                &merge_prevs,
            );
            self.graph.seal_block(merge_block);
            Ok(merge_block)
        }
    }

    fn process_do_while_statement(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::DoWhileStatement { test, body } = self.arena.kind(node) else {
            unreachable!("caller matched the kind");
        };
        let (test, body_ast) = (*test, *body);

        self.pending_break_blocks.push(Vec::new());
        self.pending_continue_blocks.push(Vec::new());
        let prev_node = self.next(block);
        let body_start = self.graph.add_basic_block(vec![block]);
        let body_merge = self.graph.block_add_node_with_prev(
            body_start,
            GraphNode::new(GraphNodeKind::Merge, None),
            prev_node,
        );
        let mut body = self.process_ast_node(body_start, body_ast)?;

        let pre_merge_block;
        if self.graph.block(body).is_filled() {
            pre_merge_block = body;
        } else {
            // The loop test runs at the tail of the body.
            body = self.process_ast_node(body, test)?;
            let test_value = self.newest(body);
            let loop_node = self.add_control(
                body,
                GraphNode::with_input(GraphNodeKind::Loop, test_value, None),
            );
            let test_end_block = body;

            // A whole block just to jump back to the body.
            let if_true_block = self.graph.add_basic_block(vec![test_end_block]);
            self.graph.seal_block(if_true_block);
            self.graph.block_add_node_with_prev(
                if_true_block,
                GraphNode::new(GraphNodeKind::IfTrue, None),
                loop_node,
            );
            let back_jump = self.next(if_true_block);
            self.graph.node_mut(back_jump).add_next(body_merge);
            self.graph.node_mut(body_merge).add_prev(back_jump);
            self.graph.block_add_prev(body_start, if_true_block);

            let exit_block = self.graph.add_basic_block(vec![test_end_block]);
            self.graph.block_add_node_with_prev(
                exit_block,
                GraphNode::new(GraphNodeKind::IfFalse, None),
                loop_node,
            );
            self.graph.seal_block(exit_block);
            pre_merge_block = exit_block;
        }

        self.tie_continues_and_seal_header(body_start, body_merge);

        let mut merge_prevs = Vec::new();
        let mut merge_prev_blocks = Vec::new();
        self.collect_breaks(&mut merge_prevs, &mut merge_prev_blocks);

        if merge_prevs.is_empty() {
            Ok(pre_merge_block)
        } else {
            if !self.graph.block(pre_merge_block).is_filled() {
                merge_prevs.push(self.next(pre_merge_block));
                merge_prev_blocks.push(pre_merge_block);
            }
            let merge_block = self.graph.add_basic_block(merge_prev_blocks);
            self.graph.block_add_node_with_prevs(
                merge_block,
                GraphNode::new(GraphNodeKind::Merge, None),
                &merge_prevs,
            );
            self.graph.seal_block(merge_block);
            Ok(merge_block)
        }
    }

    fn process_for_statement(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::ForStatement {
            init,
            test,
            update,
            body,
        } = self.arena.kind(node)
        else {
            unreachable!("caller matched the kind");
        };
        let (init, test, update, body_ast) = (*init, *test, *update, *body);

        // Loop init first. Variable visibility is not tied to basic blocks;
        // it was resolved statically from the AST.
        let mut block = block;
        if let Some(init) = init {
            block = self.process_ast_node(block, init)?;
        }

        let prev_node = self.next(block);
        let header_start = self.graph.add_basic_block(vec![block]);
        let header_merge = self.graph.block_add_node_with_prev(
            header_start,
            GraphNode::new(GraphNodeKind::Merge, None),
            prev_node,
        );
        let (header_end, header_loop) = if let Some(test) = test {
            let header_end = self.process_ast_node(header_start, test)?;
            let test_value = self.newest(header_end);
            let header_loop = self.add_control(
                header_end,
                GraphNode::with_input(GraphNodeKind::Loop, test_value, None),
            );
            (header_end, header_loop)
        } else {
            let header_loop =
                self.add_control(header_start, GraphNode::new(GraphNodeKind::Loop, None));
            (header_start, header_loop)
        };

        self.pending_break_blocks.push(Vec::new());
        self.pending_continue_blocks.push(Vec::new());
        let body = self.graph.add_basic_block(vec![header_end]);
        self.graph.seal_block(body);
        self.graph
            .block_add_node_with_prev(body, GraphNode::new(GraphNodeKind::IfTrue, None), header_loop);
        let mut body = self.process_ast_node(body, body_ast)?;
        if !self.graph.block(body).is_filled() {
            if let Some(update) = update {
                body = self.process_ast_node(body, update)?;
            }
            let tail = self.next(body);
            self.graph.node_mut(tail).add_next(header_merge);
            self.graph.node_mut(header_merge).add_prev(tail);
            self.graph.block_add_prev(header_start, body);
        }

        self.tie_continues_and_seal_header(header_start, header_merge);

        let exit_block = self.graph.add_basic_block(vec![header_end]);
        self.graph.block_add_node_with_prev(
            exit_block,
            GraphNode::new(GraphNodeKind::IfFalse, None),
            header_loop,
        );
        self.graph.seal_block(exit_block);

        let mut merge_prevs = Vec::new();
        let mut merge_prev_blocks = Vec::new();
        self.collect_breaks(&mut merge_prevs, &mut merge_prev_blocks);

        if merge_prevs.is_empty() {
            Ok(exit_block)
        } else {
            merge_prevs.push(self.next(exit_block));
            merge_prev_blocks.push(exit_block);
            let merge_block = self.graph.add_basic_block(merge_prev_blocks);
            self.graph.block_add_node_with_prevs(
                merge_block,
                GraphNode::new(GraphNodeKind::Merge, None),
                &merge_prevs,
            );
            self.graph.seal_block(merge_block);
            Ok(merge_block)
        }
    }

    fn process_for_of_statement(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::ForOfStatement {
            left, right, body, ..
        } = self.arena.kind(node)
        else {
            unreachable!("caller matched the kind");
        };
        let (left, right, body_ast) = (*left, *right, *body);

        let prev_node = self.next(block);
        let header_start = self.graph.add_basic_block(vec![block]);
        let header_merge = self.graph.block_add_node_with_prev(
            header_start,
            GraphNode::new(GraphNodeKind::Merge, None),
            prev_node,
        );
        let header_end = self.process_ast_node(header_start, right)?;
        let iterable = self.newest(header_end);
        let header_loop = self.add_control(
            header_end,
            GraphNode::with_input(GraphNodeKind::ForOfLoop, iterable, None),
        );

        self.pending_break_blocks.push(Vec::new());
        self.pending_continue_blocks.push(Vec::new());
        let body = self.graph.add_basic_block(vec![header_end]);
        self.graph.seal_block(body);
        self.graph
            .block_add_node_with_prev(body, GraphNode::new(GraphNodeKind::IfTrue, None), header_loop);

        // The loop binding is produced by the loop node itself.
        self.bind_for_of_left(body, node, left, header_loop)?;

        let body = self.process_ast_node(body, body_ast)?;
        if !self.graph.block(body).is_filled() {
            let tail = self.next(body);
            self.graph.node_mut(tail).add_next(header_merge);
            self.graph.node_mut(header_merge).add_prev(tail);
            self.graph.block_add_prev(header_start, body);
        }

        self.tie_continues_and_seal_header(header_start, header_merge);

        let exit_block = self.graph.add_basic_block(vec![header_end]);
        self.graph.block_add_node_with_prev(
            exit_block,
            GraphNode::new(GraphNodeKind::IfFalse, None),
            header_loop,
        );
        self.graph.seal_block(exit_block);

        let mut merge_prevs = Vec::new();
        let mut merge_prev_blocks = Vec::new();
        self.collect_breaks(&mut merge_prevs, &mut merge_prev_blocks);

        if merge_prevs.is_empty() {
            Ok(exit_block)
        } else {
            merge_prevs.push(self.next(exit_block));
            merge_prev_blocks.push(exit_block);
            let merge_block = self.graph.add_basic_block(merge_prev_blocks);
            self.graph.block_add_node_with_prevs(
                merge_block,
                GraphNode::new(GraphNodeKind::Merge, None),
                &merge_prevs,
            );
            self.graph.seal_block(merge_block);
            Ok(merge_block)
        }
    }

    fn bind_for_of_left(
        &mut self,
        body: u16,
        for_node: NodeId,
        left: NodeId,
        loop_node: GraphNodeId,
    ) -> BuildResult<()> {
        match self.arena.kind(left) {
            AstKind::Identifier { .. } => {
                let decl = self.resolved_decl(left);
                if self.is_local_decl(decl) {
                    self.graph
                        .write_variable(body, decl.expect("local implies resolved"), loop_node);
                } else {
                    self.add_control(
                        body,
                        GraphNode::with_input(GraphNodeKind::StoreValue, loop_node, Some(left)),
                    );
                }
                Ok(())
            }
            AstKind::VariableDeclaration { declarations, .. } => {
                let declarations = declarations.clone();
                let [declarator] = declarations.as_slice() else {
                    return Err(self.unsupported(for_node, "multi-declarator for-of binding"));
                };
                let AstKind::VariableDeclarator { id, .. } = self.arena.kind(*declarator) else {
                    return Err(self.unsupported(for_node, "for-of binding"));
                };
                let id = *id;
                match self.arena.kind(id) {
                    AstKind::Identifier { .. } => {
                        self.graph.write_variable(body, id, loop_node);
                        Ok(())
                    }
                    AstKind::ArrayPattern { elements } => {
                        for elem in elements.clone().into_iter().flatten() {
                            if self.arena.identifier_name(elem).is_none() {
                                return Err(self.unsupported(
                                    for_node,
                                    "non-identifier element in for-of array pattern",
                                ));
                            }
                            self.add_control(
                                body,
                                GraphNode::with_input(
                                    GraphNodeKind::LoadProperty,
                                    loop_node,
                                    Some(elem),
                                ),
                            );
                            let newest = self.newest(body);
                            self.graph.write_variable(body, elem, newest);
                        }
                        Ok(())
                    }
                    other => Err(self.unsupported(
                        for_node,
                        &format!("for-of with {} left-hand side", other.name()),
                    )),
                }
            }
            other => Err(self.unsupported(
                for_node,
                &format!("for-of with {} left-hand side", other.name()),
            )),
        }
    }

    fn process_conditional_expression(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::ConditionalExpression {
            test,
            consequent,
            alternate,
        } = self.arena.kind(node)
        else {
            unreachable!("caller matched the kind");
        };
        let (test, consequent_ast, alternate_ast) = (*test, *consequent, *alternate);

        let block = self.process_ast_node(block, test)?;
        let test_value = self.newest(block);
        self.add_control(block, GraphNode::with_input(GraphNodeKind::If, test_value, None));
        let prev_node = self.next(block);
        let prev_block = block;
        let mut merge_prevs = Vec::new();

        let consequent = self.graph.add_basic_block(vec![prev_block]);
        self.graph.seal_block(consequent);
        self.graph.block_add_node_with_prev(
            consequent,
            GraphNode::new(GraphNodeKind::IfTrue, None),
            prev_node,
        );
        let consequent = self.process_ast_node(consequent, consequent_ast)?;
        if self.graph.block(consequent).is_filled() {
            return Err(self.unsupported(node, "diverging conditional expression arm"));
        }
        merge_prevs.push(self.next(consequent));
        let consequent_newest = self.newest(consequent);

        let alternate = self.graph.add_basic_block(vec![prev_block]);
        self.graph.seal_block(alternate);
        self.graph.block_add_node_with_prev(
            alternate,
            GraphNode::new(GraphNodeKind::IfFalse, None),
            prev_node,
        );
        let alternate = self.process_ast_node(alternate, alternate_ast)?;
        if self.graph.block(alternate).is_filled() {
            return Err(self.unsupported(node, "diverging conditional expression arm"));
        }
        merge_prevs.push(self.next(alternate));
        let alternate_newest = self.newest(alternate);

        let merge_block = self.graph.add_basic_block(vec![consequent, alternate]);
        self.graph.block_add_node_with_prevs(
            merge_block,
            GraphNode::new(GraphNodeKind::Merge, None),
            &merge_prevs,
        );
        self.graph.seal_block(merge_block);

        // Both arms produced a value; merge them in a φ.
        self.graph
            .add_phi(merge_block, vec![consequent_newest, alternate_newest]);
        Ok(merge_block)
    }

    fn process_try_statement(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::TryStatement {
            block: try_body,
            handler,
            finalizer,
        } = self.arena.kind(node)
        else {
            unreachable!("caller matched the kind");
        };
        let (try_body, handler, finalizer) = (*try_body, *handler, *finalizer);

        if finalizer.is_some() {
            return Err(self.unsupported(node, "finally clauses"));
        }
        let Some(handler) = handler else {
            return Err(self.unsupported(node, "try without a catch clause"));
        };
        let AstKind::CatchClause { param, body } = self.arena.kind(handler) else {
            return Err(self.unsupported(node, "try handler"));
        };
        let (catch_param, catch_body) = (*param, *body);

        let prev_node = self.next(block);
        let prev_block = block;

        let try_block = self.graph.add_basic_block(vec![prev_block]);
        let try_node = self.graph.block_add_node_with_prev(
            try_block,
            GraphNode::new(GraphNodeKind::Try, Some(node)),
            prev_node,
        );
        self.graph.seal_block(try_block);

        let mut merge_prevs = Vec::new();
        let mut merge_prev_blocks = Vec::new();

        // Prepare the catch header first so throws inside the try body can
        // find their handler. The catch block hangs off the pre-try block:
        // it sees the variable state from before the try, not from inside.
        let catch_block = self.graph.add_basic_block(vec![prev_block]);
        self.graph.seal_block(catch_block);
        let catch_node = self.graph.block_add_node(
            catch_block,
            GraphNode::with_input(GraphNodeKind::CatchException, try_node, None),
            true,
        );
        self.catch_stack.push(catch_node);

        match catch_param {
            Some(param) if self.arena.identifier_name(param).is_some() => {
                let decl = self.resolved_decl(param).unwrap_or(param);
                self.graph.write_variable(catch_block, decl, catch_node);
            }
            Some(param) => {
                return Err(self.unsupported(
                    node,
                    &format!(
                        "{} catch clause parameter",
                        self.arena.kind(param).name()
                    ),
                ));
            }
            None => {}
        }

        // Lower the try body with the handler in scope.
        let try_block = self.process_ast_node(try_block, try_body)?;
        self.catch_stack.pop();
        let last_try_kind = self.graph.node(self.next(try_block)).kind;
        if !self.graph.block(try_block).is_filled()
            && last_try_kind != GraphNodeKind::Return
            && last_try_kind != GraphNodeKind::Throw
        {
            merge_prevs.push(self.next(try_block));
            merge_prev_blocks.push(try_block);
        }

        let catch_block = self.process_ast_node(catch_block, catch_body)?;
        let last_catch_kind = self.graph.node(self.next(catch_block)).kind;
        if !self.graph.block(catch_block).is_filled()
            && last_catch_kind != GraphNodeKind::Return
            && last_catch_kind != GraphNodeKind::Throw
        {
            merge_prevs.push(self.next(catch_block));
            merge_prev_blocks.push(catch_block);
        }

        let merge_block = self.graph.add_basic_block(merge_prev_blocks);
        if !merge_prevs.is_empty() {
            self.graph.block_add_node_with_prevs(
                merge_block,
                GraphNode::new(GraphNodeKind::Merge, None),
                &merge_prevs,
            );
            self.graph.seal_block(merge_block);
        } else {
            self.graph.seal_block(merge_block);
            self.graph.block_set_filled(merge_block);
        }
        Ok(merge_block)
    }

    fn process_throw_statement(
        &mut self,
        block: u16,
        node: NodeId,
        argument: NodeId,
    ) -> BuildResult<u16> {
        let block = self.process_ast_node(block, argument)?;
        let newest = self.newest(block);
        self.add_control(
            block,
            GraphNode::with_input(GraphNodeKind::PrepareException, newest, Some(node)),
        );
        let prepare_node = self.next(block);

        if let Some(&catch_node) = self.catch_stack.last() {
            self.graph.node_mut(prepare_node).add_next(catch_node);
            self.graph.node_mut(catch_node).add_prev(prepare_node);
        } else {
            self.add_control(block, GraphNode::new(GraphNodeKind::Throw, Some(node)));
        }

        self.graph.block_set_filled(block);
        Ok(block)
    }

    fn process_switch_statement(&mut self, block: u16, node: NodeId) -> BuildResult<u16> {
        let AstKind::SwitchStatement {
            discriminant,
            cases,
        } = self.arena.kind(node)
        else {
            unreachable!("caller matched the kind");
        };
        let (discriminant, cases) = (*discriminant, cases.clone());

        let block = self.process_ast_node(block, discriminant)?;
        let discriminant_value = self.newest(block);
        self.add_control(
            block,
            GraphNode::with_input(GraphNodeKind::Switch, discriminant_value, None),
        );
        let switch_node = self.next(block);
        let prev_block = block;
        let mut merge_prevs = Vec::new();
        let mut merge_prev_blocks = Vec::new();

        if cases.is_empty() {
            return Ok(block);
        }

        self.pending_break_blocks.push(Vec::new());
        let mut prev_case_block: Option<u16> = None;
        for case in cases {
            let AstKind::SwitchCase { test, consequent } = self.arena.kind(case) else {
                continue;
            };
            let (test, consequent) = (*test, consequent.clone());

            // Each case hangs off the switch, merged with fallthrough from
            // the previous case when that one did not break.
            let case_block = self.graph.add_basic_block(vec![prev_block]);
            self.graph.block_set_next(case_block, switch_node);
            if let Some(prev_case) = prev_case_block {
                if !self.graph.block(prev_case).is_filled() {
                    self.graph.block_add_prev(case_block, prev_case);
                    let case_merge_prevs = [switch_node, self.next(prev_case)];
                    self.graph.block_add_node_with_prevs(
                        case_block,
                        GraphNode::new(GraphNodeKind::Merge, None),
                        &case_merge_prevs,
                    );
                }
            }
            self.graph.seal_block(case_block);

            let mut case_block = if let Some(test) = test {
                let b = self.process_ast_node(case_block, test)?;
                let test_value = self.newest(b);
                self.add_control(b, GraphNode::with_input(GraphNodeKind::Case, test_value, None));
                b
            } else {
                self.add_control(case_block, GraphNode::new(GraphNodeKind::Case, None));
                case_block
            };

            for stmt in consequent {
                case_block = self.process_ast_node(case_block, stmt)?;
            }
            prev_case_block = Some(case_block);
        }

        if let Some(last_case) = prev_case_block {
            if !self.graph.block(last_case).is_filled() {
                merge_prev_blocks.push(last_case);
                merge_prevs.push(self.next(last_case));
            }
        }

        self.collect_breaks(&mut merge_prevs, &mut merge_prev_blocks);

        let merge_block = self.graph.add_basic_block(merge_prev_blocks);
        self.graph.seal_block(merge_block);
        if !merge_prevs.is_empty() {
            self.graph.block_add_node_with_prevs(
                merge_block,
                GraphNode::new(GraphNodeKind::Merge, None),
                &merge_prevs,
            );
        } else {
            self.graph.block_set_filled(merge_block);
        }
        Ok(merge_block)
    }

    fn process_break_statement(
        &mut self,
        block: u16,
        node: NodeId,
        labelled: bool,
    ) -> BuildResult<u16> {
        if labelled {
            return Err(self.unsupported(node, "break to a label"));
        }
        if self.pending_break_blocks.is_empty() {
            self.orphan_jumps.push(OrphanJump {
                node,
                message: "break statement outside of a loop, switch or labeled-block",
            });
            return Ok(block);
        }
        self.add_control(block, GraphNode::new(GraphNodeKind::Break, None));
        self.graph.block_set_filled(block);
        self.pending_break_blocks
            .last_mut()
            .expect("checked above")
            .push(block);
        Ok(block)
    }

    fn process_continue_statement(
        &mut self,
        block: u16,
        node: NodeId,
        labelled: bool,
    ) -> BuildResult<u16> {
        if labelled {
            return Err(self.unsupported(node, "continue to a label"));
        }
        if self.pending_continue_blocks.is_empty() {
            self.orphan_jumps.push(OrphanJump {
                node,
                message: "Continue statement outside of a loop or labeled-block",
            });
            return Ok(block);
        }
        self.add_control(block, GraphNode::new(GraphNodeKind::Continue, None));
        self.graph.block_set_filled(block);
        self.pending_continue_blocks
            .last_mut()
            .expect("checked above")
            .push(block);
        Ok(block)
    }
}
