//! The scope-stack walk that binds identifier uses to declarations.

use nodelint_ast::queries;
use nodelint_ast::{AstArena, AstKind, NodeId};
use rustc_hash::FxHashMap;
use tracing::debug;

/// The result of resolving one module's names.
#[derive(Debug, Default)]
pub struct ResolvedNames {
    /// Identifier use → declaring identifier. Declarations map to
    /// themselves.
    pub targets: FxHashMap<NodeId, NodeId>,
    /// Top-level names with no declaration, with one representative use
    /// each. These may be globals provided by the host environment.
    pub free_top_level: FxHashMap<String, NodeId>,
    /// Declaration → every resolved use, the declaration itself first.
    pub xrefs: FxHashMap<NodeId, Vec<NodeId>>,
}

/// One frame of the scope stack.
///
/// `var` declarations may shadow each other within a frame, so they are
/// keyed as `{counter}{name}`; the write counter advances as declarators
/// are discovered and the read counter as they are visited, which lets a
/// read prefer the latest preceding `var` before falling back to hoisted
/// later ones.
#[derive(Default)]
struct Scope {
    declarations: FxHashMap<String, NodeId>,
    is_block_scope: bool,
    write_var_counter: u32,
    read_var_counter: u32,
}

/// Node kinds that open a frame persisting across inner blocks - the
/// frames `var` declarations hoist into.
fn is_full_scope_kind(kind: &AstKind) -> bool {
    matches!(
        kind,
        AstKind::Root { .. }
            | AstKind::ClassBody { .. }
            | AstKind::ObjectMethod(_)
            | AstKind::ArrowFunctionExpression(_)
            | AstKind::FunctionExpression(_)
            | AstKind::ClassMethod(_)
            | AstKind::ClassPrivateMethod(_)
            | AstKind::FunctionDeclaration(_)
    )
}

fn is_var_declaration(arena: &AstArena, node: NodeId) -> bool {
    matches!(
        arena.kind(node),
        AstKind::VariableDeclaration {
            kind: nodelint_ast::VariableKind::Var,
            ..
        }
    )
}

/// Node kinds that open a transient frame. `TypeAlias` is not a
/// traditional scope, but its type parameters need somewhere to live.
fn is_partial_scope_kind(kind: &AstKind) -> bool {
    matches!(
        kind,
        AstKind::BlockStatement { .. }
            | AstKind::CatchClause { .. }
            | AstKind::ForStatement { .. }
            | AstKind::ForInStatement { .. }
            | AstKind::ForOfStatement { .. }
            | AstKind::SwitchCase { .. }
            | AstKind::TypeAlias { .. }
    )
}

struct Resolver<'a> {
    arena: &'a AstArena,
    scopes: Vec<Scope>,
    full_scope_level: u32,
    out: ResolvedNames,
}

impl<'a> Resolver<'a> {
    fn add_declaration(&mut self, id: NodeId) {
        let Some(name) = self.arena.identifier_name(id) else {
            debug!(
                kind = self.arena.kind(id).name(),
                "expected an identifier while collecting declarations"
            );
            return;
        };
        if queries::is_var_declaration_identifier(self.arena, id) {
            // Counter-keyed so later vars of the same name can shadow
            // earlier ones. Every enclosing frame collects the var through
            // its own subtree scan, so inserting into the current frame is
            // enough here.
            let scope = self
                .scopes
                .last_mut()
                .expect("scope stack cannot be empty");
            scope.write_var_counter += 1;
            let prefixed = format!("{}{}", scope.write_var_counter, name);
            scope.declarations.entry(prefixed).or_insert(id);
        } else {
            self.scopes
                .last_mut()
                .expect("scope stack cannot be empty")
                .declarations
                .entry(name.to_string())
                .or_insert(id);
        }
    }

    /// Collect every `var` declared anywhere under this frame (not crossing
    /// nested full scopes) in textual order, so the per-frame counter keys
    /// line up with the read counter advanced during the walk.
    fn declare_vars_in_subtree(&mut self, scope_node: NodeId) {
        for child in self.arena.children(scope_node) {
            self.scan_vars(child);
        }
    }

    fn scan_vars(&mut self, node: NodeId) {
        // vars do not hoist out of functions or class bodies.
        if is_full_scope_kind(self.arena.kind(node)) {
            return;
        }
        if matches!(
            self.arena.kind(node),
            AstKind::VariableDeclaration {
                kind: nodelint_ast::VariableKind::Var,
                ..
            }
        ) {
            self.add_pattern_declarations(node);
        }
        for child in self.arena.children(node) {
            self.scan_vars(child);
        }
    }

    /// Declare the identifiers bound by `id`, which may be a plain
    /// identifier, a (possibly nested) destructuring pattern, or a whole
    /// variable declaration.
    fn add_pattern_declarations(&mut self, id: NodeId) {
        match self.arena.kind(id) {
            AstKind::Identifier { .. } => self.add_declaration(id),
            AstKind::VariableDeclaration { declarations, .. } => {
                for declarator in declarations.clone() {
                    if let AstKind::VariableDeclarator { id: pat, .. } =
                        self.arena.kind(declarator)
                    {
                        self.add_pattern_declarations(*pat);
                    }
                }
            }
            AstKind::ObjectPattern { properties } => {
                for prop in properties.clone() {
                    match self.arena.kind(prop) {
                        AstKind::ObjectProperty { value, .. } => {
                            self.add_pattern_declarations(*value);
                        }
                        AstKind::RestElement { argument } => {
                            self.add_pattern_declarations(*argument);
                        }
                        other => debug!(
                            kind = other.name(),
                            "unhandled property kind in object pattern declarations"
                        ),
                    }
                }
            }
            AstKind::ArrayPattern { elements } => {
                for elem in elements.clone().into_iter().flatten() {
                    self.add_pattern_declarations(elem);
                }
            }
            AstKind::AssignmentPattern { left, .. } => self.add_pattern_declarations(*left),
            AstKind::RestElement { argument } => self.add_pattern_declarations(*argument),
            other => {
                // Internal bug: the walk only hands this function binding
                // positions, and every binding shape is enumerated above.
                unreachable!("unexpected node in binding position: {}", other.name());
            }
        }
    }

    fn add_type_parameter_declarations(&mut self, decl: NodeId) {
        if let AstKind::TypeParameterDeclaration { params } = self.arena.kind(decl) {
            for param in params.clone() {
                if let AstKind::TypeParameter { name } = self.arena.kind(param) {
                    self.add_declaration(*name);
                }
            }
        }
    }

    fn add_import_declarations(&mut self, decl: NodeId) {
        let AstKind::ImportDeclaration { specifiers, .. } = self.arena.kind(decl) else {
            return;
        };
        for spec in specifiers.clone() {
            match self.arena.kind(spec) {
                AstKind::ImportDefaultSpecifier { local }
                | AstKind::ImportSpecifier { local, .. }
                | AstKind::ImportNamespaceSpecifier { local } => self.add_declaration(*local),
                _ => {}
            }
        }
    }

    /// Discover the declarations a new scope introduces, before walking
    /// into its children.
    fn find_scope_declarations(&mut self, scope_node: NodeId) {
        match self.arena.kind(scope_node) {
            // A function expression's own name lives in its body scope, so
            // the function can recurse without polluting the parent scope.
            AstKind::FunctionExpression(f) => {
                if let Some(id) = f.id {
                    self.add_declaration(id);
                }
                for param in f.params.clone() {
                    self.add_pattern_declarations(param);
                }
            }
            AstKind::FunctionDeclaration(f)
            | AstKind::ArrowFunctionExpression(f)
            | AstKind::ObjectMethod(f)
            | AstKind::ClassMethod(f)
            | AstKind::ClassPrivateMethod(f) => {
                for param in f.params.clone() {
                    self.add_pattern_declarations(param);
                }
            }
            AstKind::CatchClause { param, .. } => {
                if let Some(param) = *param {
                    self.add_pattern_declarations(param);
                }
            }
            AstKind::ForInStatement { left, .. } | AstKind::ForOfStatement { left, .. } => {
                if !is_var_declaration(self.arena, *left) {
                    self.add_pattern_declarations(*left);
                }
            }
            AstKind::ForStatement {
                init: Some(init), ..
            } if matches!(self.arena.kind(*init), AstKind::VariableDeclaration { .. }) => {
                if !is_var_declaration(self.arena, *init) {
                    self.add_pattern_declarations(*init);
                }
            }
            _ => {}
        }

        for child in self.arena.children(scope_node) {
            match self.arena.kind(child) {
                AstKind::ClassDeclaration(class) => {
                    if let Some(id) = class.id {
                        self.add_declaration(id);
                    }
                    if let Some(tp) = class.type_parameters {
                        self.add_type_parameter_declarations(tp);
                    }
                }
                AstKind::FunctionDeclaration(f) => {
                    if let Some(id) = f.id {
                        self.add_declaration(id);
                    }
                }
                AstKind::ExportNamedDeclaration { .. }
                | AstKind::ExportDefaultDeclaration { .. }
                | AstKind::ExportAllDeclaration { .. } => {
                    self.find_scope_declarations(child);
                }
                AstKind::ImportDeclaration { .. } => self.add_import_declarations(child),
                // vars are collected by the frame's subtree scan instead.
                AstKind::VariableDeclaration { .. } => {
                    if !is_var_declaration(self.arena, child) {
                        self.add_pattern_declarations(child);
                    }
                }
                AstKind::InterfaceDeclaration { id, .. } => self.add_declaration(*id),
                AstKind::TypeAlias { id, .. } => self.add_declaration(*id),
                AstKind::TypeParameterDeclaration { .. } => {
                    self.add_type_parameter_declarations(child);
                }
                _ => {}
            }
        }
    }

    /// Scope-stack lookup for one identifier use, var counters first.
    fn lookup(&self, name: &str) -> Option<NodeId> {
        for scope in self.scopes.iter().rev() {
            // Preceding vars shadow, latest first.
            for var_index in (1..=scope.read_var_counter).rev() {
                if let Some(&decl) = scope.declarations.get(&format!("{var_index}{name}")) {
                    return Some(decl);
                }
            }
            // Then vars hoisted from later in the scope.
            for var_index in scope.read_var_counter + 1..=scope.write_var_counter {
                if let Some(&decl) = scope.declarations.get(&format!("{var_index}{name}")) {
                    return Some(decl);
                }
            }
            // Then ordinary block-scoped declarations.
            if let Some(&decl) = scope.declarations.get(name) {
                return Some(decl);
            }
        }
        None
    }

    fn resolve_identifier(&mut self, id: NodeId) {
        let Some(name) = self.arena.identifier_name(id) else {
            return;
        };

        // The module-external half of an import/export specifier names an
        // entity in another module; a same-named local binding must not
        // capture it, or an unaliased unused import would look used.
        if queries::is_external_specifier_identifier(self.arena, id) {
            self.out.targets.insert(id, id);
            return;
        }

        if let Some(decl) = self.lookup(name) {
            self.out.targets.insert(id, decl);
            return;
        }

        // Other names living outside lexical scoping declare themselves:
        // property/method keys and structural-type member names.
        if queries::is_unscoped_property_or_method_identifier(self.arena, id)
            || queries::is_unscoped_type_identifier(self.arena, id)
        {
            self.out.targets.insert(id, id);
            return;
        }

        if self.full_scope_level == 1
            && !queries::is_member_property_or_qualified_identifier(self.arena, id)
        {
            self.out.free_top_level.entry(name.to_string()).or_insert(id);
        }
    }

    fn walk(&mut self, node: NodeId) {
        let kind = self.arena.kind(node);
        let is_full = is_full_scope_kind(kind);
        let is_block = is_partial_scope_kind(kind);

        if is_full || is_block {
            self.full_scope_level += u32::from(is_full);
            self.scopes.push(Scope {
                is_block_scope: is_block,
                ..Scope::default()
            });
            self.find_scope_declarations(node);
            self.declare_vars_in_subtree(node);
        } else if matches!(kind, AstKind::Identifier { .. }) {
            self.resolve_identifier(node);
        }

        for child in self.arena.children(node) {
            self.walk(child);
        }

        // Track how many var declarators precede the current position, so
        // reads can prefer the latest preceding var over hoisted ones.
        if matches!(self.arena.kind(node), AstKind::VariableDeclarator { .. }) {
            let parent = self.arena.parent(node);
            let is_var = parent.is_some_and(|p| {
                matches!(
                    self.arena.kind(p),
                    AstKind::VariableDeclaration {
                        kind: nodelint_ast::VariableKind::Var,
                        ..
                    }
                )
            });
            if is_var {
                for scope in self.scopes.iter_mut().rev() {
                    scope.read_var_counter += 1;
                    if !scope.is_block_scope {
                        break;
                    }
                }
            }
        }

        if is_full || is_block {
            // Every declaration refers to itself.
            let scope = self.scopes.pop().expect("scope stack cannot be empty");
            for (_, decl) in scope.declarations {
                self.out.targets.insert(decl, decl);
            }
            self.full_scope_level -= u32::from(is_full);
        }
    }
}

/// Resolve every identifier in the module rooted at `root`.
pub fn resolve_module_names(arena: &AstArena, root: NodeId) -> ResolvedNames {
    let mut resolver = Resolver {
        arena,
        scopes: Vec::new(),
        full_scope_level: 0,
        out: ResolvedNames::default(),
    };
    resolver.walk(root);
    let mut out = resolver.out;

    // Invert use → declaration into declaration → [declaration, uses...].
    let mut xrefs: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for &decl in out.targets.values() {
        xrefs.entry(decl).or_insert_with(|| vec![decl]);
    }
    let mut uses: Vec<(NodeId, NodeId)> = out
        .targets
        .iter()
        .filter(|(use_id, decl)| use_id != decl)
        .map(|(&u, &d)| (u, d))
        .collect();
    uses.sort_unstable();
    for (use_id, decl) in uses {
        xrefs.get_mut(&decl).expect("declaration seeded above").push(use_id);
    }
    out.xrefs = xrefs;
    out
}
