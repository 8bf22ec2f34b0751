//! One parsed module and its memoized analysis state.

use nodelint_ast::{AstArena, AstKind, NodeId, SourceSpan};
use nodelint_common::reporting::{self, FileLocation};
use nodelint_graph::{Graph, GraphBuilder, GraphNodeId};
use nodelint_resolver::{ResolvedNames, resolve_module_names};
use nodelint_types::{ClassTypeData, DefSite, TypeInfo};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// The unit of parsing and resolution. Created when the host first loads
/// the file; resolution passes and graph builds run on demand and memoize.
pub struct Module {
    path: PathBuf,
    /// Canonical path as a shared string, used to key definition sites.
    path_str: Rc<str>,
    source: String,
    arena: AstArena,
    root: NodeId,
    resolved: once_cell::unsync::OnceCell<ResolvedNames>,
    /// Import/re-export specifier → resolved (module, declaration).
    imported: RefCell<FxHashMap<NodeId, Option<(PathBuf, NodeId)>>>,
    /// Function node → built graph; a failed build memoizes `None`.
    graphs: RefCell<FxHashMap<NodeId, Option<Rc<Graph>>>>,
    /// `(function, graph node)` → resolved type. Write-once.
    node_types: RefCell<FxHashMap<(NodeId, GraphNodeId), TypeInfo>>,
    /// Class declaration → shared class payload.
    class_types: RefCell<FxHashMap<NodeId, Rc<ClassTypeData>>>,
}

impl Module {
    pub fn new(path: PathBuf, source: String, arena: AstArena, root: NodeId) -> Self {
        let path_str: Rc<str> = path.to_string_lossy().into_owned().into();
        Module {
            path,
            path_str,
            source,
            arena,
            root,
            resolved: once_cell::unsync::OnceCell::new(),
            imported: RefCell::new(FxHashMap::default()),
            graphs: RefCell::new(FxHashMap::default()),
            node_types: RefCell::new(FxHashMap::default()),
            class_types: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Local identifier resolution, run once on first use.
    pub fn resolved_names(&self) -> &ResolvedNames {
        self.resolved
            .get_or_init(|| resolve_module_names(&self.arena, self.root))
    }

    pub fn resolved_locals(&self) -> &FxHashMap<NodeId, NodeId> {
        &self.resolved_names().targets
    }

    pub fn xrefs(&self) -> &FxHashMap<NodeId, Vec<NodeId>> {
        &self.resolved_names().xrefs
    }

    pub fn free_top_level_names(&self) -> &FxHashMap<String, NodeId> {
        &self.resolved_names().free_top_level
    }

    /// The function's graph, built on first request. `None` when the
    /// function uses a construct the builder does not support.
    pub fn function_graph(&self, fun: NodeId) -> Option<Rc<Graph>> {
        if let Some(cached) = self.graphs.borrow().get(&fun) {
            return cached.clone();
        }

        let targets = &self.resolved_names().targets;
        let built = GraphBuilder::new(&self.arena, targets, fun).and_then(GraphBuilder::build);
        let entry = match built {
            Ok((graph, orphan_jumps)) => {
                for jump in orphan_jumps {
                    reporting::error(Some(&self.location_of(jump.node)), jump.message);
                }
                Some(Rc::new(graph))
            }
            Err(e) => {
                let loc = e.node.map(|n| self.location_of(n));
                reporting::trace(
                    loc.as_ref(),
                    &format!("Skipping function graph: {}", e.message),
                );
                None
            }
        };
        self.graphs.borrow_mut().insert(fun, entry.clone());
        entry
    }

    /// Memoized type of one graph node. Types are write-once: the first
    /// resolution wins and later calls observe it.
    pub fn cached_node_type(&self, fun: NodeId, node: GraphNodeId) -> Option<TypeInfo> {
        self.node_types.borrow().get(&(fun, node)).cloned()
    }

    pub fn cache_node_type(&self, fun: NodeId, node: GraphNodeId, ty: TypeInfo) -> TypeInfo {
        self.node_types
            .borrow_mut()
            .entry((fun, node))
            .or_insert(ty)
            .clone()
    }

    /// The shared class payload for a class declaration/expression.
    pub fn class_type_data(&self, class_node: NodeId) -> Rc<ClassTypeData> {
        self.class_types
            .borrow_mut()
            .entry(class_node)
            .or_insert_with(|| ClassTypeData::from_def(self.def_site(class_node)))
            .clone()
    }

    pub fn def_site(&self, node: NodeId) -> DefSite {
        DefSite::new(Rc::clone(&self.path_str), node)
    }

    pub fn cached_import(&self, spec: NodeId) -> Option<Option<(PathBuf, NodeId)>> {
        self.imported.borrow().get(&spec).cloned()
    }

    pub fn cache_import(&self, spec: NodeId, resolved: Option<(PathBuf, NodeId)>) {
        self.imported.borrow_mut().insert(spec, resolved);
    }

    /// Printable location for a node, path shown relative to the current
    /// directory.
    pub fn location_of(&self, node: NodeId) -> FileLocation {
        let span = self.arena.span(node);
        FileLocation::relative_to_cwd(&self.path, span.start.line, span.start.column)
    }

    /// The original source text under a span. Offsets count characters,
    /// the way the parser front-end reports them.
    pub fn source_excerpt(&self, span: SourceSpan) -> String {
        let start = span.start.offset as usize;
        let end = span.end.offset as usize;
        self.source
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    /// Module specifiers this module imports or re-exports from.
    pub fn import_sources(&self) -> Vec<String> {
        let mut sources = Vec::new();
        let mut push_source = |source: NodeId| {
            if let AstKind::StringLiteral { value } = self.arena.kind(source) {
                sources.push(value.clone());
            }
        };
        for child in self.arena.children(self.root) {
            match self.arena.kind(child) {
                AstKind::ImportDeclaration { source, .. }
                | AstKind::ExportAllDeclaration { source } => push_source(*source),
                AstKind::ExportNamedDeclaration {
                    source: Some(source),
                    ..
                } => push_source(*source),
                _ => {}
            }
        }
        debug!(module = %self.path.display(), count = sources.len(), "scanned import sources");
        sources
    }
}
