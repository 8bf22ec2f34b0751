//! The module host: path → module map, transitive loading, and
//! cross-module declaration resolution.
//!
//! Loading is a single-threaded phase that fans parse work out to the pool
//! and joins every future before analysis begins; after that the map is
//! only read, so import resolution during analysis sees a frozen world.

use crate::module::Module;
use crate::native::is_native_module;
use crate::parser::ParserBackend;
use crate::pool::ParsePool;
use crate::resolve_path;
use anyhow::{Context, Result};
use nodelint_ast::{AstKind, NodeId, queries, walk_decide, WalkDecision};
use nodelint_common::reporting;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info_span};
use walkdir::WalkDir;

pub struct ModuleHost {
    modules: FxHashMap<PathBuf, Module>,
    parser: Arc<dyn ParserBackend>,
}

impl ModuleHost {
    pub fn new(parser: Arc<dyn ParserBackend>) -> Self {
        ModuleHost {
            modules: FxHashMap::default(),
            parser,
        }
    }

    pub fn module(&self, path: &Path) -> Option<&Module> {
        self.modules.get(path)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Load one source file plus everything it transitively imports.
    /// Returns the canonical path of the entry module.
    pub fn load_file(&mut self, path: &Path) -> Result<PathBuf> {
        let canonical = std::fs::canonicalize(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        self.load_transitively(vec![canonical.clone()])?;
        Ok(canonical)
    }

    /// Load every `.js` file under `dir`, excluding vendored dependencies.
    /// Returns the canonical analysis roots.
    pub fn load_directory(&mut self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut roots = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "js") {
                continue;
            }
            if path
                .components()
                .any(|c| c.as_os_str() == "node_modules")
            {
                continue;
            }
            roots.push(std::fs::canonicalize(path)?);
        }
        roots.sort();
        self.load_transitively(roots.clone())?;
        Ok(roots)
    }

    /// Load a project from its `package.json`: the `main` module and every
    /// project-local module reachable from it. Returns the analysis roots.
    pub fn load_project(&mut self, manifest: &Path) -> Result<Vec<PathBuf>> {
        let project_dir = manifest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let project_dir = std::fs::canonicalize(&project_dir)
            .with_context(|| format!("cannot open {}", project_dir.display()))?;
        let entry = resolve_path::project_main_file(&project_dir)?;
        let entry = std::fs::canonicalize(entry)?;
        self.load_transitively(vec![entry])?;

        let mut roots: Vec<PathBuf> = self
            .modules
            .keys()
            .filter(|path| resolve_path::is_project_module(&project_dir, path))
            .cloned()
            .collect();
        roots.sort();
        Ok(roots)
    }

    fn load_transitively(&mut self, roots: Vec<PathBuf>) -> Result<()> {
        let _span = info_span!("load_modules").entered();
        let pool = ParsePool::start(Arc::clone(&self.parser));
        let result = self.load_with_pool(&pool, roots);
        pool.stop();
        result
    }

    fn load_with_pool(&mut self, pool: &ParsePool, roots: Vec<PathBuf>) -> Result<()> {
        let mut pending = roots;
        while !pending.is_empty() {
            let mut futures = Vec::new();
            for path in std::mem::take(&mut pending) {
                if self.modules.contains_key(&path) {
                    continue;
                }
                let source = std::fs::read_to_string(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                let future = pool.submit(path.clone(), source.clone());
                futures.push((path, source, future));
            }

            for (path, source, future) in futures {
                let parsed = future.wait().map_err(|e| anyhow::anyhow!("{e}"))?;
                let module = Module::new(path.clone(), source, parsed.arena, parsed.root);
                debug!(module = %path.display(), "loaded");

                for spec in module.import_sources() {
                    if is_native_module(&spec) {
                        continue;
                    }
                    let target = resolve_path::resolve(&path, &spec)
                        .and_then(|p| std::fs::canonicalize(p).ok());
                    match target {
                        Some(target) => {
                            if !self.modules.contains_key(&target) && !pending.contains(&target) {
                                pending.push(target);
                            }
                        }
                        None => reporting::trace(
                            None,
                            &format!(
                                "Cannot find module {spec} imported from {}",
                                path.display()
                            ),
                        ),
                    }
                }
                self.modules.insert(path, module);
            }
        }
        Ok(())
    }

    /// Resolve an import (or re-export) specifier to the declaration it
    /// names in the source module, following the bounded export walk.
    pub fn resolve_imported_declaration<'a>(
        &'a self,
        module: &'a Module,
        spec: NodeId,
    ) -> Option<(&'a Module, NodeId)> {
        if let Some(cached) = module.cached_import(spec) {
            return cached.and_then(|(path, node)| self.modules.get(&path).map(|m| (m, node)));
        }
        let resolved = self.resolve_imported_declaration_uncached(module, spec);
        module.cache_import(
            spec,
            resolved.map(|(m, node)| (m.path().to_path_buf(), node)),
        );
        resolved
    }

    fn import_source_and_name(
        &self,
        module: &Module,
        spec: NodeId,
    ) -> Option<(String, Option<String>)> {
        let arena = module.arena();
        let parent = arena.parent(spec)?;
        let string_value = |node: NodeId| match arena.kind(node) {
            AstKind::StringLiteral { value } => Some(value.clone()),
            _ => None,
        };
        match arena.kind(spec) {
            AstKind::ExportSpecifier { local, .. } => {
                // A re-export with a source behaves like an import of the
                // specifier's local name.
                let AstKind::ExportNamedDeclaration {
                    source: Some(source),
                    ..
                } = arena.kind(parent)
                else {
                    return None;
                };
                Some((
                    string_value(*source)?,
                    arena.identifier_name(*local).map(str::to_string),
                ))
            }
            AstKind::ImportSpecifier { imported, .. } => {
                let AstKind::ImportDeclaration { source, .. } = arena.kind(parent) else {
                    return None;
                };
                Some((
                    string_value(*source)?,
                    arena.identifier_name(*imported).map(str::to_string),
                ))
            }
            AstKind::ImportDefaultSpecifier { .. } => {
                let AstKind::ImportDeclaration { source, .. } = arena.kind(parent) else {
                    return None;
                };
                Some((string_value(*source)?, None))
            }
            other => {
                reporting::trace(
                    Some(&module.location_of(spec)),
                    &format!("Unexpected import specifier kind {}", other.name()),
                );
                None
            }
        }
    }

    fn resolve_imported_declaration_uncached<'a>(
        &'a self,
        module: &'a Module,
        spec: NodeId,
    ) -> Option<(&'a Module, NodeId)> {
        let (source, import_name) = self.import_source_and_name(module, spec)?;
        if is_native_module(&source) {
            return None;
        }
        let resolved = resolve_path::resolve(module.path(), &source)
            .and_then(|p| std::fs::canonicalize(p).ok())?;
        let Some(imported_mod) = self.modules.get(&resolved) else {
            reporting::trace(
                Some(&module.location_of(spec)),
                &format!("Imported module {source} is not loaded"),
            );
            return None;
        };

        let arena = imported_mod.arena();
        let mut exported: Option<NodeId> = None;

        if matches!(
            module.arena().kind(spec),
            AstKind::ImportDefaultSpecifier { .. }
        ) {
            walk_decide(
                arena,
                imported_mod.root(),
                &mut |node| match arena.kind(node) {
                    AstKind::ExportDefaultDeclaration { declaration } => {
                        exported = Some(*declaration);
                    }
                    AstKind::ExportSpecifier {
                        local,
                        exported: exported_name,
                    } => {
                        if arena.identifier_name(*exported_name) == Some("default") {
                            exported = Some(*local);
                        }
                    }
                    _ => {}
                },
                &mut |node| match arena.kind(node) {
                    AstKind::ExportDefaultDeclaration { .. } | AstKind::ExportSpecifier { .. } => {
                        WalkDecision::VisitOver
                    }
                    AstKind::ExportNamedDeclaration { .. } => WalkDecision::SkipInto,
                    _ => WalkDecision::SkipOver,
                },
            );
        } else {
            let name = import_name?;
            let named = |id: NodeId| arena.identifier_name(id) == Some(name.as_str());
            walk_decide(
                arena,
                imported_mod.root(),
                &mut |node| match arena.kind(node) {
                    AstKind::ExportAllDeclaration { .. } => exported = Some(node),
                    AstKind::ExportSpecifier {
                        local,
                        exported: exported_name,
                    } => {
                        if named(*exported_name) {
                            exported = Some(*local);
                        }
                    }
                    AstKind::TypeAlias { id, .. } | AstKind::InterfaceDeclaration { id, .. } => {
                        if named(*id) {
                            exported = Some(node);
                        }
                    }
                    AstKind::FunctionDeclaration(f) => {
                        if f.id.is_some_and(named) {
                            exported = Some(node);
                        }
                    }
                    AstKind::ClassDeclaration(c) => {
                        if c.id.is_some_and(named) {
                            exported = Some(node);
                        }
                    }
                    AstKind::VariableDeclarator { id, .. } => {
                        if named(*id) {
                            exported = Some(node);
                        }
                    }
                    _ => {}
                },
                &mut |node| match arena.kind(node) {
                    AstKind::ExportAllDeclaration { .. }
                    | AstKind::ExportSpecifier { .. }
                    | AstKind::TypeAlias { .. }
                    | AstKind::InterfaceDeclaration { .. }
                    | AstKind::FunctionDeclaration(_)
                    | AstKind::ClassDeclaration(_)
                    | AstKind::VariableDeclarator { .. } => WalkDecision::VisitOver,
                    AstKind::ExportNamedDeclaration { .. }
                    | AstKind::VariableDeclaration { .. } => WalkDecision::SkipInto,
                    _ => WalkDecision::SkipOver,
                },
            );
        }

        let mut exported = exported?;
        // An ExportSpecifier hands back its local identifier; chase it to
        // the declaration recorded by local resolution.
        if arena.identifier_name(exported).is_some() {
            if let Some(&resolved_local) = imported_mod.resolved_locals().get(&exported) {
                exported = resolved_local;
            }
        }
        Some((imported_mod, exported))
    }

    /// Resolve an identifier use to its declaring node, following import
    /// and re-export chains across modules. Cycles terminate because each
    /// hop only follows declarations already present in the target
    /// module's local-resolution map.
    pub fn resolve_declaration<'a>(
        &'a self,
        module: &'a Module,
        identifier: NodeId,
    ) -> Option<(&'a Module, NodeId)> {
        let name = module.arena().identifier_name(identifier)?.to_string();
        let decl_ident = *module.resolved_locals().get(&identifier)?;
        let mut current = module;
        let mut decl = current.arena().parent(decl_ident)?;

        loop {
            let arena = current.arena();
            let is_import_spec = matches!(
                arena.kind(decl),
                AstKind::ImportDefaultSpecifier { .. } | AstKind::ImportSpecifier { .. }
            );
            let is_sourced_reexport = matches!(arena.kind(decl), AstKind::ExportSpecifier { .. })
                && arena.parent(decl).is_some_and(|p| {
                    matches!(
                        arena.kind(p),
                        AstKind::ExportNamedDeclaration {
                            source: Some(_),
                            ..
                        }
                    )
                });
            if !is_import_spec && !is_sourced_reexport {
                break;
            }

            let (next_module, next_decl) = self.resolve_imported_declaration(current, decl)?;
            current = next_module;
            decl = next_decl;
            // A lookup can hand back an identifier instead of its
            // declaration; normalize to the declaring node.
            if current.arena().identifier_name(decl).is_some() {
                decl = current.arena().parent(decl)?;
            }
        }

        // Parameters are their own declaration, not the function's, and
        // they may shadow the function name; match them by name.
        let arena = current.arena();
        if queries::is_function_node(arena, decl) {
            let data = arena.function_data(decl).expect("function node");
            for &param in &data.params {
                match arena.kind(param) {
                    AstKind::Identifier { name: param_name, .. } => {
                        if *param_name == name {
                            return Some((current, param));
                        }
                    }
                    AstKind::AssignmentPattern { left, .. } => {
                        match arena.identifier_name(*left) {
                            Some(left_name) if left_name == name => {
                                return Some((current, param));
                            }
                            Some(_) => {}
                            None => {
                                reporting::trace(
                                    None,
                                    "Cannot resolve through a destructured default parameter",
                                );
                                return None;
                            }
                        }
                    }
                    AstKind::RestElement { argument } => match arena.identifier_name(*argument) {
                        Some(rest_name) if rest_name == name => {
                            return Some((current, param));
                        }
                        Some(_) => {}
                        None => {
                            reporting::trace(
                                None,
                                "Cannot resolve through a destructured rest parameter",
                            );
                            return None;
                        }
                    },
                    _ => {
                        reporting::trace(None, "Cannot resolve through a destructured parameter");
                        return None;
                    }
                }
            }
        }
        Some((current, decl))
    }
}
