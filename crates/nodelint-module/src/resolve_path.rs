//! Node-ecosystem module path resolution.
//!
//! Relative and absolute specifiers resolve against the importer's
//! directory; bare specifiers search `node_modules` walking upward. A
//! candidate resolves as a file (exact, then with a `.js` suffix), then as
//! a directory (`package.json` `main`, else `index.js`).

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Resolve `requested` as imported from `from` (a file or directory).
pub fn resolve(from: &Path, requested: &str) -> Option<PathBuf> {
    let mut base = from.to_path_buf();
    if base.is_file() {
        base.pop();
    }

    if requested.starts_with('/') {
        return resolve_as_file(Path::new(requested))
            .or_else(|| resolve_as_directory(Path::new(requested)));
    }
    if requested.starts_with("./") || requested.starts_with("../") {
        let candidate = base.join(requested);
        return resolve_as_file(&candidate).or_else(|| resolve_as_directory(&candidate));
    }

    resolve_node_module(&base, requested)
}

fn resolve_node_module(base: &Path, requested: &str) -> Option<PathBuf> {
    let modules_dir = base.join("node_modules");
    if modules_dir.is_dir() {
        let module_path = modules_dir.join(requested);
        if let Some(path) = resolve_as_file(&module_path) {
            return Some(path);
        }
        if let Some(path) = resolve_as_directory(&module_path) {
            return Some(path);
        }
    }

    let parent = base.parent()?;
    resolve_node_module(parent, requested)
}

fn resolve_as_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    let with_suffix = PathBuf::from(format!("{}.js", path.display()));
    with_suffix.is_file().then_some(with_suffix)
}

fn resolve_as_directory(path: &Path) -> Option<PathBuf> {
    let manifest = path.join("package.json");
    let base = if manifest.is_file() {
        match package_main_file(&manifest) {
            Some(main) => {
                let candidate = path.join(main);
                if let Some(resolved) = resolve_as_file(&candidate) {
                    return Some(resolved);
                }
                candidate
            }
            None => path.to_path_buf(),
        }
    } else {
        path.to_path_buf()
    };

    let index = base.join("index.js");
    index.is_file().then_some(index)
}

/// The `main` field of a package manifest, if present.
pub fn package_main_file(manifest: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(manifest).ok()?;
    let json: serde_json::Value = serde_json::from_str(&contents).ok()?;
    json.get("main")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

/// The entry module of a project directory, from its `package.json`.
pub fn project_main_file(project_dir: &Path) -> Result<PathBuf> {
    let manifest = project_dir.join("package.json");
    if !manifest.is_file() {
        anyhow::bail!("Could not find a package.json in {}", project_dir.display());
    }
    let main = package_main_file(&manifest).unwrap_or_default();
    let candidate = project_dir.join(&main);
    resolve_as_file(&candidate)
        .or_else(|| resolve_as_directory(&candidate))
        .with_context(|| format!("cannot resolve project main \"{main}\""))
}

/// True iff `file` belongs to the project rooted at `project_dir` and is
/// not a vendored dependency.
pub fn is_project_module(project_dir: &Path, file: &Path) -> bool {
    let Ok(relative) = file.strip_prefix(project_dir) else {
        return false;
    };
    !relative
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == "node_modules"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn relative_specifiers_try_exact_then_js_then_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.js"), "x").unwrap();
        fs::create_dir(root.join("lib")).unwrap();
        fs::write(root.join("lib/index.js"), "x").unwrap();
        let importer = root.join("main.js");
        fs::write(&importer, "x").unwrap();

        assert_eq!(resolve(&importer, "./a"), Some(root.join("a.js")));
        assert_eq!(resolve(&importer, "./a.js"), Some(root.join("a.js")));
        assert_eq!(resolve(&importer, "./lib"), Some(root.join("lib/index.js")));
        assert_eq!(resolve(&importer, "./missing"), None);
    }

    #[test]
    fn bare_specifiers_walk_node_modules_upward() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::write(root.join("node_modules/dep/package.json"), r#"{"main": "entry.js"}"#).unwrap();
        fs::write(root.join("node_modules/dep/entry.js"), "x").unwrap();
        fs::create_dir_all(root.join("src/deep")).unwrap();
        let importer = root.join("src/deep/mod.js");
        fs::write(&importer, "x").unwrap();

        assert_eq!(
            resolve(&importer, "dep"),
            Some(root.join("node_modules/dep/entry.js"))
        );
    }

    #[test]
    fn project_main_comes_from_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("package.json"), r#"{"main": "src/app.js"}"#).unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/app.js"), "x").unwrap();

        assert_eq!(project_main_file(root).unwrap(), root.join("src/app.js"));
        assert!(project_main_file(&root.join("src")).is_err());
    }

    #[test]
    fn vendored_files_are_not_project_modules() {
        let project = Path::new("/proj");
        assert!(is_project_module(project, Path::new("/proj/src/a.js")));
        assert!(!is_project_module(
            project,
            Path::new("/proj/node_modules/d/i.js")
        ));
        assert!(!is_project_module(project, Path::new("/other/a.js")));
    }
}
