//! Shared fixture plumbing: write real files (path resolution and source
//! excerpts need them), serve their ASTs through the static parser, and
//! load them into a host.

use nodelint_module::{ModuleHost, StaticParser};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Fixture {
    _dir: tempfile::TempDir,
    pub host: ModuleHost,
    pub entry: PathBuf,
}

/// Build a host from `(name, source, ast)` triples and load the first file
/// as the entry module.
pub fn fixture(files: &[(&str, &str, serde_json::Value)]) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let parser = StaticParser::new();
    for (name, source, ast) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("fixture dirs");
        }
        fs::write(&path, source).expect("fixture file");
        parser.insert(fs::canonicalize(&path).expect("canonical"), ast.clone());
    }

    let mut host = ModuleHost::new(Arc::new(parser));
    let entry = host
        .load_file(&dir.path().join(files[0].0))
        .expect("entry loads");
    Fixture {
        _dir: dir,
        host,
        entry,
    }
}
