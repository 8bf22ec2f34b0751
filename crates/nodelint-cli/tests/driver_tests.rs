//! Driver dispatch over real fixture directories.

use nodelint_ast::testing as t;
use nodelint_cli::{CliArgs, run_with_parser};
use nodelint_module::StaticParser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn args(target: PathBuf) -> CliArgs {
    CliArgs {
        target,
        debug: false,
        suggest: false,
    }
}

fn fixture_parser(dir: &tempfile::TempDir, files: &[(&str, serde_json::Value)]) -> StaticParser {
    let parser = StaticParser::new();
    for (name, ast) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "// fixture").unwrap();
        parser.insert(fs::canonicalize(&path).unwrap(), ast.clone());
    }
    parser
}

#[test]
fn a_single_file_target_analyzes_that_module() {
    let dir = tempfile::tempdir().unwrap();
    let parser = fixture_parser(&dir, &[("a.js", t::program(vec![]))]);
    run_with_parser(&args(dir.path().join("a.js")), Arc::new(parser)).expect("runs");
}

#[test]
fn a_directory_target_analyzes_every_source_under_it() {
    let dir = tempfile::tempdir().unwrap();
    let parser = fixture_parser(
        &dir,
        &[
            ("a.js", t::program(vec![])),
            ("sub/b.js", t::program(vec![])),
        ],
    );
    run_with_parser(&args(dir.path().to_path_buf()), Arc::new(parser)).expect("runs");
}

#[test]
fn a_manifest_target_loads_the_project() {
    let dir = tempfile::tempdir().unwrap();
    let parser = fixture_parser(&dir, &[("index.js", t::program(vec![]))]);
    fs::write(dir.path().join("package.json"), r#"{"main": "index.js"}"#).unwrap();
    run_with_parser(&args(dir.path().join("package.json")), Arc::new(parser)).expect("runs");
}

#[test]
fn missing_targets_fail() {
    let parser = StaticParser::new();
    let result = run_with_parser(
        &args(PathBuf::from("/definitely/not/here.js")),
        Arc::new(parser),
    );
    assert!(result.is_err());
}
