//! Target dispatch and the analysis run.

use crate::args::CliArgs;
use anyhow::Result;
use nodelint_analysis::analyze_module;
use nodelint_common::reporting;
use nodelint_module::{
    BabelCommandParser, CachingParser, ModuleHost, ParseCache, ParserBackend,
};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;

/// Run one analysis with the production parser (external `node` +
/// `@babel/parser`, fronted by the on-disk parse cache).
pub fn run(args: &CliArgs) -> Result<()> {
    let parser: Arc<dyn ParserBackend> = Arc::new(CachingParser::new(
        BabelCommandParser::new(),
        ParseCache::beside_binary(),
    ));
    run_with_parser(args, parser)
}

/// Run one analysis with a caller-provided parser backend.
pub fn run_with_parser(args: &CliArgs, parser: Arc<dyn ParserBackend>) -> Result<()> {
    reporting::set_debug(args.debug);
    reporting::set_suggest(args.suggest);

    let mut host = ModuleHost::new(parser);
    let target = &args.target;
    let roots: Vec<PathBuf> = if target.is_dir() {
        host.load_directory(target)?
    } else if target.file_name() == Some(OsStr::new("package.json")) {
        println!("Resolving project imports...");
        host.load_project(target)?
    } else {
        vec![host.load_file(target)?]
    };

    println!("Starting analysis...");
    for root in &roots {
        if let Some(module) = host.module(root) {
            analyze_module(&host, module);
        }
    }

    let stats = reporting::statistics();
    println!(
        "Found {} error(s), {} warning(s) and {} suggestion(s).",
        stats.errors, stats.warnings, stats.suggestions
    );
    Ok(())
}
