//! Diagnostic sink for everything the analyzer tells the user.
//!
//! Four user-facing levels plus a debug stream:
//! - `trace` - debug information, hidden unless `-d` was passed
//! - `suggest` - minor or speculative findings, hidden unless `-s` was passed
//! - `warn` - a likely problem in the analyzed code
//! - `error` - a certain bug or type violation in the analyzed code
//! - `fatal` - an unrecoverable analyzer failure; prints and exits
//!
//! Every message increments a process-wide atomic counter regardless of
//! whether it is printed, so the end-of-run summary counts suppressed
//! suggestions too (matching how suppressed suggestions are still tallied).

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static SUGGEST_ENABLED: AtomicBool = AtomicBool::new(false);

static TRACES: AtomicUsize = AtomicUsize::new(0);
static SUGGESTIONS: AtomicUsize = AtomicUsize::new(0);
static WARNINGS: AtomicUsize = AtomicUsize::new(0);
static ERRORS: AtomicUsize = AtomicUsize::new(0);

/// Snapshot of the diagnostic counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportingStats {
    pub traces: usize,
    pub suggestions: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// A printable source location: file path plus 1-based line and 0-based
/// column, as produced by the parser front-end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileLocation {
    pub path: String,
    pub line: u32,
    pub column: u32,
}

impl FileLocation {
    pub fn new(path: impl Into<String>, line: u32, column: u32) -> Self {
        FileLocation {
            path: path.into(),
            line,
            column,
        }
    }

    /// Build a location with the path shown relative to the current
    /// directory when possible, the way diagnostics name files.
    pub fn relative_to_cwd(path: &Path, line: u32, column: u32) -> Self {
        let shown = std::env::current_dir()
            .ok()
            .and_then(|cwd| path.strip_prefix(&cwd).ok().map(Path::to_path_buf))
            .unwrap_or_else(|| path.to_path_buf());
        FileLocation::new(shown.display().to_string(), line, column)
    }
}

/// Enable or disable the `debug:` stream (the CLI's `-d` flag).
pub fn set_debug(enable: bool) {
    DEBUG_ENABLED.store(enable, Ordering::Relaxed);
}

/// Enable or disable the `suggest:` stream (the CLI's `-s` flag).
pub fn set_suggest(enable: bool) {
    SUGGEST_ENABLED.store(enable, Ordering::Relaxed);
}

fn print_location(loc: Option<&FileLocation>) {
    if let Some(loc) = loc {
        print!("{}:{}:{}: ", loc.path, loc.line, loc.column);
    }
}

/// Debug information. Counted always, printed only when debug is enabled.
pub fn trace(loc: Option<&FileLocation>, msg: &str) {
    TRACES.fetch_add(1, Ordering::Relaxed);
    if !DEBUG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    print_location(loc);
    println!("debug: {msg}");
}

/// Minor or possible problems. Counted always, printed only when enabled.
pub fn suggest(loc: Option<&FileLocation>, msg: &str) {
    SUGGESTIONS.fetch_add(1, Ordering::Relaxed);
    if !SUGGEST_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    print_location(loc);
    println!("suggest: {msg}");
}

/// A real problem with the analyzed code.
pub fn warn(loc: Option<&FileLocation>, msg: &str) {
    WARNINGS.fetch_add(1, Ordering::Relaxed);
    print_location(loc);
    println!("warning: {msg}");
}

/// A certain bug in the analyzed code.
pub fn error(loc: Option<&FileLocation>, msg: &str) {
    ERRORS.fetch_add(1, Ordering::Relaxed);
    print_location(loc);
    println!("error: {msg}");
}

/// An unrecoverable analyzer failure. Prints and exits the process.
pub fn fatal(loc: Option<&FileLocation>, msg: &str) -> ! {
    print_location(loc);
    println!("Error: {msg}");
    std::process::exit(1);
}

/// Current counter values.
pub fn statistics() -> ReportingStats {
    ReportingStats {
        traces: TRACES.load(Ordering::Relaxed),
        suggestions: SUGGESTIONS.load(Ordering::Relaxed),
        warnings: WARNINGS.load(Ordering::Relaxed),
        errors: ERRORS.load(Ordering::Relaxed),
    }
}

/// Reset every counter to zero. Tests use this between scenarios.
pub fn reset_statistics() {
    TRACES.store(0, Ordering::Relaxed);
    SUGGESTIONS.store(0, Ordering::Relaxed);
    WARNINGS.store(0, Ordering::Relaxed);
    ERRORS.store(0, Ordering::Relaxed);
}
