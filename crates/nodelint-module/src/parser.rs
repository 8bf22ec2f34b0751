//! The external parser boundary.
//!
//! Parsing is not part of the analyzer: a `ParserBackend` turns source text
//! into Babel AST JSON, and the AST importer does the rest. The production
//! backend shells out to `node` with `@babel/parser`; tests and tooling use
//! `StaticParser` with pre-parsed fixtures.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Failure to obtain an AST for a module.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub path: PathBuf,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to parse {}: {}", self.path.display(), self.message)
    }
}

impl std::error::Error for ParseError {}

/// Produces Babel AST JSON from source text. Implementations must be
/// callable from the parse pool's worker threads.
pub trait ParserBackend: Send + Sync {
    fn parse(&self, path: &Path, source: &str) -> Result<serde_json::Value, ParseError>;
}

/// The in-process script handed to `node`: read the module source on
/// stdin, print its Babel AST as JSON on stdout.
const BABEL_DRIVER: &str = r#"
const parser = require('@babel/parser');
let src = '';
process.stdin.on('data', (d) => { src += d; });
process.stdin.on('end', () => {
  try {
    const ast = parser.parse(src, {
      sourceType: 'module',
      plugins: ['objectRestSpread', 'classProperties', 'exportExtensions', 'asyncGenerators', 'flow'],
    });
    process.stdout.write(JSON.stringify(ast));
  } catch (e) {
    process.stderr.write(String(e && e.message ? e.message : e));
    process.exit(1);
  }
});
"#;

/// Production backend: one `node` process per parse, running
/// `@babel/parser` with the plugin set the analyzed dialect needs.
pub struct BabelCommandParser {
    node_binary: PathBuf,
}

impl BabelCommandParser {
    pub fn new() -> Self {
        BabelCommandParser {
            node_binary: PathBuf::from("node"),
        }
    }

    pub fn with_node_binary(node_binary: impl Into<PathBuf>) -> Self {
        BabelCommandParser {
            node_binary: node_binary.into(),
        }
    }
}

impl Default for BabelCommandParser {
    fn default() -> Self {
        BabelCommandParser::new()
    }
}

impl ParserBackend for BabelCommandParser {
    fn parse(&self, path: &Path, source: &str) -> Result<serde_json::Value, ParseError> {
        let mut child = Command::new(&self.node_binary)
            .arg("-e")
            .arg(BABEL_DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ParseError::new(path, format!("cannot run node: {e}")))?;

        child
            .stdin
            .take()
            .expect("stdin was piped")
            .write_all(source.as_bytes())
            .map_err(|e| ParseError::new(path, format!("cannot feed parser: {e}")))?;

        let output = child
            .wait_with_output()
            .map_err(|e| ParseError::new(path, format!("parser did not finish: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParseError::new(path, stderr.trim().to_string()));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ParseError::new(path, format!("parser produced invalid JSON: {e}")))
    }
}

/// Serves pre-parsed ASTs from an in-memory table, keyed by path. Tests
/// use it as the whole front-end; tooling can use it to replay dumps.
pub struct StaticParser {
    asts: Mutex<rustc_hash::FxHashMap<PathBuf, serde_json::Value>>,
}

impl StaticParser {
    pub fn new() -> Self {
        StaticParser {
            asts: Mutex::new(rustc_hash::FxHashMap::default()),
        }
    }

    pub fn insert(&self, path: impl Into<PathBuf>, ast: serde_json::Value) {
        self.asts
            .lock()
            .expect("static parser table")
            .insert(path.into(), ast);
    }
}

impl Default for StaticParser {
    fn default() -> Self {
        StaticParser::new()
    }
}

impl ParserBackend for StaticParser {
    fn parse(&self, path: &Path, _source: &str) -> Result<serde_json::Value, ParseError> {
        self.asts
            .lock()
            .expect("static parser table")
            .get(path)
            .cloned()
            .ok_or_else(|| ParseError::new(path, "no fixture AST registered"))
    }
}
