//! Version-tagged parse result cache.
//!
//! Parser output is cached as JSON blobs alongside the binary, keyed by a
//! hash of the source text. Each blob starts with a host version tag; a
//! mismatching tag invalidates the entry, so upgrading the analyzer never
//! replays stale ASTs.

use crate::parser::{ParseError, ParserBackend};
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use tracing::debug;

const VERSION_TAG: &str = env!("CARGO_PKG_VERSION");

/// On-disk cache of parse results.
pub struct ParseCache {
    dir: PathBuf,
}

impl ParseCache {
    /// Cache directory next to the analyzer binary; falls back to the
    /// system temp directory when the binary's location is unknown.
    pub fn beside_binary() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(std::env::temp_dir)
            .join("nodelint_parse_cache");
        ParseCache { dir }
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        ParseCache { dir: dir.into() }
    }

    fn blob_path(&self, source: &str) -> PathBuf {
        // Unseeded hash: entries must be addressable across runs.
        let mut hasher = rustc_hash::FxHasher::default();
        hasher.write(source.as_bytes());
        self.dir.join(format!("{:016x}.json", hasher.finish()))
    }

    /// Look up a cached AST for `source`; removes entries with a stale
    /// version tag.
    pub fn lookup(&self, source: &str) -> Option<serde_json::Value> {
        let path = self.blob_path(source);
        let contents = std::fs::read_to_string(&path).ok()?;
        let (tag, body) = contents.split_once('\n')?;
        if tag != VERSION_TAG {
            debug!(path = %path.display(), "invalidating parse cache entry (version mismatch)");
            let _ = std::fs::remove_file(&path);
            return None;
        }
        serde_json::from_str(body).ok()
    }

    /// Store the AST for `source`. Best effort: cache write failures are
    /// invisible beyond a debug note.
    pub fn store(&self, source: &str, ast: &serde_json::Value) {
        if std::fs::create_dir_all(&self.dir).is_err() {
            return;
        }
        let path = self.blob_path(source);
        let body = format!("{VERSION_TAG}\n{ast}");
        if let Err(e) = std::fs::write(&path, body) {
            debug!(path = %path.display(), "failed to write parse cache entry: {e}");
        }
    }
}

/// A backend wrapper that consults the cache before parsing.
pub struct CachingParser<P> {
    inner: P,
    cache: ParseCache,
}

impl<P: ParserBackend> CachingParser<P> {
    pub fn new(inner: P, cache: ParseCache) -> Self {
        CachingParser { inner, cache }
    }
}

impl<P: ParserBackend> ParserBackend for CachingParser<P> {
    fn parse(&self, path: &Path, source: &str) -> Result<serde_json::Value, ParseError> {
        if let Some(cached) = self.cache.lookup(source) {
            return Ok(cached);
        }
        let ast = self.inner.parse(path, source)?;
        self.cache.store(source, &ast);
        Ok(ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::StaticParser;
    use serde_json::json;

    #[test]
    fn caches_hits_and_invalidates_foreign_versions() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParseCache::at(dir.path());
        let ast = json!({"type": "Program", "body": []});

        assert!(cache.lookup("src").is_none());
        cache.store("src", &ast);
        assert_eq!(cache.lookup("src"), Some(ast.clone()));

        // Rewrite the blob with a different version tag.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        let blob = entries[0].as_ref().unwrap().path();
        std::fs::write(&blob, format!("0.0.0-other\n{ast}")).unwrap();
        assert!(cache.lookup("src").is_none());
        assert!(!blob.exists(), "stale entry is removed");
    }

    #[test]
    fn caching_parser_serves_repeat_parses_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let inner = StaticParser::new();
        inner.insert("/m.js", json!({"type": "Program", "body": []}));
        let parser = CachingParser::new(inner, ParseCache::at(dir.path()));

        let first = parser.parse(Path::new("/m.js"), "let a = 1;").unwrap();
        // Second parse comes from the cache even if the backend forgets.
        let parser = CachingParser::new(StaticParser::new(), ParseCache::at(dir.path()));
        let second = parser.parse(Path::new("/m.js"), "let a = 1;").unwrap();
        assert_eq!(first, second);
    }
}
