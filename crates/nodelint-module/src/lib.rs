//! Module model and host for the nodelint analyzer.
//!
//! This crate provides:
//! - `Module` - one parsed source file with its memoized resolutions and
//!   per-function graph/type caches
//! - `ModuleHost` - the path → module map, transitive project loading, and
//!   cross-module declaration resolution
//! - Node-ecosystem path resolution and the native-module stub table
//! - The external `ParserBackend` boundary, a version-tagged parse cache,
//!   and the fixed-size parse worker pool

pub mod native;
pub use native::is_native_module;

pub mod resolve_path;

pub mod parser;
pub use parser::{BabelCommandParser, ParseError, ParserBackend, StaticParser};

pub mod cache;
pub use cache::{CachingParser, ParseCache};

pub mod pool;
pub use pool::{ParseFuture, ParsePool, ParsedAst};

pub mod module;
pub use module::Module;

pub mod host;
pub use host::ModuleHost;
