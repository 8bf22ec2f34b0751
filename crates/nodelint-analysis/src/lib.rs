//! Analysis passes for nodelint.
//!
//! This crate holds everything that runs after a module is parsed,
//! resolved and lifted into graphs:
//! - `TypeResolver` - lazy, memoized type resolution over graph nodes,
//!   annotation resolution, and return-type synthesis
//! - `refinement` - truthiness narrowing at conditional branches
//! - `typecheck` - the graph walk emitting call and property diagnostics
//! - `missingawait` - promise misuse detection
//! - `conditionals` / `unused` - AST-level checks
//! - `analyze_module` - the per-module driver tying the passes together

pub mod typeresolution;
pub use typeresolution::TypeResolver;

pub mod refinement;
pub use refinement::{ScopedTypes, refine_types};

pub mod typecheck;
pub use typecheck::typecheck_graph;

pub mod missingawait;
pub use missingawait::missing_await_pass;

pub mod conditionals;
pub use conditionals::analyze_conditionals;

pub mod unused;
pub use unused::find_unused_local_declarations;

pub mod driver;
pub use driver::analyze_module;
