//! Lexical identifier resolution for the nodelint analyzer.
//!
//! One depth-first walk per module binds every identifier use to its
//! declaring identifier, handling the three declaration kinds (`var`
//! hoisted function-scoped, `let`/`const` block-scoped, and class/function
//! declarations), destructuring patterns, catch/loop bindings, and the
//! Flow type declarations that introduce names.
//!
//! Outputs per module:
//! - `targets`: identifier use → declaring identifier (declarations map to
//!   themselves)
//! - `free_top_level`: top-level names that resolved to nothing - possible
//!   host globals, reported as data, never as errors
//! - `xrefs`: declaration → `[declaration, uses...]`

pub mod scopes;
pub use scopes::{ResolvedNames, resolve_module_names};

pub mod this_binding;
pub use this_binding::{resolve_this_expression, resolve_this_value};
