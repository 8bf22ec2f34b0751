//! The nodelint command-line front-end.

pub mod args;
pub use args::CliArgs;

pub mod driver;
pub use driver::{run, run_with_parser};
