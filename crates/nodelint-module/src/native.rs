//! Native modules the host environment provides.
//!
//! Imports of these short-circuit to stubs: their code is never parsed or
//! analyzed, and declarations imported from them resolve to nothing.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

static NATIVE_MODULES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    FxHashSet::from_iter([
        "buffer",
        "child_process",
        "console",
        "constants",
        "crypto",
        "fs",
        "http",
        "https",
        "net",
        "os",
        "path",
        "process",
        "stream",
        "tls",
        "tty",
        "util",
        "vm",
        "zlib",
    ])
});

/// True iff `name` names a built-in module stubbed by the analyzer.
pub fn is_native_module(name: &str) -> bool {
    NATIVE_MODULES.contains(name)
}

/// Every stubbed module name, for help output and tests.
pub fn native_module_names() -> Vec<&'static str> {
    let mut names: Vec<_> = NATIVE_MODULES.iter().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_modules_are_stubbed_and_others_are_not() {
        assert!(is_native_module("fs"));
        assert!(is_native_module("child_process"));
        assert!(!is_native_module("lodash"));
        assert!(!is_native_module("./fs"));
        assert_eq!(native_module_names().len(), 18);
    }
}
