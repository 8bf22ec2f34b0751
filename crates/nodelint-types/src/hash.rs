//! Seeded content hashing for type payloads.
//!
//! The seed is drawn once per process, so adversarial input cannot
//! precompute collisions that would let the equality fast path skip a real
//! structural mismatch.

use once_cell::sync::Lazy;
use rustc_hash::FxHasher;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

static HASH_SEED: Lazy<u64> = Lazy::new(|| RandomState::new().hash_one(0x6e6f_6465_6c69_6e74_u64));

/// A hasher pre-keyed with the process-wide random seed.
pub struct TypeHasher {
    inner: FxHasher,
}

impl TypeHasher {
    pub fn new() -> Self {
        let mut inner = FxHasher::default();
        inner.write_u64(*HASH_SEED);
        TypeHasher { inner }
    }

    pub fn write_u8(&mut self, v: u8) {
        self.inner.write_u8(v);
    }

    pub fn write_u64(&mut self, v: u64) {
        self.inner.write_u64(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.inner.write_u8(u8::from(v));
    }

    pub fn write_str(&mut self, v: &str) {
        self.inner.write(v.as_bytes());
        // Length-prefix free separator so "ab"+"c" != "a"+"bc".
        self.inner.write_u8(0xff);
    }

    pub fn finish(&self) -> u64 {
        self.inner.finish()
    }
}

impl Default for TypeHasher {
    fn default() -> Self {
        TypeHasher::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_hashes_the_same_within_a_process() {
        let mut a = TypeHasher::new();
        a.write_str("x");
        a.write_u8(3);
        let mut b = TypeHasher::new();
        b.write_str("x");
        b.write_u8(3);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn string_boundaries_are_not_ambiguous() {
        let mut a = TypeHasher::new();
        a.write_str("ab");
        a.write_str("c");
        let mut b = TypeHasher::new();
        b.write_str("a");
        b.write_str("bc");
        assert_ne!(a.finish(), b.finish());
    }
}
