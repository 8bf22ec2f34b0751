//! The structural type lattice for nodelint.
//!
//! `TypeInfo` is a small value: a base tag plus an optional shared payload.
//! Payloads carry a precomputed content hash keyed by a per-run random
//! seed; equality fast-paths on the hash and falls back to structure, and
//! ordering (needed for sum canonicalization) uses `(base, hash)`.
//!
//! Function and class payloads may be built lazily from an AST definition
//! site; their shape is published once through a `OnceCell`, and their
//! identity hash derives from the definition site so it is stable before
//! and after forcing.

pub mod hash;
pub use hash::TypeHasher;

pub mod info;
pub use info::{
    BaseType, ClassShape, ClassTypeData, DefSite, ExtraTypeInfo, FunctionShape, FunctionTypeData,
    ObjectTypeData, PromiseTypeData, SumTypeData, TypeInfo,
};
