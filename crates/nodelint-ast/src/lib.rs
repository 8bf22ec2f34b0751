//! AST model for the nodelint analyzer.
//!
//! This crate provides:
//! - `AstArena` / `NodeId` - arena storage for a module's syntax tree
//! - `AstKind` - the closed family of tagged node kinds with payloads
//! - Source spans (character-counted positions from the parser front-end)
//! - Child iteration and tree walks (plain and decision-driven)
//! - The parent-chain query predicates used by every later pass
//! - The Babel-JSON importer that turns parser output into an arena

pub mod span;
pub use span::{SourcePosition, SourceSpan};

pub mod node;
pub use node::{
    AstArena, AstKind, AstNode, AssignmentOp, BinaryOp, ClassData, FunctionData, FunctionFlags,
    LogicalOp, MethodKind, NodeId, UnaryOp, UpdateOp, VariableKind,
};

pub mod walk;
pub use walk::{WalkDecision, walk, walk_decide};

pub mod queries;

pub mod import;
pub use import::{ImportError, import_babel_ast};

pub mod testing;
