//! # Scopedb - Cross-file program scope database
//!
//! A mergeable, cross-file database of lexical scopes (namespaces, types,
//! methods, blocks) built from per-file scope fragments.
//!
//! Scopedb provides:
//! - A scope tree model whose nodes merge when the same logical entity
//!   (a namespace, a partial type) is discovered in more than one file
//! - Alias-aware name/type/call resolution over ancestor scopes and
//!   inherited-type chains
//! - A concurrent working set that keeps one globally-merged scope tree
//!   consistent while files are added, updated, or removed
//! - A query runtime that executes read-only queries against a stable
//!   snapshot with lock timeouts and cancellation

pub mod builtins;
pub mod config;
pub mod frontend;
pub mod language;
pub mod location;
pub mod model;
pub mod query;
pub mod resolve;
pub mod workingset;

// Re-exports for convenient access
pub use builtins::BuiltInType;
pub use language::Language;
pub use location::{SourceLocation, StructuralPath};
pub use model::alias::Alias;
pub use model::scope::ScopeKind;
pub use model::tree::{ScopeId, ScopeTree};
pub use model::uses::{Use, UseKind};
pub use query::Query;
pub use workingset::WorkingSet;

/// Result type alias for Scopedb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Scopedb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Lock not acquired within {waited_ms}ms")]
    LockTimeout { waited_ms: u64 },

    #[error("Query cancelled")]
    Cancelled,

    #[error("Working set is disposed")]
    Disposed,

    #[error("Use is not attached to a scope tree: {0}")]
    DetachedUse(String),

    #[error("Invalid structural input: {0}")]
    InvalidStructure(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fragment error: {0}")]
    Json(#[from] serde_json::Error),
}
