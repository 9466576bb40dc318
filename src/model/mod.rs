//! Scope graph model
//!
//! The lexical scope tree: arena-backed scope nodes, declared variables,
//! method-call sites, aliases, and unresolved uses.

pub mod alias;
pub mod declaration;
pub mod scope;
pub mod tree;
pub mod uses;

pub use alias::Alias;
pub use declaration::VariableDeclaration;
pub use scope::{Accessibility, MethodData, NamespaceData, Parameter, PropertyData, ScopeKind, TypeData, TypeKind};
pub use tree::{ScopeId, ScopeNode, ScopeTree, TreeStats};
pub use uses::{CallData, Caller, NamePrefix, Use, UseKind};
