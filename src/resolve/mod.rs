//! Resolution engine
//!
//! Turns unresolved uses into candidate definitions by walking ancestor
//! scopes, inherited-type chains, and aliases.

pub mod resolver;

pub use resolver::{Candidate, Resolver};
