//! Package-level dependency graph construction for a Dingo workspace.
//!
//! This crate only builds and queries the graph; ordering packages for a
//! build and detecting cycles lives in `dingo-cycles`, which consumes
//! [`DependencyGraph`] directly.

mod dependency;
mod error;

pub use dependency::{DependencyGraph, NodeId, PackageNode, Symbol};
pub use error::GraphError;
