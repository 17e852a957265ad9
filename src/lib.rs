//! # cindex
//!
//! An offline codebase indexer that builds a persistent dependency-and-
//! symbol graph of a multi-language repository and serves ranked,
//! budget-constrained context bundles for natural-language tasks.
//!
//! ## Architecture
//!
//! - `domain`: models, the error type, and pure services
//! - `application`: port traits and use cases
//! - `connector`: SQLite storage, tree-sitter parsers, walker, MCP server

pub mod application;
pub mod connector;
pub mod container;
pub mod domain;

// Re-export commonly used types
pub use application::*;
pub use connector::*;
pub use container::{default_db_path, Container};
pub use domain::*;
