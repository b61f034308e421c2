//! Graph module for dependency relationship modeling.
//!
//! This module provides the [`DependencyGraph`] struct for building and
//! querying dependency relationships between named code units.
//!
//! # Example
//!
//! ```rust
//! use metagraph::graph::{DependencyGraph, MetadataRecord};
//!
//! let graph = DependencyGraph::from_records(vec![
//!     MetadataRecord::new("fibonacci", ["fibonacci"]),
//!     MetadataRecord::new("validate_data", ["log_error"]),
//!     MetadataRecord::leaf("log_error"),
//! ])
//! .unwrap();
//!
//! assert!(graph.unresolved_dependencies().is_empty());
//! assert_eq!(graph.detect_cycles(), vec![vec!["fibonacci"]]);
//! assert!(graph.topological_order().is_err());
//! ```

mod dependency_graph;
mod record;

pub use dependency_graph::{
    CycleInfo, DependencyGraph, DependencyNode, GraphError, GraphResult, NodeKind, NodeMetrics,
};
pub use record::MetadataRecord;
