//! Parser module for metagraph.
//!
//! This module extracts [`MetadataRecord`](crate::graph::MetadataRecord)s
//! from `Metadata:` comment blocks in source files.
//!
//! # Supported Languages
//!
//! - **Python** - docstrings and `#` comments
//! - **Java** - `/** ... */` doc comments
//! - **C / C++** - `/* ... */` blocks and `//` comments
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use metagraph::config::ScanConfig;
//! use metagraph::graph::DependencyGraph;
//! use metagraph::parser;
//!
//! let sources = parser::scan_directory(Path::new("src"), &ScanConfig::default()).unwrap();
//! let graph = DependencyGraph::from_records(parser::collect_records(sources)).unwrap();
//!
//! println!("Found {} functions", graph.node_count());
//! ```

pub mod metadata;
pub mod types;

// Re-export commonly used types for convenience
pub use metadata::{
    collect_records, extract_records, extract_records_strict, parse_file, parse_file_with_config,
    parse_file_with_limit, scan_directory, scan_directory_with_cache, source_paths, ParseError,
    ParseResult,
};

pub use types::{SourceLanguage, SourceRecords};
